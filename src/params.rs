//! Immutable engine configuration.
//!
//! A [`HashParams`] is validated once at [`crate::engine::HashEngine::new`]
//! and then passed by shared reference into every hot-path operation —
//! there is no process-wide global, per the design notes.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Every bucket's slot count. The last slot of each bucket is reserved as
/// the head of that bucket's overflow chain.
pub const BUCKET_SIZE: u32 = 20;

/// Voxels per block edge.
pub const SDF_BLOCK_SIZE: u32 = 8;

/// `SDF_BLOCK_SIZE^3`.
pub const VOXELS_PER_BLOCK: u32 = SDF_BLOCK_SIZE * SDF_BLOCK_SIZE * SDF_BLOCK_SIZE;

pub const FREE_ENTRY: i32 = -2;
pub const LOCK_ENTRY: i32 = -1;
pub const NO_OFFSET: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HashParams {
    pub num_buckets: u32,
    pub bucket_size: u32,
    pub num_blocks: u32,
    pub sdf_block_size: u32,

    pub virtual_voxel_size: f32,
    pub truncation: f32,
    pub trunc_scale: f32,
    pub integration_weight_max: u32,

    pub hash_max_collision_linked_list_size: u32,

    /// Bound on the number of internal retry rounds `allocate_from_depth`
    /// will iterate to absorb lock failures before giving up for the frame.
    pub alloc_retry_rounds: u32,

    /// When `false` (the default), bucket mutexes are only cleared by an
    /// explicit pass-wide reset, matching the original at-most-one-writer-
    /// per-bucket-per-pass discipline. When `true`, `unlock` is called
    /// immediately after each critical section instead.
    pub release_locks_immediately: bool,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            num_buckets: 100_000,
            bucket_size: BUCKET_SIZE,
            num_blocks: 262_144,
            sdf_block_size: SDF_BLOCK_SIZE,
            virtual_voxel_size: 0.005,
            truncation: 0.02,
            trunc_scale: 0.01,
            integration_weight_max: 255,
            hash_max_collision_linked_list_size: 7,
            alloc_retry_rounds: 4,
            release_locks_immediately: false,
        }
    }
}

impl HashParams {
    pub fn total_slots(&self) -> u32 {
        self.num_buckets * self.bucket_size
    }

    pub fn voxels_per_block(&self) -> u32 {
        self.sdf_block_size * self.sdf_block_size * self.sdf_block_size
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.num_buckets == 0 {
            return Err(EngineError::InvalidConfig {
                field: "num_buckets",
                reason: "must be nonzero",
            });
        }
        if self.bucket_size == 0 {
            return Err(EngineError::InvalidConfig {
                field: "bucket_size",
                reason: "must be nonzero (the last slot is reserved as the chain head)",
            });
        }
        if self.num_blocks == 0 {
            return Err(EngineError::InvalidConfig {
                field: "num_blocks",
                reason: "must be nonzero",
            });
        }
        if self.sdf_block_size == 0 {
            return Err(EngineError::InvalidConfig {
                field: "sdf_block_size",
                reason: "must be nonzero",
            });
        }
        if self.virtual_voxel_size <= 0.0 {
            return Err(EngineError::InvalidConfig {
                field: "virtual_voxel_size",
                reason: "must be positive",
            });
        }
        if self.truncation <= 0.0 {
            return Err(EngineError::InvalidConfig {
                field: "truncation",
                reason: "must be positive",
            });
        }
        if self.integration_weight_max == 0 {
            return Err(EngineError::InvalidConfig {
                field: "integration_weight_max",
                reason: "must be nonzero",
            });
        }
        if self.hash_max_collision_linked_list_size == 0 {
            return Err(EngineError::InvalidConfig {
                field: "hash_max_collision_linked_list_size",
                reason: "must be nonzero or no overflow chain could ever be walked",
            });
        }
        if (self.total_slots() as u64) > (u32::MAX as u64) {
            return Err(EngineError::InvalidConfig {
                field: "num_buckets",
                reason: "num_buckets * bucket_size overflows u32",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(HashParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_buckets() {
        let mut p = HashParams::default();
        p.num_buckets = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_nonpositive_truncation() {
        let mut p = HashParams::default();
        p.truncation = 0.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let p = HashParams::default();
        let s = toml::to_string(&p).expect("serialize");
        let back: HashParams = toml::from_str(&s).expect("deserialize");
        assert_eq!(p, back);
    }

    #[test]
    fn round_trips_through_json() {
        // JSON is used by diagnostics/tooling that prefer a structured
        // interchange format over TOML (e.g. forwarding `HashParams` in a
        // diagnostic event payload); TOML remains the on-disk config format.
        let p = HashParams::default();
        let s = serde_json::to_string(&p).expect("serialize");
        let back: HashParams = serde_json::from_str(&s).expect("deserialize");
        assert_eq!(p, back);
    }
}
