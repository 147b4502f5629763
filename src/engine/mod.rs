//! Public facade over the DOP engine internals: allocate, integrate,
//! compactify, garbage-collect, reset, stats.

mod engine_data;
mod engine_operations;

pub use engine_data::{AllocationStats, EngineStats, GcStats, HashEngineData, IntegrationStats};

use crate::entry::HashEntry;
use crate::error::EngineResult;
use crate::params::HashParams;
use crate::sensor::{CameraModel, ColorMap, DepthMap};

/// The fusion engine's core: a voxel-block hash table plus its backing
/// arena, driven from a massively parallel worker fabric one pass at a
/// time (modeled here with `rayon`).
pub struct HashEngine {
    data: HashEngineData,
}

impl HashEngine {
    pub fn new(params: HashParams) -> EngineResult<Self> {
        Ok(Self { data: engine_operations::create_hash_engine(params)? })
    }

    pub fn params(&self) -> &HashParams {
        &self.data.params
    }

    /// Projects depth pixels into voxel-block candidates and allocates the
    /// ones not already present. Internally iterates up to
    /// `params.alloc_retry_rounds` passes to absorb lock contention.
    pub fn allocate_from_depth(&self, depth: &dyn DepthMap, cam: &dyn CameraModel) -> EngineResult<AllocationStats> {
        engine_operations::allocate_from_depth(&self.data, depth, cam)
    }

    /// Recomputes the compactified visible-block list for `cam` and
    /// integrates this frame's depth/color observation into each block's
    /// voxels.
    pub fn integrate_from_depth(
        &self,
        depth: &dyn DepthMap,
        color: &dyn ColorMap,
        cam: &dyn CameraModel,
    ) -> EngineResult<IntegrationStats> {
        engine_operations::integrate_from_depth(&self.data, depth, color, cam)
    }

    /// Decide + scan + gather: returns the count of live, visible blocks
    /// and makes them available via [`HashEngine::compactified_entries`].
    pub fn compactify(&self, cam: &dyn CameraModel) -> EngineResult<u32> {
        engine_operations::compactify(&self.data, cam)
    }

    /// The result of the most recent [`HashEngine::compactify`] call.
    /// Invalidated by any subsequent allocation or deletion.
    pub fn compactified_entries(&self) -> Vec<HashEntry> {
        engine_operations::compactified_entries(&self.data)
    }

    /// Deletes blocks in the last compactified list whose aggregate weight
    /// has collapsed to zero, returning their voxels' blocks to the arena.
    pub fn garbage_collect(&self) -> EngineResult<GcStats> {
        engine_operations::garbage_collect(&self.data)
    }

    /// Reinitializes the arena free stack and clears the table.
    pub fn reset(&self) -> EngineResult<()> {
        engine_operations::reset(&self.data);
        Ok(())
    }

    pub fn stats(&self) -> EngineStats {
        engine_operations::stats(&self.data)
    }
}
