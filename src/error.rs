//! Typed diagnostics for the fusion engine.
//!
//! Transient contention (a failed try-lock or CAS) is never surfaced here —
//! it is handled silently inside `table::operations` and the caller's next
//! pass retries. Only structural failures reach [`EngineError`].

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid hash params: {field} ({reason})")]
    InvalidConfig { field: &'static str, reason: &'static str },

    #[error("arena exhausted: requested {requested_blocks} block(s), {available} available")]
    ArenaExhausted { requested_blocks: u32, available: u32 },

    #[error("collision chain bound exceeded in bucket {bucket} (max_chain={max_chain})")]
    ChainBoundExceeded { bucket: u32, max_chain: u32 },

    #[error("illegal block index {block_idx} (num_blocks={num_blocks})")]
    IllegalBlockIndex { block_idx: u32, num_blocks: u32 },

    #[error("lock poisoned: {resource}")]
    LockPoisoned { resource: &'static str },
}

impl<T> From<std::sync::PoisonError<T>> for EngineError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        EngineError::LockPoisoned { resource: "voxel readback buffer" }
    }
}
