//! Hash engine data — pure data.
//!
//! All transformations happen in `engine_operations.rs`.

use parking_lot::{Mutex, RwLock};

use crate::arena::BlockArena;
use crate::diagnostics::Diagnostics;
use crate::entry::{HashEntry, Voxel};
use crate::locks::BucketLocks;
use crate::params::HashParams;
use crate::table::HashTableData;

/// Per-block voxel payload storage. Indexed by `block_idx` (`ptr / voxels_per_block`).
/// Integration holds the write lock only for the one block a compactified
/// entry belongs to; distinct blocks never contend.
pub struct VoxelBlocks {
    pub blocks: Vec<RwLock<Box<[Voxel]>>>,
    pub voxels_per_block: usize,
}

pub struct HashEngineData {
    pub params: HashParams,
    pub table: HashTableData,
    pub locks: BucketLocks,
    pub arena: BlockArena,
    pub voxels: VoxelBlocks,
    pub compactified: Mutex<Vec<HashEntry>>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationStats {
    pub attempted: u32,
    pub allocated: u32,
    pub already_present: u32,
    pub rounds_used: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrationStats {
    pub blocks_visited: u32,
    pub voxels_integrated: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GcStats {
    pub blocks_freed: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    pub live_entries: u32,
    pub free_blocks: u32,
    pub num_blocks: u32,
}
