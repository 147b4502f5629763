//! Hash table operations — pure functions over [`HashTableData`].
//!
//! All functions take data, return results, and have no side effects beyond
//! the table/arena/locks passed in. A worker that loses a `try_lock` or
//! exhausts `max_chain` returns the appropriate outcome and performs no
//! partial writes; the caller's driver retries on the next pass.

use glam::IVec3;

use crate::arena::BlockArena;
use crate::coord::compute_hash;
use crate::entry::HashEntry;
use crate::error::{EngineError, EngineResult};
use crate::locks::BucketLocks;

use super::table_data::HashTableData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocOutcome {
    /// An entry for this position already existed.
    AlreadyAllocated,
    /// A new block was allocated and inserted.
    Allocated,
    /// A `try_lock` was lost; the caller should retry next pass.
    LockContention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    NotFound,
    Deleted,
    LockContention,
}

fn pos_matches(entry: &HashEntry, pos: IVec3) -> bool {
    entry.pos == [pos.x, pos.y, pos.z] && !entry.is_free()
}

/// Scans the primary bucket then its overflow chain for `pos`.
pub fn find(table: &HashTableData, pos: IVec3) -> Option<HashEntry> {
    let bucket = compute_hash(pos, table.num_buckets);
    let base = bucket * table.bucket_size;

    for j in 0..table.bucket_size {
        let entry = table.slots[(base + j) as usize].load();
        if pos_matches(&entry, pos) {
            return Some(entry);
        }
    }

    let last_slot = table.last_slot_of(bucket);
    let mut i = last_slot;
    let mut iter = 0;
    while iter < table.max_chain {
        let curr = table.slots[i as usize].load();
        if pos_matches(&curr, pos) {
            return Some(curr);
        }
        if curr.offset == 0 {
            break;
        }
        i = rem_euclid_slot(last_slot as i64 + curr.offset as i64, table.total_slots());
        iter += 1;
    }
    None
}

fn rem_euclid_slot(idx: i64, total_slots: u32) -> u32 {
    idx.rem_euclid(total_slots as i64) as u32
}

/// Ensures an entry and backing block exist for `pos`. Idempotent on hit.
pub fn alloc_block(
    table: &HashTableData,
    locks: &BucketLocks,
    arena: &BlockArena,
    voxels_per_block: u32,
    pos: IVec3,
    release_locks_immediately: bool,
) -> EngineResult<AllocOutcome> {
    let bucket = compute_hash(pos, table.num_buckets);
    let base = bucket * table.bucket_size;

    let mut first_empty: Option<u32> = None;
    for j in 0..table.bucket_size {
        let slot = base + j;
        let entry = table.slots[slot as usize].load();
        if pos_matches(&entry, pos) {
            return Ok(AllocOutcome::AlreadyAllocated);
        }
        if first_empty.is_none() && entry.is_free() {
            first_empty = Some(slot);
        }
    }

    let last_slot = table.last_slot_of(bucket);
    let mut i = last_slot;
    let mut iter = 0;
    while iter < table.max_chain {
        let curr = table.slots[i as usize].load();
        if pos_matches(&curr, pos) {
            return Ok(AllocOutcome::AlreadyAllocated);
        }
        if curr.offset == 0 {
            break;
        }
        i = rem_euclid_slot(last_slot as i64 + curr.offset as i64, table.total_slots());
        iter += 1;
    }

    if let Some(empty_slot) = first_empty {
        if !locks.try_lock(bucket) {
            return Ok(AllocOutcome::LockContention);
        }
        let block_idx = match arena.consume() {
            Ok(idx) => idx,
            Err(e) => {
                if release_locks_immediately {
                    locks.unlock(bucket);
                }
                return Err(e);
            }
        };
        let ptr = (block_idx * voxels_per_block) as i32;
        table.slots[empty_slot as usize].store(HashEntry::new([pos.x, pos.y, pos.z], ptr, 0));
        if release_locks_immediately {
            locks.unlock(bucket);
        }
        return Ok(AllocOutcome::Allocated);
    }

    // primary bucket full: linear-probe forward from the chain head,
    // skipping any slot that is itself another bucket's reserved chain head.
    let mut offset: i32 = 0;
    let mut probe_iter = 0;
    while probe_iter < table.max_chain {
        offset += 1;
        let probe = rem_euclid_slot(last_slot as i64 + offset as i64, table.total_slots());
        if table.is_chain_head(probe) {
            continue;
        }
        let candidate = table.slots[probe as usize].load();
        if candidate.is_free() {
            if !locks.try_lock(bucket) {
                return Ok(AllocOutcome::LockContention);
            }
            let probe_bucket = table.bucket_of_slot(probe);
            if !locks.try_lock(probe_bucket) {
                if release_locks_immediately {
                    locks.unlock(bucket);
                }
                return Ok(AllocOutcome::LockContention);
            }
            let block_idx = match arena.consume() {
                Ok(idx) => idx,
                Err(e) => {
                    if release_locks_immediately {
                        locks.unlock(bucket);
                        locks.unlock(probe_bucket);
                    }
                    return Err(e);
                }
            };
            let ptr = (block_idx * voxels_per_block) as i32;
            let head = table.slots[last_slot as usize].load();
            table.slots[probe as usize].store(HashEntry::new([pos.x, pos.y, pos.z], ptr, head.offset));
            table.slots[last_slot as usize].offset.store(offset, std::sync::atomic::Ordering::Release);
            if release_locks_immediately {
                locks.unlock(bucket);
                locks.unlock(probe_bucket);
            }
            return Ok(AllocOutcome::Allocated);
        }
        probe_iter += 1;
    }

    Err(EngineError::ChainBoundExceeded { bucket, max_chain: table.max_chain })
}

/// Removes the live entry for `pos`, if any, and releases its block.
pub fn delete_hash_entry_element(
    table: &HashTableData,
    locks: &BucketLocks,
    arena: &BlockArena,
    voxels_per_block: u32,
    pos: IVec3,
    release_locks_immediately: bool,
) -> EngineResult<DeleteOutcome> {
    let bucket = compute_hash(pos, table.num_buckets);
    let base = bucket * table.bucket_size;

    for j in 0..table.bucket_size {
        let slot = base + j;
        let entry = table.slots[slot as usize].load();
        if pos_matches(&entry, pos) {
            return delete_at(table, locks, arena, voxels_per_block, bucket, slot, entry, release_locks_immediately);
        }
    }

    let last_slot = table.last_slot_of(bucket);
    let mut prev = last_slot;
    let mut i = last_slot;
    let mut iter = 0;
    while iter < table.max_chain {
        let curr = table.slots[i as usize].load();
        if pos_matches(&curr, pos) {
            return delete_chain_node(table, locks, arena, voxels_per_block, bucket, prev, i, curr, release_locks_immediately);
        }
        if curr.offset == 0 {
            break;
        }
        prev = i;
        i = rem_euclid_slot(last_slot as i64 + curr.offset as i64, table.total_slots());
        iter += 1;
    }

    Ok(DeleteOutcome::NotFound)
}

/// Deletes a match found directly in the primary bucket. If it has a
/// successor on the chain, the successor is copied over it (re-linking)
/// rather than resetting in place, so the chain stays walkable even when
/// the matched slot is not the bucket's reserved chain head.
fn delete_at(
    table: &HashTableData,
    locks: &BucketLocks,
    arena: &BlockArena,
    voxels_per_block: u32,
    bucket: u32,
    slot: u32,
    entry: HashEntry,
    release_locks_immediately: bool,
) -> EngineResult<DeleteOutcome> {
    if !locks.try_lock(bucket) {
        return Ok(DeleteOutcome::LockContention);
    }
    let block_idx = entry.ptr as u32 / voxels_per_block;
    let result = (|| -> EngineResult<DeleteOutcome> {
        arena.release(block_idx)?;
        if entry.offset == 0 {
            table.slots[slot as usize].reset();
        } else {
            let last_slot = table.last_slot_of(bucket);
            let next_idx = rem_euclid_slot(last_slot as i64 + entry.offset as i64, table.total_slots());
            let successor = table.slots[next_idx as usize].load();
            table.slots[slot as usize].store(successor);
            table.slots[next_idx as usize].reset();
        }
        Ok(DeleteOutcome::Deleted)
    })();
    if release_locks_immediately {
        locks.unlock(bucket);
    }
    result
}

/// Deletes a match found mid-chain or at the tail: unlink by patching the
/// predecessor's offset.
fn delete_chain_node(
    table: &HashTableData,
    locks: &BucketLocks,
    arena: &BlockArena,
    voxels_per_block: u32,
    bucket: u32,
    prev_idx: u32,
    curr_idx: u32,
    entry: HashEntry,
    release_locks_immediately: bool,
) -> EngineResult<DeleteOutcome> {
    if !locks.try_lock(bucket) {
        return Ok(DeleteOutcome::LockContention);
    }
    let block_idx = entry.ptr as u32 / voxels_per_block;
    let result = (|| -> EngineResult<DeleteOutcome> {
        arena.release(block_idx)?;
        table.slots[curr_idx as usize].reset();
        let new_offset = if entry.offset == 0 {
            0
        } else {
            let last_slot = table.last_slot_of(bucket);
            // offsets are always expressed relative to the bucket's chain
            // head; re-derive curr's absolute slot distance from prev.
            let curr_abs = rem_euclid_slot(last_slot as i64 + entry.offset as i64, table.total_slots());
            debug_assert_eq!(curr_abs, curr_idx);
            entry.offset
        };
        table.slots[prev_idx as usize]
            .offset
            .store(new_offset, std::sync::atomic::Ordering::Release);
        Ok(DeleteOutcome::Deleted)
    })();
    if release_locks_immediately {
        locks.unlock(bucket);
    }
    result
}
