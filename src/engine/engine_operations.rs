//! Hash engine operations — pure functions over [`HashEngineData`].
//!
//! This is the facade surface consumed by the sensor adapter and the
//! raycaster: allocate, integrate, compactify, garbage-collect, reset.

use glam::IVec3;
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::coord::{block_to_virtual_voxel_pos, delinearize_local, virtual_voxel_pos_to_world, world_to_block};
use crate::diagnostics::DiagnosticEvent;
use crate::entry::{HashEntry, Voxel};
use crate::error::EngineResult;
use crate::integrate::{combine_voxel, truncation_at_depth};
use crate::params::HashParams;
use crate::sensor::{CameraModel, ColorMap, DepthMap};
use crate::table::{self, AllocOutcome, DeleteOutcome};

use super::engine_data::{AllocationStats, EngineStats, GcStats, HashEngineData, IntegrationStats, VoxelBlocks};

pub fn create_hash_engine(params: HashParams) -> EngineResult<HashEngineData> {
    params.validate()?;

    let table = crate::table::HashTableData::new(params.num_buckets, params.bucket_size, params.hash_max_collision_linked_list_size);
    let locks = crate::locks::BucketLocks::new(params.num_buckets);
    let arena = crate::arena::BlockArena::new(params.num_blocks);

    let voxels_per_block = params.voxels_per_block() as usize;
    let blocks = (0..params.num_blocks)
        .map(|_| RwLock::new(vec![Voxel::EMPTY; voxels_per_block].into_boxed_slice()))
        .collect();

    Ok(HashEngineData {
        params,
        table,
        locks,
        arena,
        voxels: VoxelBlocks { blocks, voxels_per_block },
        compactified: parking_lot::Mutex::new(Vec::new()),
        diagnostics: crate::diagnostics::Diagnostics::new(),
    })
}

pub fn reset(data: &HashEngineData) {
    data.table.reset();
    data.locks.reset_all();
    data.arena.reset();
    for block in data.voxels.blocks.iter() {
        block.write().iter_mut().for_each(|v| *v = Voxel::EMPTY);
    }
    data.compactified.lock().clear();
}

pub fn stats(data: &HashEngineData) -> EngineStats {
    let live_entries = (0..data.table.total_slots())
        .into_par_iter()
        .filter(|&i| !data.table.slots[i as usize].load().is_free())
        .count() as u32;

    EngineStats {
        live_entries,
        free_blocks: data.arena.free_count(),
        num_blocks: data.arena.num_blocks(),
    }
}

/// Projects every valid depth pixel into up to three voxel-block candidates
/// (the surface and one step to either side along the truncation band, so
/// thin surfaces allocate both-sided blocks), then deduplicates across the
/// whole frame.
fn depth_candidate_blocks(depth: &dyn DepthMap, cam: &dyn CameraModel, params: &HashParams) -> Vec<[i32; 3]> {
    let width = depth.width();
    let height = depth.height();

    let mut candidates: Vec<[i32; 3]> = (0..height)
        .into_par_iter()
        .flat_map_iter(|y| {
            (0..width).flat_map(move |x| {
                let z = depth.depth_at(x, y);
                if z <= 0.0 {
                    return Vec::new();
                }
                let trunc = truncation_at_depth(params, z);
                let step = params.virtual_voxel_size.max(trunc / 2.0).max(1e-4);
                [-trunc, 0.0, trunc]
                    .iter()
                    .map(|offset| {
                        let sample_depth = (z + offset).max(step);
                        let world = cam.pixel_to_world(x, y, sample_depth);
                        let block = world_to_block(world, params);
                        [block.x, block.y, block.z]
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    candidates.sort_unstable();
    candidates.dedup();
    candidates
}

pub fn allocate_from_depth(
    data: &HashEngineData,
    depth: &dyn DepthMap,
    cam: &dyn CameraModel,
) -> EngineResult<AllocationStats> {
    let candidates = depth_candidate_blocks(depth, cam, &data.params);
    let mut stats = AllocationStats { attempted: candidates.len() as u32, ..Default::default() };

    let mut pending = candidates;
    for round in 0..data.params.alloc_retry_rounds.max(1) {
        if pending.is_empty() {
            break;
        }
        stats.rounds_used = round + 1;

        let voxels_per_block = data.params.voxels_per_block();
        let release_immediately = data.params.release_locks_immediately;
        let results: Vec<([i32; 3], Result<AllocOutcome, crate::error::EngineError>)> = pending
            .par_iter()
            .map(|pos| {
                let ivec = IVec3::new(pos[0], pos[1], pos[2]);
                let outcome = table::alloc_block(&data.table, &data.locks, &data.arena, voxels_per_block, ivec, release_immediately);
                (*pos, outcome)
            })
            .collect();

        let mut retry = Vec::new();
        for (pos, outcome) in results {
            match outcome {
                Ok(AllocOutcome::Allocated) => stats.allocated += 1,
                Ok(AllocOutcome::AlreadyAllocated) => stats.already_present += 1,
                Ok(AllocOutcome::LockContention) => retry.push(pos),
                Err(crate::error::EngineError::ChainBoundExceeded { bucket, .. }) => {
                    data.diagnostics.emit(DiagnosticEvent::ChainBoundExceeded { bucket });
                    log::warn!("allocate_from_depth: chain bound exceeded in bucket {bucket} allocating {pos:?}");
                }
                Err(_) => {
                    data.diagnostics.emit(DiagnosticEvent::FrameAllocationDropped {
                        attempted: 1,
                        succeeded: 0,
                    });
                    log::warn!("allocate_from_depth: dropped candidate block {pos:?} this frame");
                }
            }
        }
        pending = retry;

        if !data.params.release_locks_immediately {
            data.locks.reset_all();
        }
    }

    if !pending.is_empty() {
        log::warn!(
            "allocate_from_depth: {} candidate blocks still contended after {} rounds",
            pending.len(),
            data.params.alloc_retry_rounds
        );
    }

    Ok(stats)
}

pub fn compactify(data: &HashEngineData, cam: &dyn CameraModel) -> EngineResult<u32> {
    let entries = crate::compact::compactify(&data.table, cam, &data.params);
    let count = entries.len() as u32;
    *data.compactified.lock() = entries;
    Ok(count)
}

pub fn compactified_entries(data: &HashEngineData) -> Vec<HashEntry> {
    data.compactified.lock().clone()
}

pub fn integrate_from_depth(
    data: &HashEngineData,
    depth: &dyn DepthMap,
    color: &dyn ColorMap,
    cam: &dyn CameraModel,
) -> EngineResult<IntegrationStats> {
    compactify(data, cam)?;
    let entries = compactified_entries(data);

    let voxels_per_block = data.voxels.voxels_per_block as u32;
    let block_size = data.params.sdf_block_size as i32;
    let params = &data.params;

    let voxels_integrated: u64 = entries
        .par_iter()
        .map(|entry| {
            let block_idx = entry.ptr as u32 / voxels_per_block;
            let block_pos = IVec3::new(entry.pos[0], entry.pos[1], entry.pos[2]);
            let block_origin = block_to_virtual_voxel_pos(block_pos, block_size);

            let mut block = data.voxels.blocks[block_idx as usize].write();
            let mut integrated_here = 0u64;

            for idx in 0..voxels_per_block {
                let local = delinearize_local(idx, block_size);
                let virtual_voxel = block_origin + local;
                let world = virtual_voxel_pos_to_world(virtual_voxel, params.virtual_voxel_size);

                let Some((px, py, z)) = cam.project(world) else { continue };
                if px < 0.0 || py < 0.0 || z <= 0.0 {
                    continue;
                }
                let (px, py) = (px as u32, py as u32);
                if px >= depth.width() || py >= depth.height() {
                    continue;
                }

                let measured = depth.depth_at(px, py);
                if measured <= 0.0 {
                    continue;
                }

                let raw_sdf = measured - z;
                let trunc = truncation_at_depth(params, measured);
                if raw_sdf.abs() > trunc {
                    continue;
                }

                let observed = Voxel {
                    sdf: raw_sdf.clamp(-trunc, trunc),
                    color: color.color_at(px, py),
                    weight: 1,
                };

                let current = block[idx as usize];
                let combined = if current.weight == 0 {
                    observed
                } else {
                    combine_voxel(current, observed, params.integration_weight_max)
                };
                block[idx as usize] = combined;
                integrated_here += 1;
            }

            integrated_here
        })
        .sum();

    Ok(IntegrationStats {
        blocks_visited: entries.len() as u32,
        voxels_integrated,
    })
}

pub fn garbage_collect(data: &HashEngineData) -> EngineResult<GcStats> {
    let entries = compactified_entries(data);
    let voxels_per_block = data.voxels.voxels_per_block as u32;

    let dead: Vec<IVec3> = entries
        .par_iter()
        .filter(|entry| {
            let block_idx = entry.ptr as u32 / voxels_per_block;
            let block = data.voxels.blocks[block_idx as usize].read();
            block.iter().all(|v| v.weight == 0)
        })
        .map(|entry| IVec3::new(entry.pos[0], entry.pos[1], entry.pos[2]))
        .collect();

    let mut freed = 0u32;
    let mut pending = dead;
    for _round in 0..data.params.alloc_retry_rounds.max(1) {
        if pending.is_empty() {
            break;
        }
        let release_immediately = data.params.release_locks_immediately;
        let results: Vec<(IVec3, DeleteOutcome)> = pending
            .par_iter()
            .map(|pos| {
                let outcome = table::delete_hash_entry_element(&data.table, &data.locks, &data.arena, voxels_per_block, *pos, release_immediately)?;
                Ok((*pos, outcome))
            })
            .collect::<Result<Vec<_>, crate::error::EngineError>>()?;

        let mut retry = Vec::new();
        for (pos, outcome) in results {
            match outcome {
                DeleteOutcome::Deleted => freed += 1,
                DeleteOutcome::LockContention => retry.push(pos),
                DeleteOutcome::NotFound => {}
            }
        }
        pending = retry;
        if !data.params.release_locks_immediately {
            data.locks.reset_all();
        }
    }

    if freed > 0 {
        data.diagnostics.emit(DiagnosticEvent::GarbageCollected { freed_blocks: freed });
        log::debug!("garbage_collect: freed {freed} dead blocks");
    }

    Ok(GcStats { blocks_freed: freed })
}
