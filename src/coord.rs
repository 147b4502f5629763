//! World <-> virtual-voxel <-> block <-> local-index coordinate algebra.
//!
//! Every transform is a deterministic pure function of `virtual_voxel_size`.
//! No state, no methods — plain functions over `glam::IVec3`/`Vec3`, in the
//! same spirit as the teacher's `*_operations.rs` modules.

use glam::{IVec3, Vec3};

use crate::params::HashParams;

const HASH_PRIME_0: i32 = 73_856_093;
const HASH_PRIME_1: i32 = 19_349_669;
const HASH_PRIME_2: i32 = 83_492_791;

/// Rounds `p / voxel_size` half-away-from-zero, component-wise.
pub fn world_to_virtual_voxel_pos(p: Vec3, virtual_voxel_size: f32) -> IVec3 {
    let scaled = p / virtual_voxel_size;
    IVec3::new(
        round_half_away_from_zero(scaled.x),
        round_half_away_from_zero(scaled.y),
        round_half_away_from_zero(scaled.z),
    )
}

fn round_half_away_from_zero(v: f32) -> i32 {
    if v == 0.0 {
        return 0;
    }
    (v + v.signum() * 0.5) as i32
}

pub fn virtual_voxel_pos_to_world(v: IVec3, virtual_voxel_size: f32) -> Vec3 {
    v.as_vec3() * virtual_voxel_size
}

/// Negative-bias-corrected divide by `block_size`, so contiguous negative
/// voxel ranges map to contiguous negative block coordinates.
pub fn virtual_voxel_pos_to_block(v: IVec3, block_size: i32) -> IVec3 {
    IVec3::new(
        div_block_axis(v.x, block_size),
        div_block_axis(v.y, block_size),
        div_block_axis(v.z, block_size),
    )
}

fn div_block_axis(c: i32, block_size: i32) -> i32 {
    if c < 0 {
        (c - (block_size - 1)) / block_size
    } else {
        c / block_size
    }
}

pub fn block_to_virtual_voxel_pos(block: IVec3, block_size: i32) -> IVec3 {
    block * block_size
}

/// `((v mod B) + B) mod B` per axis, then linearized `z*B^2 + y*B + x`.
pub fn virtual_voxel_pos_to_local_index(v: IVec3, block_size: i32) -> u32 {
    let local = IVec3::new(
        euclid_mod(v.x, block_size),
        euclid_mod(v.y, block_size),
        euclid_mod(v.z, block_size),
    );
    linearize_local(local, block_size)
}

fn euclid_mod(c: i32, block_size: i32) -> i32 {
    ((c % block_size) + block_size) % block_size
}

pub fn linearize_local(local: IVec3, block_size: i32) -> u32 {
    (local.z * block_size * block_size + local.y * block_size + local.x) as u32
}

/// Inverse of [`linearize_local`]: local voxel position of `idx` in `[0, B^3)`.
pub fn delinearize_local(idx: u32, block_size: i32) -> IVec3 {
    let b = block_size as u32;
    let x = idx % b;
    let y = (idx / b) % b;
    let z = idx / (b * b);
    IVec3::new(x as i32, y as i32, z as i32)
}

pub fn world_to_block(p: Vec3, params: &HashParams) -> IVec3 {
    let v = world_to_virtual_voxel_pos(p, params.virtual_voxel_size);
    virtual_voxel_pos_to_block(v, params.sdf_block_size as i32)
}

pub fn block_to_world(block: IVec3, params: &HashParams) -> Vec3 {
    let v = block_to_virtual_voxel_pos(block, params.sdf_block_size as i32);
    virtual_voxel_pos_to_world(v, params.virtual_voxel_size)
}

/// World position of a block's center (its lower corner shifted by half the
/// block's extent).
pub fn block_center_world(block: IVec3, params: &HashParams) -> Vec3 {
    let corner = block_to_world(block, params);
    let half_extent = params.virtual_voxel_size * (params.sdf_block_size as f32 - 1.0) * 0.5;
    corner + Vec3::splat(half_extent)
}

/// Teschner spatial hash, clamped nonnegative. Multiplication overflow is
/// defined two's-complement wraparound.
pub fn compute_hash(block_pos: IVec3, num_buckets: u32) -> u32 {
    let hashed = (block_pos.x.wrapping_mul(HASH_PRIME_0))
        ^ (block_pos.y.wrapping_mul(HASH_PRIME_1))
        ^ (block_pos.z.wrapping_mul(HASH_PRIME_2));
    let mut res = hashed % (num_buckets as i32);
    if res < 0 {
        res += num_buckets as i32;
    }
    res as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rounds_to_zero() {
        assert_eq!(world_to_virtual_voxel_pos(Vec3::ZERO, 0.01), IVec3::ZERO);
    }

    #[test]
    fn coordinate_round_trip() {
        for v in [
            IVec3::new(0, 0, 0),
            IVec3::new(7, -3, 2),
            IVec3::new(-100, 50, -1),
            IVec3::new(12345, -6789, 1),
        ] {
            let world = virtual_voxel_pos_to_world(v, 0.0125);
            let back = world_to_virtual_voxel_pos(world, 0.0125);
            assert_eq!(v, back, "round trip failed for {v:?}");
        }
    }

    #[test]
    fn negative_bias_block_divide_is_contiguous() {
        // all voxels in [-8, -1] must map to block -1, not 0 or split.
        for x in -8..0 {
            assert_eq!(virtual_voxel_pos_to_block(IVec3::new(x, 0, 0), 8).x, -1);
        }
        for x in 0..8 {
            assert_eq!(virtual_voxel_pos_to_block(IVec3::new(x, 0, 0), 8).x, 0);
        }
    }

    #[test]
    fn local_index_linearizes_and_delinearizes() {
        for idx in 0..512u32 {
            let local = delinearize_local(idx, 8);
            assert_eq!(linearize_local(local, 8), idx);
        }
    }

    #[test]
    fn local_index_wraps_negative_positions() {
        let idx = virtual_voxel_pos_to_local_index(IVec3::new(-1, -1, -1), 8);
        assert_eq!(idx, linearize_local(IVec3::new(7, 7, 7), 8));
    }

    #[test]
    fn hash_is_deterministic_and_in_range() {
        let num_buckets = 1024;
        for pos in [
            IVec3::new(0, 0, 0),
            IVec3::new(7, 3, -2),
            IVec3::new(-500, 500, -500),
        ] {
            let h1 = compute_hash(pos, num_buckets);
            let h2 = compute_hash(pos, num_buckets);
            assert_eq!(h1, h2);
            assert!(h1 < num_buckets);
        }
    }
}
