//! The two payload types stored by the hash table and the voxel arena.

use bytemuck::{Pod, Zeroable};
use static_assertions::assert_eq_size;

use crate::params::FREE_ENTRY;

/// A slot in the two-level hash table.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct HashEntry {
    pub pos: [i32; 3],
    pub ptr: i32,
    pub offset: i32,
    _pad: [i32; 3],
}

assert_eq_size!(HashEntry, [u8; 32]);

impl HashEntry {
    pub const FREE: Self = Self {
        pos: [0, 0, 0],
        ptr: FREE_ENTRY,
        offset: 0,
        _pad: [0; 3],
    };

    pub fn new(pos: [i32; 3], ptr: i32, offset: i32) -> Self {
        Self { pos, ptr, offset, _pad: [0; 3] }
    }

    pub fn is_free(&self) -> bool {
        self.ptr == FREE_ENTRY
    }
}

impl Default for HashEntry {
    fn default() -> Self {
        Self::FREE
    }
}

/// A single voxel's integrated SDF, color and weight.
#[repr(C, align(8))]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Voxel {
    pub sdf: f32,
    pub color: [u8; 3],
    pub weight: u8,
}

assert_eq_size!(Voxel, [u8; 8]);

impl Voxel {
    pub const EMPTY: Self = Self { sdf: 0.0, color: [0, 0, 0], weight: 0 };
}

impl Default for Voxel {
    fn default() -> Self {
        Self::EMPTY
    }
}
