//! Fixed-capacity voxel block pool backed by an atomic free-list ("heap").
//!
//! `heap_counter` is a *count* of free blocks, not a top-of-stack index:
//! `heap[0..heap_counter]` always holds exactly the currently-free block
//! indices. `consume` decrements first then reads; `release` writes then
//! increments — this is the convention this crate commits to (see
//! DESIGN.md for the alternative the original source could be read as).

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{EngineError, EngineResult};

pub struct BlockArena {
    heap: Box<[AtomicU32]>,
    heap_counter: AtomicU32,
    num_blocks: u32,
}

impl BlockArena {
    pub fn new(num_blocks: u32) -> Self {
        let heap: Box<[AtomicU32]> = (0..num_blocks).map(AtomicU32::new).collect();
        Self {
            heap,
            heap_counter: AtomicU32::new(num_blocks),
            num_blocks,
        }
    }

    pub fn num_blocks(&self) -> u32 {
        self.num_blocks
    }

    /// Number of blocks currently on the free stack.
    pub fn free_count(&self) -> u32 {
        self.heap_counter.load(Ordering::Acquire)
    }

    /// Pops one block index off the free stack, or signals exhaustion.
    pub fn consume(&self) -> EngineResult<u32> {
        let mut current = self.heap_counter.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return Err(EngineError::ArenaExhausted {
                    requested_blocks: 1,
                    available: 0,
                });
            }
            match self.heap_counter.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Ok(self.heap[(current - 1) as usize].load(Ordering::Acquire));
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Pushes `block_idx` back onto the free stack.
    pub fn release(&self, block_idx: u32) -> EngineResult<()> {
        if block_idx >= self.num_blocks {
            return Err(EngineError::IllegalBlockIndex {
                block_idx,
                num_blocks: self.num_blocks,
            });
        }
        let slot = self.heap_counter.fetch_add(1, Ordering::AcqRel);
        self.heap[slot as usize].store(block_idx, Ordering::Release);
        Ok(())
    }

    /// Resets the free stack to its initial fully-free state.
    pub fn reset(&self) {
        for (i, slot) in self.heap.iter().enumerate() {
            slot.store(i as u32, Ordering::Relaxed);
        }
        self.heap_counter.store(self.num_blocks, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_then_release_is_lifo() {
        let arena = BlockArena::new(4);
        let a = arena.consume().unwrap();
        let b = arena.consume().unwrap();
        assert_eq!(arena.free_count(), 2);
        arena.release(b).unwrap();
        let c = arena.consume().unwrap();
        assert_eq!(b, c);
        arena.release(c).unwrap();
        arena.release(a).unwrap();
        assert_eq!(arena.free_count(), 4);
    }

    #[test]
    fn exhaustion_is_reported() {
        let arena = BlockArena::new(1);
        arena.consume().unwrap();
        assert!(matches!(arena.consume(), Err(EngineError::ArenaExhausted { .. })));
    }

    #[test]
    fn illegal_release_is_reported() {
        let arena = BlockArena::new(4);
        assert!(matches!(
            arena.release(10),
            Err(EngineError::IllegalBlockIndex { .. })
        ));
    }

    #[test]
    fn concurrent_consume_never_double_allocates() {
        use rayon::prelude::*;
        let arena = BlockArena::new(1000);
        let results: Vec<u32> = (0..1000).into_par_iter().map(|_| arena.consume().unwrap()).collect();
        let mut sorted = results.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), results.len());
        assert_eq!(arena.free_count(), 0);
    }
}
