//! Hash table storage — pure data.
//!
//! Every field of a slot is an independent atomic so that a read pass can
//! observe a partially-written entry without tearing across the 32-byte
//! [`crate::entry::HashEntry`] representation; all-or-nothing visibility of
//! a *new* entry's three fields is provided by the bucket mutex that
//! serializes writers in `table::operations`, not by the slot itself.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::entry::HashEntry;
use crate::params::FREE_ENTRY;

pub struct TableSlot {
    pub pos: [AtomicI32; 3],
    pub ptr: AtomicI32,
    pub offset: AtomicI32,
}

impl TableSlot {
    fn free() -> Self {
        Self {
            pos: [AtomicI32::new(0), AtomicI32::new(0), AtomicI32::new(0)],
            ptr: AtomicI32::new(FREE_ENTRY),
            offset: AtomicI32::new(0),
        }
    }

    pub fn load(&self) -> HashEntry {
        HashEntry::new(
            [
                self.pos[0].load(Ordering::Acquire),
                self.pos[1].load(Ordering::Acquire),
                self.pos[2].load(Ordering::Acquire),
            ],
            self.ptr.load(Ordering::Acquire),
            self.offset.load(Ordering::Acquire),
        )
    }

    pub fn store(&self, entry: HashEntry) {
        self.pos[0].store(entry.pos[0], Ordering::Release);
        self.pos[1].store(entry.pos[1], Ordering::Release);
        self.pos[2].store(entry.pos[2], Ordering::Release);
        self.offset.store(entry.offset, Ordering::Release);
        // ptr is published last: a reader that observes ptr != FREE_ENTRY
        // is guaranteed to observe the matching pos/offset written above.
        self.ptr.store(entry.ptr, Ordering::Release);
    }

    pub fn reset(&self) {
        self.store(HashEntry::FREE);
    }
}

pub struct HashTableData {
    pub slots: Box<[TableSlot]>,
    pub num_buckets: u32,
    pub bucket_size: u32,
    pub max_chain: u32,
}

impl HashTableData {
    pub fn new(num_buckets: u32, bucket_size: u32, max_chain: u32) -> Self {
        let total = (num_buckets * bucket_size) as usize;
        let slots = (0..total).map(|_| TableSlot::free()).collect();
        Self { slots, num_buckets, bucket_size, max_chain }
    }

    pub fn total_slots(&self) -> u32 {
        self.num_buckets * self.bucket_size
    }

    pub fn last_slot_of(&self, bucket: u32) -> u32 {
        (bucket + 1) * self.bucket_size - 1
    }

    pub fn bucket_of_slot(&self, slot: u32) -> u32 {
        slot / self.bucket_size
    }

    /// True iff `slot` is the reserved chain-head slot of some bucket.
    pub fn is_chain_head(&self, slot: u32) -> bool {
        (slot + 1) % self.bucket_size == 0
    }

    pub fn reset(&self) {
        for slot in self.slots.iter() {
            slot.reset();
        }
    }
}
