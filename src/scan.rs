//! Reference exclusive-scan implementations satisfying [`PrefixScan`].
//!
//! The spec assumes an externally-supplied primitive (in the original
//! design, a GPU prefix sum). This crate is a standalone library with no
//! GPU backend, so it ships both a sequential scan and a rayon
//! work-stealing parallel scan; `HashEngine` picks between them by slot
//! count. Callers with a faster primitive (e.g. their own GPU scan) can
//! implement [`PrefixScan`] directly instead.

use rayon::prelude::*;

use crate::sensor::PrefixScan;

/// Below this many slots, the sequential scan wins: parallel chunking
/// overhead dominates.
pub const PARALLEL_THRESHOLD: usize = 4096;

pub struct SequentialScan;

impl PrefixScan for SequentialScan {
    fn exclusive_scan(&self, src: &[i32], dst: &mut [i32]) {
        sequential_scan(src, dst);
    }
}

fn sequential_scan(src: &[i32], dst: &mut [i32]) {
    let mut running = 0i32;
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = running;
        running += s;
    }
}

/// Chunked local-sums + scan-of-sums + offset pass, parallelized with
/// rayon's work-stealing pool. Chunk count defaults to the available
/// parallelism reported by `num_cpus`.
pub struct ParallelScan {
    chunks: usize,
}

impl ParallelScan {
    pub fn new() -> Self {
        Self { chunks: num_cpus::get().max(1) }
    }

    pub fn with_chunks(chunks: usize) -> Self {
        Self { chunks: chunks.max(1) }
    }
}

impl Default for ParallelScan {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixScan for ParallelScan {
    fn exclusive_scan(&self, src: &[i32], dst: &mut [i32]) {
        if src.len() < PARALLEL_THRESHOLD {
            sequential_scan(src, dst);
            return;
        }

        let n = src.len();
        let chunk_len = n.div_ceil(self.chunks);
        let chunk_sums: Vec<i32> = src
            .par_chunks(chunk_len)
            .map(|chunk| chunk.iter().sum())
            .collect();

        let mut chunk_offsets = vec![0i32; chunk_sums.len()];
        sequential_scan(&chunk_sums, &mut chunk_offsets);

        dst.par_chunks_mut(chunk_len)
            .zip(src.par_chunks(chunk_len))
            .zip(chunk_offsets.par_iter())
            .for_each(|((dst_chunk, src_chunk), &offset)| {
                let mut running = offset;
                for (s, d) in src_chunk.iter().zip(dst_chunk.iter_mut()) {
                    *d = running;
                    running += s;
                }
            });
    }
}

/// Exclusive-scans `src` into `dst` using a sensible default engine
/// (sequential below [`PARALLEL_THRESHOLD`] slots, rayon-parallel above).
pub fn exclusive_scan(src: &[i32], dst: &mut [i32]) {
    if src.len() < PARALLEL_THRESHOLD {
        SequentialScan.exclusive_scan(src, dst);
    } else {
        ParallelScan::new().exclusive_scan(src, dst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_matches_definition() {
        let src = vec![1, 2, 3, 4, 5];
        let mut dst = vec![0; 5];
        SequentialScan.exclusive_scan(&src, &mut dst);
        assert_eq!(dst, vec![0, 1, 3, 6, 10]);
    }

    #[test]
    fn parallel_matches_sequential_on_large_input() {
        let src: Vec<i32> = (0..20_000).map(|i| (i % 7) as i32).collect();
        let mut expected = vec![0; src.len()];
        sequential_scan(&src, &mut expected);

        let mut actual = vec![0; src.len()];
        ParallelScan::with_chunks(8).exclusive_scan(&src, &mut actual);

        assert_eq!(expected, actual);
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let src: Vec<i32> = vec![];
        let mut dst: Vec<i32> = vec![];
        exclusive_scan(&src, &mut dst);
        assert!(dst.is_empty());
    }
}
