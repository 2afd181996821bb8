//! Parallel sort primitives (C4). Two implementations coexist per §4.4: a
//! chunked sort with linear merges (used by the chunked sort-merge join) and a
//! recursive parallel merge-sort (used wherever a relation needs a stable,
//! from-scratch parallel sort without reusing a prior chunk layout).

use rayon::prelude::*;

const MERGE_SEQUENTIAL_THRESHOLD: usize = 32;
const MERGE_SPAWN_THRESHOLD: usize = 1 << 14;

/// Partition `items` into `num_threads` contiguous ranges, sort each range in
/// parallel via rayon, then perform `num_threads - 1` sequential in-place
/// merges. Stability is not required.
pub fn chunked_sort<T, F>(items: &mut [T], num_threads: usize, cmp: F)
where
    T: Send + Clone,
    F: Fn(&T, &T) -> std::cmp::Ordering + Sync,
{
    let num_threads = num_threads.max(1).min(items.len().max(1));
    if items.len() < 2 || num_threads < 2 {
        items.sort_unstable_by(&cmp);
        return;
    }

    let chunk_size = items.len().div_ceil(num_threads);
    items
        .par_chunks_mut(chunk_size)
        .for_each(|chunk| chunk.sort_unstable_by(&cmp));

    let mut merged_len = chunk_size.min(items.len());
    while merged_len < items.len() {
        let next_len = (merged_len + chunk_size).min(items.len());
        merge_in_place(&mut items[..next_len], merged_len, &cmp);
        merged_len = next_len;
    }
}

/// Recursive parallel merge-sort: sequential below `~32` elements, two spawned
/// tasks above `~2^14` elements, otherwise sequential halves merged in place.
pub fn parallel_merge_sort<T, F>(items: &mut [T], cmp: &F)
where
    T: Send + Clone,
    F: Fn(&T, &T) -> std::cmp::Ordering + Sync,
{
    if items.len() <= MERGE_SEQUENTIAL_THRESHOLD {
        items.sort_unstable_by(cmp);
        return;
    }

    let len = items.len();
    let mid = len / 2;
    let (left, right) = items.split_at_mut(mid);

    if len >= MERGE_SPAWN_THRESHOLD {
        rayon::join(
            || parallel_merge_sort(left, cmp),
            || parallel_merge_sort(right, cmp),
        );
    } else {
        parallel_merge_sort(left, cmp);
        parallel_merge_sort(right, cmp);
    }

    merge_in_place(items, mid, cmp);
}

/// Merge the two sorted halves `items[..mid]` and `items[mid..]` in place.
fn merge_in_place<T, F>(items: &mut [T], mid: usize, cmp: &F)
where
    T: Clone,
    F: Fn(&T, &T) -> std::cmp::Ordering,
{
    if mid == 0 || mid == items.len() {
        return;
    }
    let mut merged = Vec::with_capacity(items.len());
    let (left, right) = items.split_at(mid);
    let (mut li, mut ri) = (0, 0);
    while li < left.len() && ri < right.len() {
        if cmp(&left[li], &right[ri]) != std::cmp::Ordering::Greater {
            merged.push(left[li].clone());
            li += 1;
        } else {
            merged.push(right[ri].clone());
            ri += 1;
        }
    }
    merged.extend_from_slice(&left[li..]);
    merged.extend_from_slice(&right[ri..]);
    items.clone_from_slice(&merged);
}
