//! Sort-merge join (C6): sorts both sides via C4, then performs a single merge
//! pass with mandatory duplicate-key block handling (§4.6).

use crate::config::JoinConfig;
use crate::error::{panic_message, JoinError};
use crate::record::{cast_ordering, make_result, title_ordering, CastRecord, ResultRecord, TitleRecord};
use crate::sort::chunked_sort;

/// Sort `left` and `right` in place using C4's chunked sort, then join.
pub fn perform_sort_merge_join(
    left: &[CastRecord],
    right: &[TitleRecord],
    config: &JoinConfig,
) -> Vec<ResultRecord> {
    let mut left = left.to_vec();
    let mut right = right.to_vec();
    chunked_sort(&mut left, config.num_threads, cast_ordering);
    chunked_sort(&mut right, config.num_threads, title_ordering);
    merge_sorted(&left, &right)
}

/// Merge two relations already sorted by their join keys. Every key with
/// multiplicity `m` on the left and `n` on the right contributes `m * n`
/// results — a merge that advances only one pointer per match is incorrect.
pub fn merge_sorted(left: &[CastRecord], right: &[TitleRecord]) -> Vec<ResultRecord> {
    let mut results = Vec::new();
    let (mut l_it, mut r_it) = (0usize, 0usize);
    while l_it < left.len() && r_it < right.len() {
        let key = left[l_it].movie_id;
        match key.cmp(&right[r_it].title_id) {
            std::cmp::Ordering::Less => l_it += 1,
            std::cmp::Ordering::Greater => r_it += 1,
            std::cmp::Ordering::Equal => {
                let l_start = l_it;
                while l_it < left.len() && left[l_it].movie_id == key {
                    l_it += 1;
                }
                let r_start = r_it;
                while r_it < right.len() && right[r_it].title_id == key {
                    r_it += 1;
                }
                for l in &left[l_start..l_it] {
                    for r in &right[r_start..r_it] {
                        results.push(make_result(l, r));
                    }
                }
            }
        }
    }
    results
}

/// Chunked parallel variant: after sorting, slice `left` into `config.num_threads`
/// contiguous ranges. Each worker seeks `right` to `lower_bound(first_key_of_chunk)`
/// and merges from there. Chunk boundaries are pre-adjusted forward to the first
/// strictly-greater key so no left key-group is split across two workers —
/// each key-group is therefore owned by exactly one worker (§4.6).
pub fn perform_chunked_sort_merge_join(
    left: &[CastRecord],
    right: &[TitleRecord],
    config: &JoinConfig,
) -> Result<Vec<ResultRecord>, JoinError> {
    if left.len() < config.num_threads.max(1) {
        return Ok(perform_sort_merge_join(left, right, config));
    }

    let mut left = left.to_vec();
    let mut right = right.to_vec();
    chunked_sort(&mut left, config.num_threads, cast_ordering);
    chunked_sort(&mut right, config.num_threads, title_ordering);

    let boundaries = key_group_boundaries(&left, config.num_threads.max(1));

    let per_chunk: Result<Vec<Vec<ResultRecord>>, JoinError> = std::thread::scope(|scope| {
        let right_ref = &right;
        let left_ref = &left;
        boundaries
            .windows(2)
            .map(|bounds| {
                let (start, end) = (bounds[0], bounds[1]);
                scope.spawn(move || {
                    if start == end {
                        return Vec::new();
                    }
                    let chunk = &left_ref[start..end];
                    let r_start = lower_bound_title(right_ref, chunk[0].movie_id);
                    merge_sorted(chunk, &right_ref[r_start..])
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| {
                handle.join().map_err(|payload| JoinError::AlgorithmFailed {
                    algorithm: "chunked_sort_merge",
                    reason: panic_message(payload),
                })
            })
            .collect()
    });

    Ok(per_chunk?.into_iter().flatten().collect())
}

/// Compute `num_threads + 1` boundaries into `left` such that no boundary
/// falls inside a run of equal `movie_id`s (each boundary is pushed forward to
/// the start of the next distinct key).
fn key_group_boundaries(left: &[CastRecord], num_threads: usize) -> Vec<usize> {
    if left.is_empty() {
        return vec![0, 0];
    }
    let raw_chunk_size = left.len().div_ceil(num_threads);
    let mut boundaries = vec![0usize];
    let mut raw = raw_chunk_size;
    while raw < left.len() {
        // Extend the boundary forward past any run of the key straddling it,
        // so the whole key-group stays in one chunk.
        let key = left[raw].movie_id;
        let mut adjusted = raw;
        while adjusted < left.len() && left[adjusted].movie_id == key {
            adjusted += 1;
        }
        if adjusted > *boundaries.last().unwrap() {
            boundaries.push(adjusted);
        }
        raw += raw_chunk_size;
    }
    if *boundaries.last().unwrap() != left.len() {
        boundaries.push(left.len());
    }
    boundaries
}

fn lower_bound_title(right: &[TitleRecord], key: i32) -> usize {
    right.partition_point(|t| t.title_id < key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::BoundedBytes;

    fn cast(movie_id: i32) -> CastRecord {
        CastRecord {
            movie_id,
            ..Default::default()
        }
    }

    fn title(title_id: i32) -> TitleRecord {
        TitleRecord {
            title_id,
            title: BoundedBytes::new(b"t"),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_heavy_merge_emits_full_cartesian_block() {
        let left: Vec<_> = (0..4).map(|_| cast(5)).collect();
        let right: Vec<_> = (0..3).map(|_| title(5)).collect();
        let results = merge_sorted(&left, &right);
        assert_eq!(results.len(), 12);
    }

    #[test]
    fn chunked_variant_matches_sequential_on_same_input() {
        let left: Vec<_> = (0..200).map(|i| cast(i % 17)).collect();
        let right: Vec<_> = (0..80).map(|i| title(i % 17)).collect();
        let config = JoinConfig::with_threads(4);
        let mut sequential = perform_sort_merge_join(&left, &right, &config);
        let mut chunked = perform_chunked_sort_merge_join(&left, &right, &config).unwrap();
        let key = |r: &ResultRecord| (r.movie_id, r.title_id, r.cast_info_id, r.kind_id);
        sequential.sort_by_key(key);
        chunked.sort_by_key(key);
        assert_eq!(sequential.len(), chunked.len());
    }
}
