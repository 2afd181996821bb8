//! Hash join family (C7): single-threaded, build-side-chunked, and
//! L2-sized-chunked variants, all probing the full left relation.

use crate::config::JoinConfig;
use crate::error::{panic_message, JoinError};
use crate::pool::ThreadPool;
use crate::record::{make_result, CastRecord, ResultRecord, TitleRecord};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Selects which hash-join implementation [`perform_hash_join`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashJoinVariant {
    /// Single-threaded build over a `BTreeMap`.
    OrderedMap,
    /// Single-threaded build over a `HashMap`. The default variant.
    UnorderedMap,
    /// Build-side partitioned across `num_threads` workers, each probing all of `left`.
    Chunked,
    /// Like `Chunked`, but each chunk is capped at `HASHMAP_CAPACITY` so its
    /// build table fits in L2.
    CacheSized,
}

impl Default for HashJoinVariant {
    fn default() -> Self {
        HashJoinVariant::UnorderedMap
    }
}

/// Dispatch to the requested hash-join variant.
pub fn perform_hash_join(
    variant: HashJoinVariant,
    left: &[CastRecord],
    right: &[TitleRecord],
    config: &JoinConfig,
) -> Result<Vec<ResultRecord>, JoinError> {
    match variant {
        HashJoinVariant::OrderedMap => Ok(perform_ordered_map_join(left, right)),
        HashJoinVariant::UnorderedMap => Ok(perform_unordered_map_join(left, right)),
        HashJoinVariant::Chunked => perform_chunked_hash_join(left, right, config.num_threads),
        HashJoinVariant::CacheSized => perform_cache_sized_hash_join(left, right, config),
    }
}

/// Build a `title_id -> &TitleRecord` `BTreeMap` from `right`, then probe `left`.
pub fn perform_ordered_map_join(left: &[CastRecord], right: &[TitleRecord]) -> Vec<ResultRecord> {
    let mut map: BTreeMap<i32, &TitleRecord> = BTreeMap::new();
    for title in right {
        map.insert(title.title_id, title);
    }
    probe(left, &map)
}

/// Build a `title_id -> &TitleRecord` `HashMap` from `right`, then probe `left`.
/// The default hash-join variant.
pub fn perform_unordered_map_join(left: &[CastRecord], right: &[TitleRecord]) -> Vec<ResultRecord> {
    let mut map: HashMap<i32, &TitleRecord> = HashMap::with_capacity(right.len());
    for title in right {
        map.insert(title.title_id, title);
    }
    probe(left, &map)
}

fn probe<M>(left: &[CastRecord], map: &M) -> Vec<ResultRecord>
where
    M: Lookup,
{
    let mut results = Vec::new();
    for cast in left {
        if let Some(title) = map.lookup(cast.movie_id) {
            results.push(make_result(cast, title));
        }
    }
    results
}

trait Lookup {
    fn lookup(&self, key: i32) -> Option<&TitleRecord>;
}

impl Lookup for BTreeMap<i32, &TitleRecord> {
    fn lookup(&self, key: i32) -> Option<&TitleRecord> {
        self.get(&key).copied()
    }
}

impl Lookup for HashMap<i32, &TitleRecord> {
    fn lookup(&self, key: i32) -> Option<&TitleRecord> {
        self.get(&key).copied()
    }
}

/// Split `right` into `num_threads` contiguous ranges; each worker builds a
/// map over its own range and probes *all* of `left` against it. Correct
/// because the ranges are disjoint on `right`, at the cost of duplicated probe
/// work across workers.
pub fn perform_chunked_hash_join(
    left: &[CastRecord],
    right: &[TitleRecord],
    num_threads: usize,
) -> Result<Vec<ResultRecord>, JoinError> {
    let num_threads = num_threads.max(1);
    if right.is_empty() || num_threads == 1 {
        return Ok(perform_unordered_map_join(left, right));
    }
    let chunk_size = right.len().div_ceil(num_threads);
    let per_chunk: Result<Vec<Vec<ResultRecord>>, JoinError> = std::thread::scope(|scope| {
        right
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || perform_unordered_map_join(left, chunk)))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| {
                handle.join().map_err(|payload| JoinError::AlgorithmFailed {
                    algorithm: "hash_chunked",
                    reason: panic_message(payload),
                })
            })
            .collect()
    });
    Ok(per_chunk?.into_iter().flatten().collect())
}

/// `HASHMAP_CAPACITY`-bounded chunks of `right` are enqueued onto the bounded
/// [`ThreadPool`] from C3 (rather than one OS thread per chunk), so a small
/// `HASHMAP_CAPACITY` over a large `right` never spawns more concurrency than
/// `config.num_threads` allows. Falls back to [`perform_chunked_hash_join`]
/// when `right` cannot be split into at least `num_threads` cache-sized
/// chunks (§4.7).
pub fn perform_cache_sized_hash_join(
    left: &[CastRecord],
    right: &[TitleRecord],
    config: &JoinConfig,
) -> Result<Vec<ResultRecord>, JoinError> {
    let num_threads = config.num_threads.max(1);
    let capacity = config.cache_sizes.hashmap_capacity();

    if right.len() / num_threads < capacity {
        log::info!(
            "cache-sized hash join: |R|/num_threads ({}) < HASHMAP_CAPACITY ({capacity}); \
             falling back to chunked build-side partitioning",
            right.len() / num_threads.max(1)
        );
        return perform_chunked_hash_join(left, right, num_threads);
    }

    let pool = ThreadPool::new(num_threads);
    let left = Arc::new(left.to_vec());
    let handles: Vec<_> = right
        .chunks(capacity)
        .map(|chunk| {
            let left = Arc::clone(&left);
            let chunk = chunk.to_vec();
            pool.submit(move || perform_unordered_map_join(&left, &chunk))
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.extend(handle.join()?);
    }
    Ok(results)
}
