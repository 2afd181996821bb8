//! Join dispatcher (C10): a tagged union of algorithm choices, not a virtual
//! interface (§9). Each variant is a plain function; strategies never call
//! into each other except for the documented fallbacks inside C7/C8.

use crate::config::JoinConfig;
use crate::error::JoinError;
use crate::join::hash::{perform_hash_join, HashJoinVariant};
use crate::join::nested_loop::perform_nested_loop_join;
use crate::join::radix::perform_radix_partition_join;
use crate::join::sort_merge::{perform_chunked_sort_merge_join, perform_sort_merge_join};
use crate::join::trie::perform_trie_prefix_join;
use crate::record::{CastRecord, ResultRecord, TitleRecord};

/// Selects the equi-join strategy [`perform_join`] runs. Trie-based prefix
/// matching is invoked through the same dispatcher even though it answers a
/// different predicate (§4.9), since callers select it the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinAlgorithm {
    /// C5: sequential correctness oracle.
    NestedLoop,
    /// C6: sort both sides, then merge. `chunked = true` parallelizes the merge
    /// pass across `num_threads` left-side ranges.
    SortMerge { chunked: bool },
    /// C7: single-threaded, chunked, or cache-sized hash join.
    Hash(HashJoinVariant),
    /// C8: co-partition both sides by the join key, join matching buckets.
    RadixPartition,
    /// C9: `left.note` prefix-matched against `right.title`.
    TriePrefix,
}

/// Run `algorithm` over `left`/`right` using `config`. Every algorithm's
/// output is multiset-equivalent to [`perform_nested_loop_join`]'s on the same
/// input (§8), except `TriePrefix`, which answers the prefix predicate.
pub fn perform_join(
    algorithm: JoinAlgorithm,
    left: &[CastRecord],
    right: &[TitleRecord],
    config: &JoinConfig,
) -> Result<Vec<ResultRecord>, JoinError> {
    match algorithm {
        JoinAlgorithm::NestedLoop => Ok(perform_nested_loop_join(left, right)),
        JoinAlgorithm::SortMerge { chunked: false } => {
            Ok(perform_sort_merge_join(left, right, config))
        }
        JoinAlgorithm::SortMerge { chunked: true } => {
            perform_chunked_sort_merge_join(left, right, config)
        }
        JoinAlgorithm::Hash(variant) => perform_hash_join(variant, left, right, config),
        JoinAlgorithm::RadixPartition => perform_radix_partition_join(left, right, config),
        JoinAlgorithm::TriePrefix => Ok(perform_trie_prefix_join(left, right, config)),
    }
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
    fn every_equi_join_algorithm_agrees_with_the_oracle() {
        let left: Vec<_> = (0..120).map(|i| cast(i % 13)).collect();
        let right: Vec<_> = (0..60).map(|i| title(i % 13)).collect();
        let config = JoinConfig::with_threads(4);
        let oracle = perform_nested_loop_join(&left, &right);

        let algorithms = [
            JoinAlgorithm::NestedLoop,
            JoinAlgorithm::SortMerge { chunked: false },
            JoinAlgorithm::SortMerge { chunked: true },
            JoinAlgorithm::Hash(HashJoinVariant::OrderedMap),
            JoinAlgorithm::Hash(HashJoinVariant::UnorderedMap),
            JoinAlgorithm::Hash(HashJoinVariant::Chunked),
            JoinAlgorithm::Hash(HashJoinVariant::CacheSized),
            JoinAlgorithm::RadixPartition,
        ];

        let key = |r: &ResultRecord| (r.movie_id, r.title_id, r.cast_info_id, r.kind_id);
        let mut expected: Vec<_> = oracle.iter().map(key).collect();
        expected.sort();

        for algorithm in algorithms {
            let mut actual: Vec<_> = perform_join(algorithm, &left, &right, &config)
                .unwrap()
                .iter()
                .map(key)
                .collect();
            actual.sort();
            assert_eq!(actual, expected, "algorithm {algorithm:?} diverged from the oracle");
        }
    }
}
