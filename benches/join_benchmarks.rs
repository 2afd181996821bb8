//! Criterion benchmarks comparing every equi-join algorithm on the same
//! synthetic cast/title fixture, mirroring the timing harness `Join.cpp` drove
//! by hand over `clock()` calls.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use joinforge::config::JoinConfig;
use joinforge::join::{perform_join, HashJoinVariant, JoinAlgorithm};
use joinforge::record::{BoundedBytes, CastRecord, TitleRecord};

fn fixture(left_len: usize, right_len: usize, cardinality: i32) -> (Vec<CastRecord>, Vec<TitleRecord>) {
    let left = (0..left_len)
        .map(|i| CastRecord {
            cast_info_id: i as i32,
            movie_id: (i as i32) % cardinality,
            person_id: i as i32,
            person_role_id: 0,
            note: BoundedBytes::new(b"actor"),
            nr_order: 0,
            role_id: 0,
        })
        .collect();
    let right = (0..right_len)
        .map(|i| TitleRecord {
            title_id: (i as i32) % cardinality,
            title: BoundedBytes::new(format!("movie-{i}").as_bytes()),
            imdb_id: i as i32,
            kind_id: 1,
            production_year: 2000,
            ..Default::default()
        })
        .collect();
    (left, right)
}

fn bench_algorithms(c: &mut Criterion) {
    let (left, right) = fixture(20_000, 4_000, 500);
    let config = JoinConfig::with_threads(num_cpus::get());

    let algorithms = [
        ("nested_loop", JoinAlgorithm::NestedLoop),
        ("sort_merge", JoinAlgorithm::SortMerge { chunked: false }),
        ("sort_merge_chunked", JoinAlgorithm::SortMerge { chunked: true }),
        ("hash_ordered_map", JoinAlgorithm::Hash(HashJoinVariant::OrderedMap)),
        ("hash_unordered_map", JoinAlgorithm::Hash(HashJoinVariant::UnorderedMap)),
        ("hash_chunked", JoinAlgorithm::Hash(HashJoinVariant::Chunked)),
        ("hash_cache_sized", JoinAlgorithm::Hash(HashJoinVariant::CacheSized)),
        ("radix_partition", JoinAlgorithm::RadixPartition),
    ];

    let mut group = c.benchmark_group("equi_join");
    for (name, algorithm) in algorithms {
        group.bench_with_input(BenchmarkId::from_parameter(name), &algorithm, |b, algorithm| {
            b.iter(|| perform_join(*algorithm, black_box(&left), black_box(&right), &config).unwrap());
        });
    }
    group.finish();
}

fn bench_trie_prefix(c: &mut Criterion) {
    let (left, right) = fixture(20_000, 4_000, 500);
    let config = JoinConfig::with_threads(num_cpus::get());
    c.bench_function("trie_prefix", |b| {
        b.iter(|| perform_join(JoinAlgorithm::TriePrefix, black_box(&left), black_box(&right), &config).unwrap());
    });
}

criterion_group!(benches, bench_algorithms, bench_trie_prefix);
criterion_main!(benches);
