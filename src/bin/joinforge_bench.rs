//! joinforge-bench: loads cast/title fixtures and times a chosen join algorithm.

use clap::{Parser, ValueEnum};
use joinforge::config::JoinConfig;
use joinforge::join::{self, HashJoinVariant, JoinAlgorithm};
use joinforge::loader;
use std::path::PathBuf;
use std::time::Instant;

/// Available algorithm names on the command line, mapped onto [`JoinAlgorithm`].
#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    NestedLoop,
    SortMerge,
    ChunkedSortMerge,
    HashOrdered,
    HashUnordered,
    HashChunked,
    HashCacheSized,
    RadixPartition,
    TriePrefix,
}

impl From<AlgorithmArg> for JoinAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::NestedLoop => JoinAlgorithm::NestedLoop,
            AlgorithmArg::SortMerge => JoinAlgorithm::SortMerge { chunked: false },
            AlgorithmArg::ChunkedSortMerge => JoinAlgorithm::SortMerge { chunked: true },
            AlgorithmArg::HashOrdered => JoinAlgorithm::Hash(HashJoinVariant::OrderedMap),
            AlgorithmArg::HashUnordered => JoinAlgorithm::Hash(HashJoinVariant::UnorderedMap),
            AlgorithmArg::HashChunked => JoinAlgorithm::Hash(HashJoinVariant::Chunked),
            AlgorithmArg::HashCacheSized => JoinAlgorithm::Hash(HashJoinVariant::CacheSized),
            AlgorithmArg::RadixPartition => JoinAlgorithm::RadixPartition,
            AlgorithmArg::TriePrefix => JoinAlgorithm::TriePrefix,
        }
    }
}

/// Run a join algorithm over a cast/title CSV pair and report timing.
#[derive(Debug, Parser)]
#[command(name = "joinforge-bench", version = joinforge::VERSION)]
struct Cli {
    /// Path to the cast_info CSV fixture.
    #[arg(long)]
    left: PathBuf,

    /// Path to the title CSV fixture.
    #[arg(long)]
    right: PathBuf,

    /// Join algorithm to run.
    #[arg(long, value_enum, default_value_t = AlgorithmArg::RadixPartition)]
    algorithm: AlgorithmArg,

    /// Worker thread count. Defaults to the detected hardware concurrency.
    #[arg(long)]
    threads: Option<usize>,

    /// Loader chunk size in bytes.
    #[arg(long)]
    block_size: Option<usize>,

    /// Cap the number of records read from each relation.
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = JoinConfig::default();
    if let Some(threads) = cli.threads {
        config.num_threads = threads.max(1);
    }
    if let Some(block_size) = cli.block_size {
        config.block_size = block_size;
    }

    log::info!(
        "joinforge-bench v{} — {} threads, block_size={}",
        joinforge::VERSION,
        config.num_threads,
        config.block_size
    );

    let load_start = Instant::now();
    let left = loader::parallel_load_cast_relation(&cli.left, config.block_size, config.num_threads)?;
    let right = loader::parallel_load_title_relation(&cli.right, config.block_size, config.num_threads)?;
    let (left, right) = match cli.limit {
        Some(limit) => (truncate(left, limit), truncate(right, limit)),
        None => (left, right),
    };
    log::info!(
        "loaded {} cast rows and {} title rows in {:?}",
        left.len(),
        right.len(),
        load_start.elapsed()
    );

    let join_start = Instant::now();
    let results = join::perform_join(cli.algorithm.into(), &left, &right, &config)?;
    log::info!(
        "{:?} produced {} results in {:?}",
        cli.algorithm,
        results.len(),
        join_start.elapsed()
    );

    println!("{}", results.len());
    Ok(())
}

fn truncate<T>(mut records: Vec<T>, limit: usize) -> Vec<T> {
    records.truncate(limit);
    records
}
