//! # joinforge
//!
//! A parallel, cache-conscious equi-join engine over two in-memory relations.
//!
//! ## Architecture
//!
//! - `record`: fixed-shape cast/title/result records and their CSV parsers
//! - `loader`: sequential and parallel CSV loading
//! - `pool`: bounded thread pool shared by the parallel strategies
//! - `sort`: chunked and recursive parallel sort primitives
//! - `cache`: L1/L2/L3 cache-size detection
//! - `config`: per-invocation tuning knobs (thread count, block size, cache sizes)
//! - `error`: the error taxonomy every fallible component surfaces through
//! - `join`: the join algorithms themselves and their dispatcher
//!
//! Callers typically load two relations, pick a [`join::JoinAlgorithm`], and
//! call [`join::perform_join`]:
//!
//! ```no_run
//! use joinforge::{config::JoinConfig, join};
//!
//! let left = joinforge::loader::load_cast_relation("cast.csv", None).unwrap();
//! let right = joinforge::loader::load_title_relation("title.csv", None).unwrap();
//! let config = JoinConfig::default();
//! let results = join::perform_join(join::JoinAlgorithm::RadixPartition, &left, &right, &config).unwrap();
//! println!("{} matches", results.len());
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod join;
pub mod loader;
pub mod pool;
pub mod record;
pub mod sort;

pub use config::JoinConfig;
pub use error::JoinError;
pub use record::{CastRecord, ResultRecord, TitleRecord};

/// Crate version, re-exported for the CLI's `--version` output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
