//! Per-invocation configuration (C15). No global mutable state: every tunable the
//! source kept as file-scope statics (`maxBitsToCompare`, `numPartitionsToExpect`,
//! `HASHMAP_SIZE`) lives here instead, threaded explicitly into each join call.

use crate::cache::CacheSizes;

/// Default chunk size for the parallel CSV loader: comfortably larger than any
/// line in the cast/title fixtures.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Configuration shared by every join and load entry point.
#[derive(Debug, Clone)]
pub struct JoinConfig {
    /// Worker count for every parallel strategy. Always `>= 1`.
    pub num_threads: usize,
    /// Loader chunk size in bytes.
    pub block_size: usize,
    /// Cache sizes used to derive `HASHMAP_CAPACITY` and similar constants.
    pub cache_sizes: CacheSizes,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get().max(1),
            block_size: DEFAULT_BLOCK_SIZE,
            cache_sizes: CacheSizes::detect(),
        }
    }
}

impl JoinConfig {
    /// Build a configuration with an explicit thread count; `0` is normalized to
    /// `1` per §7's configuration-error policy.
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
            ..Self::default()
        }
    }

    /// Build a configuration from `JOINFORGE_NUM_THREADS` / `JOINFORGE_BLOCK_SIZE`
    /// environment variables, falling back to [`JoinConfig::default`] for any
    /// variable that is absent or fails to parse.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("JOINFORGE_NUM_THREADS") {
            if let Ok(threads) = raw.parse::<usize>() {
                config.num_threads = threads.max(1);
            }
        }
        if let Ok(raw) = std::env::var("JOINFORGE_BLOCK_SIZE") {
            if let Ok(block_size) = raw.parse::<usize>() {
                if block_size > 0 {
                    config.block_size = block_size;
                }
            }
        }
        config
    }
}
