//! Environment probe (C11): L1/L2/L3 cache sizes, detected on first use.

use std::sync::OnceLock;

/// Conservative fallback used whenever detection fails.
const DEFAULT_L1: usize = 32 * 1024;
const DEFAULT_L2: usize = 256 * 1024;
const DEFAULT_L3: usize = 4 * 1024 * 1024;

/// Cache sizes used to derive join sizing constants. Only L2 currently feeds an
/// algorithm, but all three are exposed for completeness and future tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSizes {
    /// L1 data cache size in bytes.
    pub l1: usize,
    /// L2 cache size in bytes.
    pub l2: usize,
    /// L3 cache size in bytes.
    pub l3: usize,
}

impl Default for CacheSizes {
    fn default() -> Self {
        Self {
            l1: DEFAULT_L1,
            l2: DEFAULT_L2,
            l3: DEFAULT_L3,
        }
    }
}

impl CacheSizes {
    /// Detect the running machine's cache sizes, falling back to conservative
    /// defaults on any failure. Cheap to call repeatedly; callers that need a
    /// process-wide singleton should go through [`detected`].
    pub fn detect() -> Self {
        #[cfg(target_os = "linux")]
        {
            let mut sizes = Self::default();
            if let Some(l1) = read_cache_index_size(0) {
                sizes.l1 = l1;
            }
            if let Some(l2) = read_cache_index_size(2) {
                sizes.l2 = l2;
            }
            if let Some(l3) = read_cache_index_size(3) {
                sizes.l3 = l3;
            }
            sizes
        }
        #[cfg(not(target_os = "linux"))]
        {
            Self::default()
        }
    }

    /// `HASHMAP_CAPACITY` per §4.7: the number of `(pointer, key)` pairs a hash
    /// table must not exceed to fit within L2.
    pub fn hashmap_capacity(&self) -> usize {
        let entry_size = std::mem::size_of::<usize>() + std::mem::size_of::<i32>();
        (self.l2 / entry_size).max(1)
    }
}

#[cfg(target_os = "linux")]
fn read_cache_index_size(index: u8) -> Option<usize> {
    let path = format!("/sys/devices/system/cpu/cpu0/cache/index{index}/size");
    let raw = std::fs::read_to_string(path).ok()?;
    parse_kib_size(raw.trim())
}

#[cfg(target_os = "linux")]
fn parse_kib_size(raw: &str) -> Option<usize> {
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    let kib: usize = digits.parse().ok()?;
    Some(kib * 1024)
}

/// Process-wide cache sizes, detected once and reused by every join invocation
/// that does not supply its own [`CacheSizes`] override.
pub fn detected() -> CacheSizes {
    static CELL: OnceLock<CacheSizes> = OnceLock::new();
    *CELL.get_or_init(CacheSizes::detect)
}
