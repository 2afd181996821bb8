//! Concurrent string trie for the prefix join (C9): `left.note` is a prefix
//! key, `right.title` is the probed text. Grounded on the source's
//! `Trie`/`PathCompressionTrie` (per-node mutex, `map<char, Node>` children),
//! generalized to hold a vector of record pointers per terminal node and to
//! collect every populated node along a probe's walk rather than only the
//! deepest one (§4.9, §9 Open Question 2).

use crate::config::JoinConfig;
use crate::record::{make_result, BoundedBytes, CastRecord, ResultRecord, TitleRecord};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

struct TrieNode {
    children: Mutex<HashMap<char, Arc<TrieNode>>>,
    data: Mutex<Vec<usize>>,
}

impl TrieNode {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            children: Mutex::new(HashMap::new()),
            data: Mutex::new(Vec::new()),
        })
    }

    /// Return the child for `ch`, creating it under the node's mutex if
    /// absent. Locking is scoped to this one step: concurrent inserts down
    /// disjoint paths never contend past their shared prefix.
    fn child_or_insert(&self, ch: char) -> Arc<TrieNode> {
        let mut children = self.children.lock();
        children.entry(ch).or_insert_with(TrieNode::new).clone()
    }

    fn child(&self, ch: char) -> Option<Arc<TrieNode>> {
        self.children.lock().get(&ch).cloned()
    }
}

/// A trie mapping strings to indices into a caller-owned slice of left
/// records. Insert is safe to call concurrently: paths that diverge before
/// their first shared node proceed without contention; paths that share a
/// prefix serialize only at that shared node's child-map mutex.
pub struct Trie {
    root: Arc<TrieNode>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(),
        }
    }

    /// Insert `key` with an associated record index. Empty keys are rejected.
    pub fn insert(&self, key: &str, record_index: usize) {
        if key.is_empty() {
            return;
        }
        let mut node = self.root.clone();
        for ch in key.chars() {
            node = node.child_or_insert(ch);
        }
        node.data.lock().push(record_index);
    }

    /// Deterministic walk; returns every record index stored at the terminal
    /// node for `key` (possibly empty). No locking is required once the tree
    /// is stable, though this implementation still takes the (uncontended)
    /// node mutex for uniformity with `insert`.
    pub fn search(&self, key: &str) -> Vec<usize> {
        let mut node = self.root.clone();
        for ch in key.chars() {
            match node.child(ch) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }
        let result = node.data.lock().clone();
        result
    }

    /// Walk `query` character by character, collecting the data vector of
    /// *every* populated node visited along the way — not just the deepest —
    /// since the join needs every left record whose key is a prefix of
    /// `query` (§4.9, §9 Open Question 2).
    pub fn collect_prefix_matches(&self, query: &str) -> Vec<usize> {
        let mut matches = Vec::new();
        let mut node = self.root.clone();
        matches.extend(node.data.lock().iter().copied());
        for ch in query.chars() {
            match node.child(ch) {
                Some(child) => node = child,
                None => break,
            }
            matches.extend(node.data.lock().iter().copied());
        }
        matches
    }
}

/// If `bytes` begins with the sentinel `b'1'`, replace every maximal run of a
/// repeated character of length `k > 1` with `c`, `'*'`, `decimal(k)`. Applied
/// symmetrically to both sides so synthetic, highly repetitive test keys
/// compress before insertion/probing.
pub fn maybe_rle_encode(bytes: &[u8]) -> Vec<u8> {
    if bytes.first() != Some(&b'1') {
        return bytes.to_vec();
    }
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let mut run = 1;
        while i + run < bytes.len() && bytes[i + run] == c {
            run += 1;
        }
        if run > 1 {
            out.push(c);
            out.push(b'*');
            out.extend(run.to_string().bytes());
        } else {
            out.push(c);
        }
        i += run;
    }
    out
}

fn bounded_str<const N: usize>(field: &BoundedBytes<N>) -> String {
    let transformed = maybe_rle_encode(field.as_bytes());
    String::from_utf8_lossy(&transformed).into_owned()
}

/// Build a trie from `left.note`, then probe every `right.title` for every
/// note that is a prefix. Insert and probe are both parallelized via rayon;
/// the RLE transform is applied to both sides before insertion/probing.
pub fn perform_trie_prefix_join(
    left: &[CastRecord],
    right: &[TitleRecord],
    config: &JoinConfig,
) -> Vec<ResultRecord> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_threads.max(1))
        .build()
        .expect("failed to build trie join thread pool");

    let trie = Trie::new();
    pool.install(|| {
        left.par_iter().enumerate().for_each(|(idx, record)| {
            let key = bounded_str(&record.note);
            trie.insert(&key, idx);
        });
    });

    pool.install(|| {
        right
            .par_iter()
            .flat_map(|title| {
                let query = bounded_str(&title.title);
                let mut indices = trie.collect_prefix_matches(&query);
                indices.sort_unstable();
                indices.dedup();
                indices
                    .into_iter()
                    .map(|idx| make_result(&left[idx], title))
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key() {
        let trie = Trie::new();
        trie.insert("", 0);
        assert!(trie.search("").is_empty());
    }

    #[test]
    fn insertion_closure() {
        let trie = Trie::new();
        trie.insert("Don't", 0);
        assert_eq!(trie.search("Don't"), vec![0]);
    }

    #[test]
    fn prefix_closure_collects_every_ancestor() {
        let trie = Trie::new();
        trie.insert("Don't", 0);
        trie.insert("Don't Be", 1);
        let mut matches = trie.collect_prefix_matches("Don't Be a Menace (1996)");
        matches.sort_unstable();
        assert_eq!(matches, vec![0, 1]);
    }

    #[test]
    fn rle_encoding_only_applies_to_sentinel_prefixed_keys() {
        assert_eq!(maybe_rle_encode(b"aaabbb"), b"aaabbb".to_vec());
        assert_eq!(maybe_rle_encode(b"1aaabbb"), b"1a*3b*3".to_vec());
        assert_eq!(maybe_rle_encode(b"1x"), b"1x".to_vec());
    }

    #[test]
    fn end_to_end_prefix_join_scenario() {
        let left = vec![
            CastRecord {
                note: BoundedBytes::new(b"Don't"),
                ..Default::default()
            },
            CastRecord {
                note: BoundedBytes::new(b"Don't Be"),
                ..Default::default()
            },
        ];
        let right = vec![TitleRecord {
            title: BoundedBytes::new(b"Don't Be a Menace (1996)"),
            ..Default::default()
        }];
        let config = JoinConfig::with_threads(2);
        let results = perform_trie_prefix_join(&left, &right, &config);
        assert_eq!(results.len(), 2);
    }
}
