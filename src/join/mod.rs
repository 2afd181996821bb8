//! Join algorithms (C5–C9) and their dispatcher (C10).

pub mod dispatcher;
pub mod hash;
pub mod nested_loop;
pub mod radix;
pub mod sort_merge;
pub mod trie;

pub use dispatcher::{perform_join, JoinAlgorithm};
pub use hash::HashJoinVariant;
pub use nested_loop::perform_nested_loop_join;
pub use radix::perform_radix_partition_join;
pub use sort_merge::{perform_chunked_sort_merge_join, perform_sort_merge_join};
pub use trie::perform_trie_prefix_join;
