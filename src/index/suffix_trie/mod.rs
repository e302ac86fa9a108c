//! Per-field suffix trie used by suffix and contains queries

mod sweep;
mod trie;
pub mod types;

pub use trie::SuffixTrie;
pub use types::{MergeOutcome, Node, NodeId, Removal, Term, TrieStats};
