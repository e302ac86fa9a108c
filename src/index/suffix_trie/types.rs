//! Types for suffix trie indexing
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. An id carries the
//! generation of the slot it was allocated from, so an id that outlives its
//! node (reclaimed by the collector) resolves to nothing instead of to an
//! unrelated node that reused the slot.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A normalized term, shared between the trie, the dictionary and the
/// reference counts of a field
pub type Term = Arc<str>;

/// Arena address of a trie node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// The root is allocated first and never reclaimed
    pub const ROOT: NodeId = NodeId {
        index: 0,
        generation: 0,
    };

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

/// A trie node
///
/// `terminals` holds every live term that has a suffix ending exactly here.
/// Children are kept ordered so traversal is lexicographic.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub(crate) children: BTreeMap<char, NodeId>,
    pub(crate) terminals: BTreeSet<Term>,
}

impl Node {
    pub fn terminals(&self) -> impl Iterator<Item = &Term> {
        self.terminals.iter()
    }

    pub fn has_terminals(&self) -> bool {
        !self.terminals.is_empty()
    }

    pub fn child(&self, ch: char) -> Option<NodeId> {
        self.children.get(&ch).copied()
    }

    pub fn children(&self) -> impl Iterator<Item = (char, NodeId)> + '_ {
        self.children.iter().map(|(&c, &id)| (c, id))
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Empty terminal set and no children
    pub fn is_vacant(&self) -> bool {
        self.terminals.is_empty() && self.children.is_empty()
    }
}

/// One pending node reclamation, produced by a sweep over a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub parent: NodeId,
    pub edge: char,
    pub node: NodeId,
}

/// Result of applying a batch of removals to the live trie
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Nodes unlinked and freed
    pub removed: usize,
    /// Nodes kept because they regained a terminal or a child since the snapshot
    pub survived: usize,
}

impl MergeOutcome {
    pub fn absorb(&mut self, other: MergeOutcome) {
        self.removed += other.removed;
        self.survived += other.survived;
    }
}

/// Structural statistics of a suffix trie
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrieStats {
    /// Allocated nodes, root included
    pub node_count: usize,
    /// Nodes at which at least one stored suffix ends
    pub suffix_count: usize,
    /// Sum of terminal set sizes
    pub terminal_entries: usize,
    /// Nodes with neither terminals nor children (left for the collector)
    pub vacant_nodes: usize,
    /// Arena slots waiting for reuse
    pub free_slots: usize,
}
