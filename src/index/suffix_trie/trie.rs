//! Suffix trie
//!
//! Stores every suffix of every inserted term that is at least
//! `min_suffix_len` characters long. Suffixes that coincide share nodes, and
//! each node records in its terminal set which terms have a suffix ending
//! exactly there.
//!
//! - A contains query (`*lit*`) is a subtree walk under the node spelled by
//!   `lit`: any occurrence of `lit` inside a term starts one of its suffixes.
//! - A suffix query (`*lit`) reads the terminal set of that node only.
//!
//! Removing a term ([`SuffixTrie::mark_stale`]) clears it from the terminal
//! sets but never frees nodes. Reclamation is done by the collector (see
//! `sweep.rs`).

use super::types::*;
use std::collections::BTreeSet;
use std::ops::{ControlFlow, RangeInclusive};

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-backed suffix trie for a single field
#[derive(Debug, Clone)]
pub struct SuffixTrie {
    slots: Vec<Slot>,
    /// Reclaimed slot indices, reused by later allocations
    free: Vec<u32>,
    min_suffix_len: usize,
    live: usize,
}

impl SuffixTrie {
    /// Create an empty trie storing suffixes of at least `min_suffix_len` chars
    pub fn new(min_suffix_len: usize) -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::default()),
            }],
            free: Vec::new(),
            min_suffix_len: min_suffix_len.max(1),
            live: 1,
        }
    }

    pub fn min_suffix_len(&self) -> usize {
        self.min_suffix_len
    }

    /// Resolve a node id, `None` if it was reclaimed
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// Number of allocated nodes, root included
    pub fn node_count(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.node(NodeId::ROOT).is_none_or(|root| root.is_leaf())
    }

    fn alloc(&mut self) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(Node::default());
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(Node::default()),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Free a node's slot. The caller is responsible for unlinking it.
    pub(crate) fn release(&mut self, id: NodeId) -> bool {
        if id.is_root() {
            return false;
        }
        match self.slots.get_mut(id.index as usize) {
            Some(slot) if slot.generation == id.generation && slot.node.is_some() => {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                self.live -= 1;
                true
            }
            _ => false,
        }
    }

    /// Start offsets (in chars) of the suffixes stored for a term of `len` chars
    fn suffix_starts(&self, len: usize) -> Option<RangeInclusive<usize>> {
        (len >= self.min_suffix_len).then(|| 0..=len - self.min_suffix_len)
    }

    /// Insert every suffix of `term` that is long enough.
    ///
    /// Returns the number of suffixes that gained `term` in their terminal
    /// set; inserting a term that is already present returns 0.
    pub fn insert(&mut self, term: &Term) -> usize {
        let chars: Vec<char> = term.chars().collect();
        let Some(starts) = self.suffix_starts(chars.len()) else {
            return 0;
        };

        let mut added = 0;
        for start in starts {
            let end = self.walk_or_create(&chars[start..]);
            if let Some(node) = self.node_mut(end) {
                if node.terminals.insert(term.clone()) {
                    added += 1;
                }
            }
        }
        added
    }

    fn walk_or_create(&mut self, path: &[char]) -> NodeId {
        let mut current = NodeId::ROOT;
        for &ch in path {
            let next = self.node(current).and_then(|n| n.child(ch));
            current = match next {
                Some(id) => id,
                None => {
                    let id = self.alloc();
                    if let Some(parent) = self.node_mut(current) {
                        parent.children.insert(ch, id);
                    }
                    id
                }
            };
        }
        current
    }

    /// Remove `term` from the terminal set of each of its suffix nodes.
    ///
    /// Nodes left empty stay allocated until the collector reclaims them.
    /// Returns the number of terminal entries removed.
    pub fn mark_stale(&mut self, term: &str) -> usize {
        let chars: Vec<char> = term.chars().collect();
        let Some(starts) = self.suffix_starts(chars.len()) else {
            return 0;
        };

        let mut removed = 0;
        for start in starts {
            let Some(id) = self.find_chars(&chars[start..]) else {
                continue;
            };
            if let Some(node) = self.node_mut(id) {
                if node.terminals.remove(term) {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Node spelled by `pattern` from the root
    pub fn find(&self, pattern: &str) -> Option<NodeId> {
        let mut current = NodeId::ROOT;
        for ch in pattern.chars() {
            current = self.node(current)?.child(ch)?;
        }
        Some(current)
    }

    fn find_chars(&self, path: &[char]) -> Option<NodeId> {
        let mut current = NodeId::ROOT;
        for &ch in path {
            current = self.node(current)?.child(ch)?;
        }
        Some(current)
    }

    /// Whether `term` currently terminates at its full-length suffix
    pub fn contains_term(&self, term: &str) -> bool {
        self.find(term)
            .and_then(|id| self.node(id))
            .is_some_and(|node| node.terminals.contains(term))
    }

    /// Terms that end with `pattern` (terminal set of the node it spells)
    pub fn exact_search(&self, pattern: &str) -> Vec<Term> {
        self.find(pattern)
            .and_then(|id| self.node(id))
            .map(|node| node.terminals.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Terms that contain `pattern` (union of terminal sets below its node)
    pub fn prefix_search(&self, pattern: &str) -> Vec<Term> {
        let Some(start) = self.find(pattern) else {
            return Vec::new();
        };

        let mut found: BTreeSet<Term> = BTreeSet::new();
        let _ = self.visit_subtree(start, |node| {
            found.extend(node.terminals.iter().cloned());
            ControlFlow::<()>::Continue(())
        });
        found.into_iter().collect()
    }

    /// Depth-first, lexicographic pre-order walk of the subtree at `start`.
    ///
    /// The visitor can stop the walk by returning `Break`. Ids that no longer
    /// resolve are skipped.
    pub fn visit_subtree<'t, B>(
        &'t self,
        start: NodeId,
        mut visit: impl FnMut(&'t Node) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if let ControlFlow::Break(b) = visit(node) {
                return ControlFlow::Break(b);
            }
            // Reverse so the smallest edge is popped first
            stack.extend(node.children.values().rev().copied());
        }
        ControlFlow::Continue(())
    }

    /// Every stored suffix, sorted
    pub fn dump(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut path: Vec<char> = Vec::new();
        let mut stack: Vec<(NodeId, usize, Option<char>)> = vec![(NodeId::ROOT, 0, None)];

        while let Some((id, depth, edge)) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            path.truncate(depth.saturating_sub(1));
            if let Some(ch) = edge {
                path.push(ch);
            }

            if node.has_terminals() {
                out.push(path.iter().collect());
            }
            for (&ch, &child) in node.children.iter().rev() {
                stack.push((child, depth + 1, Some(ch)));
            }
        }
        out
    }

    /// Iterate live slots
    pub(crate) fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node.as_ref().map(|node| {
                (
                    NodeId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    node,
                )
            })
        })
    }

    pub(crate) fn slot_capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn stats(&self) -> TrieStats {
        let mut stats = TrieStats {
            node_count: self.live,
            free_slots: self.free.len(),
            ..Default::default()
        };
        for (id, node) in self.nodes() {
            if node.has_terminals() {
                stats.suffix_count += 1;
                stats.terminal_entries += node.terminals.len();
            }
            if !id.is_root() && node.is_vacant() {
                stats.vacant_nodes += 1;
            }
        }
        stats
    }
}

impl Default for SuffixTrie {
    fn default() -> Self {
        Self::new(crate::index::types::DEFAULT_MIN_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn term(s: &str) -> Term {
        Arc::from(s)
    }

    fn names(terms: Vec<Term>) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_suffix_enumeration() {
        let mut trie = SuffixTrie::new(2);
        assert_eq!(trie.insert(&term("hello")), 4);
        assert_eq!(trie.dump(), vec!["ello", "hello", "llo", "lo"]);
    }

    #[test]
    fn test_shared_suffixes() {
        let mut trie = SuffixTrie::new(2);
        trie.insert(&term("world"));
        trie.insert(&term("bold"));
        assert_eq!(trie.dump(), vec!["bold", "ld", "old", "orld", "rld", "world"]);
        assert_eq!(names(trie.exact_search("ld")), vec!["bold", "world"]);
    }

    #[test]
    fn test_reinsert_is_noop_on_shape() {
        let mut trie = SuffixTrie::new(2);
        trie.insert(&term("hello"));
        let nodes = trie.node_count();
        assert_eq!(trie.insert(&term("hello")), 0);
        assert_eq!(trie.node_count(), nodes);
    }

    #[test]
    fn test_short_terms_not_stored() {
        let mut trie = SuffixTrie::new(2);
        assert_eq!(trie.insert(&term("a")), 0);
        assert!(trie.is_empty());
        assert_eq!(trie.node_count(), 1);
    }

    #[test]
    fn test_min_suffix_len_one() {
        let mut trie = SuffixTrie::new(1);
        trie.insert(&term("abc"));
        assert_eq!(trie.dump(), vec!["abc", "bc", "c"]);
    }

    #[test]
    fn test_mark_stale_keeps_nodes() {
        let mut trie = SuffixTrie::new(2);
        trie.insert(&term("hello"));
        let nodes = trie.node_count();

        assert_eq!(trie.mark_stale("hello"), 4);
        assert!(trie.dump().is_empty());
        assert_eq!(trie.node_count(), nodes);
        assert!(trie.stats().vacant_nodes > 0);
        assert!(!trie.contains_term("hello"));
    }

    #[test]
    fn test_mark_stale_unknown_term() {
        let mut trie = SuffixTrie::new(2);
        trie.insert(&term("hello"));
        assert_eq!(trie.mark_stale("world"), 0);
        assert_eq!(trie.dump().len(), 4);
    }

    #[test]
    fn test_prefix_search_serves_contains() {
        let mut trie = SuffixTrie::new(2);
        for t in ["world", "keyword", "doctorless", "anteriorly", "colorlessness", "floorless"] {
            trie.insert(&term(t));
        }
        assert_eq!(
            names(trie.prefix_search("orl")),
            vec!["anteriorly", "colorlessness", "doctorless", "floorless", "world"]
        );
        assert_eq!(names(trie.prefix_search("orld")), vec!["world"]);
        assert!(trie.prefix_search("xyz").is_empty());
    }

    #[test]
    fn test_exact_search_serves_suffix() {
        let mut trie = SuffixTrie::new(2);
        for t in ["world", "doctorless", "colorlessness", "floorless"] {
            trie.insert(&term(t));
        }
        assert_eq!(
            names(trie.exact_search("ess")),
            vec!["colorlessness", "doctorless", "floorless"]
        );
        assert_eq!(names(trie.exact_search("less")), vec!["doctorless", "floorless"]);
        assert!(trie.exact_search("orl").is_empty());
    }

    #[test]
    fn test_unicode_terms() {
        let mut trie = SuffixTrie::new(2);
        trie.insert(&term("größe"));
        assert_eq!(names(trie.exact_search("öße")), vec!["größe"]);
        assert_eq!(names(trie.prefix_search("rö")), vec!["größe"]);
    }

    #[test]
    fn test_visit_subtree_stops_on_break() {
        let mut trie = SuffixTrie::new(2);
        for t in ["aa", "ab", "ac"] {
            trie.insert(&term(t));
        }
        let mut seen = 0;
        let flow = trie.visit_subtree(NodeId::ROOT, |node| {
            seen += node.terminals().count();
            if seen >= 2 {
                ControlFlow::Break(seen)
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(flow, ControlFlow::Break(2));
    }

    #[test]
    fn test_release_invalidates_id() {
        let mut trie = SuffixTrie::new(2);
        trie.insert(&term("ab"));
        let id = trie.find("ab").unwrap();
        assert!(trie.release(id));
        assert!(trie.node(id).is_none());
        assert!(!trie.release(id));
        assert!(!trie.release(NodeId::ROOT));
    }
}
