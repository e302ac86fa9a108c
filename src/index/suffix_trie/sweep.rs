//! Reclamation of vacant trie nodes
//!
//! The sweep runs on a snapshot (a clone of the trie), so it never blocks
//! writers. Its output is a list of [`Removal`]s that are re-validated one by
//! one against the live trie when they are applied: anything that regained a
//! terminal or a child in the meantime survives.

use super::trie::SuffixTrie;
use super::types::*;

impl SuffixTrie {
    /// List every node whose whole subtree carries no terminal.
    ///
    /// Children are listed before their parents, so applying the list in
    /// order turns each parent into a leaf before it is examined.
    pub fn collect_prunable(&self) -> Vec<Removal> {
        // Pre-order: (node, parent, edge)
        let mut order: Vec<(NodeId, NodeId, char)> = Vec::new();
        let mut stack: Vec<NodeId> = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            for (ch, child) in node.children() {
                order.push((child, id, ch));
                stack.push(child);
            }
        }

        let mut prunable = vec![false; self.slot_capacity()];
        let mut removals = Vec::new();

        // Reverse pre-order visits every child before its parent
        for &(id, parent, edge) in order.iter().rev() {
            let Some(node) = self.node(id) else {
                continue;
            };
            let dead = !node.has_terminals()
                && node
                    .children()
                    .all(|(_, child)| prunable[child.index as usize]);
            if dead {
                prunable[id.index as usize] = true;
                removals.push(Removal {
                    parent,
                    edge,
                    node: id,
                });
            }
        }

        removals
    }

    /// Apply removals computed on a snapshot.
    ///
    /// A removal is applied only if the node is still vacant and its parent
    /// still reaches it through the same edge.
    pub fn apply_removals(&mut self, removals: &[Removal]) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for removal in removals {
            let vacant = self.node(removal.node).is_some_and(|n| n.is_vacant());
            let linked = self
                .node(removal.parent)
                .and_then(|p| p.child(removal.edge))
                == Some(removal.node);

            if !(vacant && linked) {
                outcome.survived += 1;
                continue;
            }

            if let Some(parent) = self.node_mut(removal.parent) {
                parent.children.remove(&removal.edge);
            }
            if self.release(removal.node) {
                outcome.removed += 1;
            }
        }

        outcome
    }
}
