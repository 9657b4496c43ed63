//! Leaf enumeration
//!
//! A leaf is a node without children or a catch-end marker. Each leaf
//! closes one sequence: the events on its path from the root, the product
//! of their proportions and the sum of their durations.

use trialtree_core::{EventTree, NodeId, Sequence};

/// Terminal nodes in depth-first source order. The root is never a leaf.
pub fn find_leaves(tree: &EventTree) -> Vec<NodeId> {
    tree.depth_first()
        .into_iter()
        .filter(|&id| id != EventTree::ROOT)
        .filter(|&id| {
            tree.node(id)
                .map(|node| node.is_leaf() || node.event.is_catch_end())
                .unwrap_or(false)
        })
        .collect()
}

/// The sequence that `leaf` closes, synthetic root excluded.
pub fn sequence_for(tree: &EventTree, leaf: NodeId) -> Sequence {
    let mut sequence = Sequence {
        events: Vec::new(),
        proportion: 1.0,
        duration: 0.0,
    };
    for id in tree.path_from_root(leaf).into_iter().skip(1) {
        if let Some(event) = tree.event(id) {
            sequence.proportion *= event.proportion_or_one();
            sequence.duration += event.duration;
            sequence.events.push(event.clone());
        }
    }
    sequence
}

/// All sequences of `tree`, one per leaf.
pub fn enumerate(tree: &EventTree) -> Vec<Sequence> {
    let sequences: Vec<Sequence> = find_leaves(tree)
        .into_iter()
        .map(|leaf| sequence_for(tree, leaf))
        .collect();
    tracing::debug!(sequences = sequences.len(), "Enumerated leaves");
    sequences
}
