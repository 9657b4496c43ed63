//! Arena-backed schedule tree
//!
//! Nodes live in a single `Vec` and refer to each other by index. Each node
//! owns its event and the ordered ids of its children; the parent id is a
//! back-reference used only to walk from a leaf to the root.

use crate::{Event, TreeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside an [`EventTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A tree element: one event plus its place in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub event: Event,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Schedule tree rooted at a synthetic root event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTree {
    nodes: Vec<Node>,
}

impl Default for EventTree {
    fn default() -> Self {
        Self::new()
    }
}

impl EventTree {
    pub const ROOT: NodeId = NodeId(0);

    /// A tree holding only the synthetic root.
    pub fn new() -> Self {
        Self::with_root(Event::root())
    }

    pub fn with_root(root: Event) -> Self {
        Self {
            nodes: vec![Node {
                event: root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root is created with the tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn event(&self, id: NodeId) -> Option<&Event> {
        self.nodes.get(id.0).map(|n| &n.event)
    }

    pub fn event_mut(&mut self, id: NodeId) -> Option<&mut Event> {
        self.nodes.get_mut(id.0).map(|n| &mut n.event)
    }

    /// Children of `id` in attach order; empty for an unknown id.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Whether new children may be attached below `id`.
    pub fn can_descend(&self, id: NodeId) -> bool {
        self.event(id).map(Event::descend).unwrap_or(false)
    }

    /// Attach `event` as the last child of `parent`.
    pub fn attach(&mut self, parent: NodeId, event: Event) -> Result<NodeId, TreeError> {
        let parent_event = self
            .event(parent)
            .ok_or(TreeError::UnknownNode { node: parent })?;
        if !parent_event.descend() {
            return Err(TreeError::CannotDescend {
                node: parent,
                label: parent_event.label().to_string(),
            });
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            event,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// All node ids in depth-first pre-order, children in attach order.
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    /// Ids from the root down to `id`, both included.
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = self.contains(id).then_some(id);
        while let Some(current) = cursor {
            path.push(current);
            cursor = self.parent(current);
        }
        path.reverse();
        path
    }

    /// Indented dump of the tree, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(Self::ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            if let Some(event) = self.event(id) {
                out.push_str(&"  ".repeat(depth));
                out.push_str(&event.to_string());
                out.push('\n');
            }
            stack.extend(self.children(id).iter().rev().map(|c| (*c, depth + 1)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (EventTree, NodeId, NodeId, NodeId) {
        let mut tree = EventTree::new();
        let a = tree.attach(tree.root(), Event::named("A")).unwrap();
        let b = tree.attach(a, Event::named("B")).unwrap();
        let c = tree.attach(a, Event::named("C")).unwrap();
        (tree, a, b, c)
    }

    #[test]
    fn test_new_tree_has_root_only() {
        let tree = EventTree::new();
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
        assert_eq!(tree.event(tree.root()).unwrap().label(), "root");
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn test_attach_links_parent_and_child() {
        let (tree, a, b, c) = sample();
        assert_eq!(tree.children(a), &[b, c]);
        assert_eq!(tree.parent(b), Some(a));
        assert_eq!(tree.parent(a), Some(EventTree::ROOT));
        assert_eq!(tree.parent(EventTree::ROOT), None);
    }

    #[test]
    fn test_attach_below_catch_end_fails() {
        let mut tree = EventTree::new();
        let catch = tree.attach(tree.root(), Event::catch_end()).unwrap();
        let err = tree.attach(catch, Event::named("X")).unwrap_err();
        assert!(matches!(err, TreeError::CannotDescend { node, .. } if node == catch));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_attach_to_unknown_node_fails() {
        let mut tree = EventTree::new();
        let err = tree.attach(NodeId::new(42), Event::named("X")).unwrap_err();
        assert_eq!(err, TreeError::UnknownNode { node: NodeId::new(42) });
    }

    #[test]
    fn test_depth_first_order() {
        let (mut tree, a, b, c) = sample();
        let d = tree.attach(b, Event::named("D")).unwrap();
        assert_eq!(tree.depth_first(), vec![EventTree::ROOT, a, b, d, c]);
    }

    #[test]
    fn test_path_from_root() {
        let (tree, a, _, c) = sample();
        assert_eq!(tree.path_from_root(c), vec![EventTree::ROOT, a, c]);
        assert!(tree.path_from_root(NodeId::new(99)).is_empty());
    }

    #[test]
    fn test_render_indents_children() {
        let (tree, ..) = sample();
        let rendered = tree.render();
        assert_eq!(rendered, "1*root=0\n  A=1\n    B=1\n    C=1\n");
    }
}
