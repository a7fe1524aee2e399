use generational_arena::Arena;
use tracing::instrument;

use crate::domain::node::{Node, NodeId, NodeStatus, NodeType};

/// Flat node storage for one knowledge tree.
///
/// All relationships are `NodeId`s into this arena, never references.
/// Nodes are only ever inserted, so slots and identifiers are never reused.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    arena: Arena<Node>,
}

/// Fields of a node that the arena does not assign itself.
#[derive(Debug, Clone)]
pub(crate) struct NewNode {
    pub label: String,
    pub summary: Option<String>,
    pub node_type: NodeType,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    /// Inserts a node below `parent` (or as a parentless node) and links it
    /// into the parent's child list. Depth is derived from the parent.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn insert(&mut self, new: NewNode, parent: Option<NodeId>) -> NodeId {
        let depth = parent
            .and_then(|p| self.get(p))
            .map(|p| p.depth + 1)
            .unwrap_or(0);
        let idx = self.arena.insert_with(|idx| Node {
            id: NodeId(idx),
            label: new.label,
            summary: new.summary,
            parent,
            children: Vec::new(),
            depth,
            node_type: new.node_type,
            status: NodeStatus::Active,
            sources: Vec::new(),
        });
        let id = NodeId(idx);

        if let Some(parent_id) = parent {
            if let Some(parent) = self.get_mut(parent_id) {
                parent.children.push(id);
            }
        }
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.arena.get_mut(id.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// All nodes in arena (insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.arena.iter().map(|(_, node)| node)
    }

    /// Children of `id` that are not pruned, in stored order.
    pub fn visible_children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id)
            .map(|node| {
                node.children
                    .iter()
                    .copied()
                    .filter(|&c| self.get(c).is_some_and(|c| !c.is_pruned()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Left-to-right pre-order walk starting at `root`.
    pub fn preorder(&self, root: NodeId) -> PreOrderIterator<'_> {
        PreOrderIterator::new(self, root, false)
    }

    /// Pre-order walk that neither yields nor descends into pruned nodes.
    pub fn preorder_visible(&self, root: NodeId) -> PreOrderIterator<'_> {
        PreOrderIterator::new(self, root, true)
    }

    /// Children-before-parent walk starting at `root`.
    pub fn postorder(&self, root: NodeId) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, root)
    }

    /// `id` and every descendant reachable through `children`.
    #[instrument(level = "trace", skip(self))]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        self.preorder(id).map(|node| node.id).collect()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(parent_id) = current {
            out.push(parent_id);
            current = self.get(parent_id).and_then(|n| n.parent);
        }
        out
    }
}

impl PartialEq for NodeArena {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for NodeArena {}

pub struct PreOrderIterator<'a> {
    arena: &'a NodeArena,
    stack: Vec<NodeId>,
    skip_pruned: bool,
}

impl<'a> PreOrderIterator<'a> {
    fn new(arena: &'a NodeArena, root: NodeId, skip_pruned: bool) -> Self {
        Self {
            arena,
            stack: vec![root],
            skip_pruned,
        }
    }
}

impl<'a> Iterator for PreOrderIterator<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            let Some(node) = self.arena.get(current) else {
                continue;
            };
            if self.skip_pruned && node.is_pruned() {
                continue;
            }
            // Push children in reverse order for left-to-right traversal
            for &child in node.children.iter().rev() {
                self.stack.push(child);
            }
            return Some(node);
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a NodeArena,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a NodeArena, root: NodeId) -> Self {
        Self {
            arena,
            stack: vec![(root, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get(current) {
                if !visited {
                    self.stack.push((current, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some(node);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(label: &str) -> NewNode {
        NewNode {
            label: label.to_string(),
            summary: None,
            node_type: NodeType::Branch,
        }
    }

    fn labels<'a>(it: impl Iterator<Item = &'a Node>) -> Vec<&'a str> {
        it.map(|n| n.label.as_str()).collect()
    }

    #[test]
    fn test_traversal_orders() {
        let mut arena = NodeArena::new();
        let root = arena.insert(branch("r"), None);
        let a = arena.insert(branch("a"), Some(root));
        arena.insert(branch("a1"), Some(a));
        arena.insert(branch("b"), Some(root));

        assert_eq!(labels(arena.preorder(root)), vec!["r", "a", "a1", "b"]);
        assert_eq!(labels(arena.postorder(root)), vec!["a1", "a", "b", "r"]);
        assert_eq!(arena.get(a).map(|n| n.depth), Some(1));
        assert_eq!(arena.subtree(a).len(), 2);
        assert_eq!(arena.ancestors(arena.get(a).unwrap().children[0]), vec![a, root]);
    }

    #[test]
    fn test_preorder_visible_stops_at_pruned() {
        let mut arena = NodeArena::new();
        let root = arena.insert(branch("r"), None);
        let a = arena.insert(branch("a"), Some(root));
        arena.insert(branch("a1"), Some(a));
        arena.get_mut(a).unwrap().status = NodeStatus::Pruned;

        assert_eq!(labels(arena.preorder_visible(root)), vec!["r"]);
        assert!(arena.visible_children(root).is_empty());
    }
}
