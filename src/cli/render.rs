//! Plain-text renderings of a session for the terminal

use std::collections::HashMap;

use termtree::Tree;

use crate::application::Session;
use crate::domain::{Layout, Node, NodeId, NodeStatus, TreeState};

/// Converts a session's tree into a printable `termtree`.
pub trait TreeRender {
    fn to_term_tree(&self) -> Tree<String>;
}

impl TreeRender for Session {
    fn to_term_tree(&self) -> Tree<String> {
        let state = self.state();
        let Some(root) = state.root() else {
            return Tree::new("(empty tree)".to_string());
        };

        // post-order: every child is built before its parent picks it up
        let mut built: HashMap<NodeId, Tree<String>> = HashMap::new();
        for node in state.nodes().postorder(root) {
            let leaves: Vec<Tree<String>> = node
                .children
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();
            let status = self.display_status(node.id).unwrap_or(node.status);
            built.insert(node.id, Tree::new(node_line(node, status)).with_leaves(leaves));
        }
        built
            .remove(&root)
            .unwrap_or_else(|| Tree::new("(empty tree)".to_string()))
    }
}

fn node_line(node: &Node, status: NodeStatus) -> String {
    let mut line = node.label.clone();
    if node.is_leaf() {
        line.push_str(" [leaf]");
    }
    if status != NodeStatus::Active {
        line.push_str(&format!(" ({})", status));
    }
    if !node.sources.is_empty() {
        line.push_str(&format!(" [{} sources]", node.sources.len()));
    }
    line
}

/// `id  x  y  label` for every node with coordinates, in pre-order.
pub fn layout_lines(state: &TreeState, layout: &Layout) -> Vec<String> {
    let Some(root) = state.root() else {
        return Vec::new();
    };
    state
        .nodes()
        .preorder_visible(root)
        .filter_map(|node| {
            layout
                .get(node.id)
                .map(|p| format!("{}\t{:.1}\t{:.1}\t{}", node.id, p.x, p.y, node.label))
        })
        .collect()
}

/// Newest first: `#seq kind target-label`.
pub fn log_lines(state: &TreeState, limit: usize) -> Vec<String> {
    state
        .recent_log(limit)
        .map(|entry| {
            let target = entry
                .target
                .and_then(|t| state.node(t))
                .map(|n| n.label.as_str())
                .unwrap_or("-");
            format!("#{} {} {}", entry.seq, entry.kind, target)
        })
        .collect()
}

/// Top of every pruned subtree with its size.
pub fn pruned_lines(state: &TreeState) -> Vec<String> {
    state
        .pruned_roots()
        .into_iter()
        .filter_map(|id| {
            let path = state.context_path(id)?;
            let size = state.nodes().subtree(id).len();
            Some(format!("{} ({} nodes)", path, size))
        })
        .collect()
}
