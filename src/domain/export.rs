//! Markdown export of the visible tree

use tracing::instrument;

use crate::domain::arena::NodeArena;
use crate::domain::node::{Node, NodeId};

/// Renders the tree below `root` as markdown.
///
/// Pre-order, children in stored order. A pruned node is a barrier: neither it
/// nor anything below it is emitted. Each node becomes a heading of level
/// `depth + 1`, then its summary paragraph, then one link bullet per source.
/// Returns an empty string when there is no root.
#[instrument(level = "debug", skip(nodes))]
pub fn export_to_markdown(nodes: &NodeArena, root: Option<NodeId>) -> String {
    let Some(root) = root else {
        return String::new();
    };

    let mut out = String::new();
    for node in nodes.preorder_visible(root) {
        push_block(&mut out, node);
    }

    while out.ends_with('\n') {
        out.pop();
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn push_block(out: &mut String, node: &Node) {
    out.push_str(&"#".repeat(node.depth + 1));
    out.push(' ');
    out.push_str(&node.label);
    out.push_str("\n\n");

    if let Some(summary) = node.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str(summary.trim());
        out.push_str("\n\n");
    }

    if !node.sources.is_empty() {
        for source in &node.sources {
            out.push_str(&format!("- [{}]({})\n", source.title, source.url));
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arena::NewNode;
    use crate::domain::node::{NodeStatus, NodeType, Source};

    fn new_node(label: &str, node_type: NodeType) -> NewNode {
        NewNode {
            label: label.to_string(),
            summary: None,
            node_type,
        }
    }

    #[test]
    fn test_pruned_node_is_a_barrier_even_for_active_descendants() {
        let mut arena = NodeArena::new();
        let root = arena.insert(new_node("X", NodeType::Root), None);
        let a = arena.insert(new_node("A", NodeType::Branch), Some(root));
        arena.insert(new_node("A1", NodeType::Leaf), Some(a));
        arena.get_mut(a).unwrap().status = NodeStatus::Pruned;

        let md = export_to_markdown(&arena, Some(root));

        assert_eq!(md, "# X\n");
    }

    #[test]
    fn test_block_layout() {
        let mut arena = NodeArena::new();
        let root = arena.insert(new_node("X", NodeType::Root), None);
        let a = arena.insert(new_node("A", NodeType::Branch), Some(root));
        let node = arena.get_mut(a).unwrap();
        node.summary = Some("About A".into());
        node.sources.push(Source::new("Ref", "http://r"));

        let md = export_to_markdown(&arena, Some(root));

        assert_eq!(md, "# X\n\n## A\n\nAbout A\n\n- [Ref](http://r)\n");
    }

    #[test]
    fn test_trailing_spaces_of_last_label_are_kept() {
        let mut arena = NodeArena::new();
        let root = arena.insert(new_node("X", NodeType::Root), None);
        arena.insert(new_node("A  ", NodeType::Leaf), Some(root));

        let md = export_to_markdown(&arena, Some(root));

        assert_eq!(md, "# X\n\n## A  \n");
    }

    #[test]
    fn test_no_root_yields_empty_document() {
        assert_eq!(export_to_markdown(&NodeArena::new(), None), "");
    }
}
