//! Node model: the atomic unit of a knowledge tree

use std::fmt;

use generational_arena::Index;
use serde::{Deserialize, Serialize};

/// Opaque node identifier, stable for the node's lifetime.
///
/// Wraps the arena slot index. Nodes are never removed from the arena,
/// so an identifier is never handed out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, _generation) = self.0.into_raw_parts();
        write!(f, "n{}", slot)
    }
}

/// Structural role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// The unique node without a parent
    Root,
    /// Has children or may still grow
    Branch,
    /// Marked terminal by the generator; no further growth expected
    Leaf,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeType::Root => "root",
            NodeType::Branch => "branch",
            NodeType::Leaf => "leaf",
        };
        f.write_str(s)
    }
}

/// Lifecycle status of a node.
///
/// `Growing` is a caller-side marker; the state machine never sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Active,
    Growing,
    Pruned,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Active => "active",
            NodeStatus::Growing => "growing",
            NodeStatus::Pruned => "pruned",
        };
        f.write_str(s)
    }
}

/// Reference material attached to a node by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

impl Source {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// One subtopic proposed by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSpec {
    pub label: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, alias = "terminal")]
    pub is_terminal: bool,
}

impl ChildSpec {
    /// A non-terminal subtopic without summary.
    pub fn branch(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            summary: None,
            is_terminal: false,
        }
    }

    /// A terminal subtopic, created as `leaf`.
    pub fn terminal(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            summary: None,
            is_terminal: true,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub(crate) fn node_type(&self) -> NodeType {
        if self.is_terminal {
            NodeType::Leaf
        } else {
            NodeType::Branch
        }
    }
}

/// Tree node. Relationships are identifiers into the owning arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub summary: Option<String>,
    /// None for the root
    pub parent: Option<NodeId>,
    /// Display/generation order, no duplicates
    pub children: Vec<NodeId>,
    /// Root is 0, otherwise parent depth + 1
    pub depth: usize,
    pub node_type: NodeType,
    pub status: NodeStatus,
    /// Append-only
    pub sources: Vec<Source>,
}

impl Node {
    pub fn is_pruned(&self) -> bool {
        self.status == NodeStatus::Pruned
    }

    pub fn is_active(&self) -> bool {
        self.status == NodeStatus::Active
    }

    pub fn is_root(&self) -> bool {
        self.node_type == NodeType::Root
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type == NodeType::Leaf
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}
