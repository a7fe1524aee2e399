//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::node::NodeId;

/// Why the state machine treated an action as a no-op.
///
/// These never abort anything: the state is returned unchanged and the
/// reason is handed to the caller as a signal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("node is pruned: {0}")]
    PrunedNode(NodeId),

    #[error("node has a pruned ancestor: {0}")]
    PrunedAncestor(NodeId),

    #[error("tree already initialized")]
    AlreadyInitialized,

    #[error("tree not initialized")]
    NotInitialized,

    #[error("root cannot be pruned")]
    RootNotPrunable,

    #[error("growth without new children: {0}")]
    EmptyGrowth(NodeId),

    #[error("nothing to change for node: {0}")]
    Unchanged(NodeId),

    #[error("selection unchanged")]
    SelectionUnchanged,
}

/// A broken structural invariant, reported by `TreeState::check_invariants`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("expected exactly one parentless node, found {0}")]
    RootCount(usize),

    #[error("parentless node {0} is not the recorded root")]
    RootMismatch(NodeId),

    #[error("child {child} of {parent} does not exist")]
    DanglingChild { parent: NodeId, child: NodeId },

    #[error("child {child} does not point back to {parent}")]
    BrokenBackReference { parent: NodeId, child: NodeId },

    #[error("duplicate child {child} under {parent}")]
    DuplicateChild { parent: NodeId, child: NodeId },

    #[error("depth of {0} is not parent depth + 1")]
    Depth(NodeId),

    #[error("node {0} is not pruned but has a pruned ancestor")]
    ActiveUnderPruned(NodeId),

    #[error("node {0} is unreachable from the root")]
    Unreachable(NodeId),

    #[error("node {0} has an inconsistent type")]
    NodeType(NodeId),
}
