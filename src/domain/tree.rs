//! Tree state machine
//!
//! `TreeState::apply` is the only mutation entry point: given a state and an
//! action it returns the next state. Malformed or stale actions (unknown id,
//! pruned target, re-initialisation, pruning the root) are no-ops and come
//! back as `Outcome::Ignored` with the reason, so retries and replays are safe.

use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;
use tracing::{debug, instrument, trace};

use crate::domain::arena::{NewNode, NodeArena};
use crate::domain::error::{DomainError, InvariantViolation};
use crate::domain::export::export_to_markdown;
use crate::domain::layout::{compute_layout, Layout};
use crate::domain::node::{ChildSpec, Node, NodeId, NodeStatus, NodeType, Source};

/// Separator between labels of a context path.
pub const PATH_SEPARATOR: &str = " > ";

/// A requested mutation, carrying any gateway results it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    InitTree {
        topic: String,
        children: Vec<ChildSpec>,
    },
    GrowNode {
        node: NodeId,
        children: Vec<ChildSpec>,
    },
    AddSources {
        node: NodeId,
        sources: Vec<Source>,
    },
    PruneNode(NodeId),
    RestoreNode(NodeId),
    SelectNode(Option<NodeId>),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::InitTree { .. } => "INIT_TREE",
            Action::GrowNode { .. } => "GROW_NODE",
            Action::AddSources { .. } => "ADD_SOURCES",
            Action::PruneNode(_) => "PRUNE_NODE",
            Action::RestoreNode(_) => "RESTORE_NODE",
            Action::SelectNode(_) => "SELECT_NODE",
        }
    }
}

/// Kind of an accepted mutation, as recorded in the action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Init,
    Grow,
    Search,
    Prune,
    Restore,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogKind::Init => "init",
            LogKind::Grow => "grow",
            LogKind::Search => "search",
            LogKind::Prune => "prune",
            LogKind::Restore => "restore",
        };
        f.write_str(s)
    }
}

/// Entry of the append-only action log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// 1-based position in the log
    pub seq: u64,
    pub kind: LogKind,
    pub target: Option<NodeId>,
}

/// Result of dispatching one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored(DomainError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }

    pub fn reason(&self) -> Option<&DomainError> {
        match self {
            Outcome::Applied => None,
            Outcome::Ignored(e) => Some(e),
        }
    }
}

/// What an accepted action leaves behind in the log.
type Accepted = Option<(LogKind, Option<NodeId>)>;

/// Complete state of one knowledge tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeState {
    nodes: NodeArena,
    root: Option<NodeId>,
    selected: Option<NodeId>,
    log: Vec<LogEntry>,
    revision: u64,
}

impl TreeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure transition: the next state and whether the action took effect.
    pub fn apply(&self, action: Action) -> (TreeState, Outcome) {
        let mut next = self.clone();
        let outcome = next.dispatch(action);
        (next, outcome)
    }

    /// In-place transition for a single writer holding the authoritative state.
    #[instrument(level = "debug", skip(self, action), fields(action = action.name()))]
    pub fn dispatch(&mut self, action: Action) -> Outcome {
        let result = match action {
            Action::InitTree { topic, children } => self.init_tree(topic, children),
            Action::GrowNode { node, children } => self.grow_node(node, children),
            Action::AddSources { node, sources } => self.add_sources(node, sources),
            Action::PruneNode(node) => self.prune_node(node),
            Action::RestoreNode(node) => self.restore_node(node),
            Action::SelectNode(node) => self.select_node(node),
        };

        match result {
            Ok(accepted) => {
                if let Some((kind, target)) = accepted {
                    let seq = self.log.len() as u64 + 1;
                    self.log.push(LogEntry { seq, kind, target });
                }
                self.revision += 1;
                Outcome::Applied
            }
            Err(reason) => {
                debug!("ignored: {}", reason);
                Outcome::Ignored(reason)
            }
        }
    }

    fn init_tree(&mut self, topic: String, children: Vec<ChildSpec>) -> Result<Accepted, DomainError> {
        if self.root.is_some() {
            return Err(DomainError::AlreadyInitialized);
        }
        let root = self.nodes.insert(
            NewNode {
                label: topic,
                summary: None,
                node_type: NodeType::Root,
            },
            None,
        );
        self.root = Some(root);
        self.insert_children(root, children);
        debug!("planted {} with {} children", root, self.nodes.len() - 1);
        Ok(Some((LogKind::Init, Some(root))))
    }

    fn grow_node(&mut self, id: NodeId, children: Vec<ChildSpec>) -> Result<Accepted, DomainError> {
        let node = self.nodes.get(id).ok_or(DomainError::UnknownNode(id))?;
        if node.is_pruned() {
            return Err(DomainError::PrunedNode(id));
        }
        if children.is_empty() {
            return Err(DomainError::EmptyGrowth(id));
        }

        let added = children.len();
        self.insert_children(id, children);
        if let Some(node) = self.nodes.get_mut(id) {
            // never demoted, only promoted
            if node.node_type == NodeType::Leaf {
                node.node_type = NodeType::Branch;
            }
        }
        debug!("grew {} by {} children", id, added);
        Ok(Some((LogKind::Grow, Some(id))))
    }

    fn add_sources(&mut self, id: NodeId, sources: Vec<Source>) -> Result<Accepted, DomainError> {
        let node = self.nodes.get_mut(id).ok_or(DomainError::UnknownNode(id))?;
        trace!("attaching {} sources to {}", sources.len(), id);
        node.sources.extend(sources);
        Ok(Some((LogKind::Search, Some(id))))
    }

    fn prune_node(&mut self, id: NodeId) -> Result<Accepted, DomainError> {
        let node = self.nodes.get(id).ok_or(DomainError::UnknownNode(id))?;
        if node.is_root() || node.parent.is_none() {
            return Err(DomainError::RootNotPrunable);
        }
        if !self.set_subtree_status(id, NodeStatus::Pruned) {
            return Err(DomainError::Unchanged(id));
        }
        Ok(Some((LogKind::Prune, Some(id))))
    }

    fn restore_node(&mut self, id: NodeId) -> Result<Accepted, DomainError> {
        if !self.nodes.contains(id) {
            return Err(DomainError::UnknownNode(id));
        }
        let ancestor_pruned = self
            .nodes
            .ancestors(id)
            .into_iter()
            .any(|a| self.nodes.get(a).is_some_and(Node::is_pruned));
        if ancestor_pruned {
            return Err(DomainError::PrunedAncestor(id));
        }
        if !self.set_subtree_status(id, NodeStatus::Active) {
            return Err(DomainError::Unchanged(id));
        }
        Ok(Some((LogKind::Restore, Some(id))))
    }

    fn select_node(&mut self, id: Option<NodeId>) -> Result<Accepted, DomainError> {
        if let Some(id) = id {
            if !self.nodes.contains(id) {
                return Err(DomainError::UnknownNode(id));
            }
        }
        if self.selected == id {
            return Err(DomainError::SelectionUnchanged);
        }
        self.selected = id;
        Ok(None)
    }

    fn insert_children(&mut self, parent: NodeId, children: Vec<ChildSpec>) {
        for spec in children {
            let node_type = spec.node_type();
            self.nodes.insert(
                NewNode {
                    label: spec.label,
                    summary: spec.summary,
                    node_type,
                },
                Some(parent),
            );
        }
    }

    /// Sets `status` on `id` and every descendant. Returns whether anything changed.
    fn set_subtree_status(&mut self, id: NodeId, status: NodeStatus) -> bool {
        let mut changed = false;
        for member in self.nodes.subtree(id) {
            if let Some(node) = self.nodes.get_mut(member) {
                if node.status != status {
                    node.status = status;
                    changed = true;
                }
            }
        }
        changed
    }

    // ------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------

    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.root.and_then(|r| self.nodes.get(r))
    }

    pub fn is_initialized(&self) -> bool {
        self.root.is_some()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected.and_then(|s| self.nodes.get(s))
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Newest entries first, at most `limit`.
    pub fn recent_log(&self, limit: usize) -> impl Iterator<Item = &LogEntry> {
        self.log.iter().rev().take(limit)
    }

    /// Number of applied actions, selections included.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Nodes that are not pruned.
    pub fn visible_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_pruned()).count()
    }

    /// Pruned nodes whose parent is not pruned: the tops of pruned subtrees.
    pub fn pruned_roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.is_pruned())
            .filter(|n| {
                n.parent
                    .and_then(|p| self.nodes.get(p))
                    .is_some_and(|p| !p.is_pruned())
            })
            .map(|n| n.id)
            .collect()
    }

    /// Labels from the root down to `id`, joined with ` > `.
    pub fn context_path(&self, id: NodeId) -> Option<String> {
        let node = self.nodes.get(id)?;
        let mut labels: Vec<&str> = self
            .nodes
            .ancestors(id)
            .into_iter()
            .filter_map(|a| self.nodes.get(a).map(|n| n.label.as_str()))
            .collect();
        labels.reverse();
        labels.push(node.label.as_str());
        Some(labels.into_iter().join(PATH_SEPARATOR))
    }

    /// Resolves a label path starting at the root label. The first child
    /// with a matching label is taken at every level.
    pub fn find_by_path<S: AsRef<str>>(&self, labels: &[S]) -> Option<NodeId> {
        let (first, rest) = labels.split_first()?;
        let root = self.root_node()?;
        if root.label != first.as_ref() {
            return None;
        }
        let mut current = root;
        for label in rest {
            current = current
                .children
                .iter()
                .filter_map(|&c| self.nodes.get(c))
                .find(|c| c.label == label.as_ref())?;
        }
        Some(current.id)
    }

    /// Coordinates for every visible node, see [`compute_layout`].
    pub fn layout(&self, width: f64) -> Layout {
        compute_layout(&self.nodes, self.root, width)
    }

    /// Markdown document of the visible tree, see [`export_to_markdown`].
    pub fn to_markdown(&self) -> String {
        export_to_markdown(&self.nodes, self.root)
    }

    /// Verifies the structural invariants, returning the first violation.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let parentless: Vec<&Node> = self.nodes.iter().filter(|n| n.parent.is_none()).collect();
        let Some(root) = self.root else {
            return match parentless.len() {
                0 => Ok(()),
                n => Err(InvariantViolation::RootCount(n)),
            };
        };
        if parentless.len() != 1 {
            return Err(InvariantViolation::RootCount(parentless.len()));
        }
        if parentless[0].id != root {
            return Err(InvariantViolation::RootMismatch(parentless[0].id));
        }

        for node in self.nodes.iter() {
            if node.parent.is_none() != node.is_root() || (node.is_leaf() && !node.children.is_empty()) {
                return Err(InvariantViolation::NodeType(node.id));
            }
            if node.is_root() && node.depth != 0 {
                return Err(InvariantViolation::Depth(node.id));
            }
            let mut seen = HashSet::new();
            for &child_id in &node.children {
                if !seen.insert(child_id) {
                    return Err(InvariantViolation::DuplicateChild {
                        parent: node.id,
                        child: child_id,
                    });
                }
                let child = self.nodes.get(child_id).ok_or(InvariantViolation::DanglingChild {
                    parent: node.id,
                    child: child_id,
                })?;
                if child.parent != Some(node.id) {
                    return Err(InvariantViolation::BrokenBackReference {
                        parent: node.id,
                        child: child_id,
                    });
                }
                if child.depth != node.depth + 1 {
                    return Err(InvariantViolation::Depth(child_id));
                }
            }
        }

        // reachability and hierarchical pruning; visited set stops on cycles
        let mut visited = HashSet::new();
        let mut stack = vec![(root, false)];
        while let Some((id, under_pruned)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if under_pruned && !node.is_pruned() {
                return Err(InvariantViolation::ActiveUnderPruned(id));
            }
            for &child in &node.children {
                stack.push((child, under_pruned || node.is_pruned()));
            }
        }
        if let Some(orphan) = self.nodes.iter().find(|n| !visited.contains(&n.id)) {
            return Err(InvariantViolation::Unreachable(orphan.id));
        }
        Ok(())
    }
}
