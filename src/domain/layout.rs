//! Tidy-tree layout
//!
//! Two passes over the visible part of the tree:
//! 1. width (children before parents): a node occupies the sum of its visible
//!    children's slots, and at least one slot
//! 2. position (parents before children): each child gets a share of its
//!    parent's horizontal band proportional to its slots and is centered in it
//!
//! Rows are a fixed distance apart, so equal depth means equal `y`.
//! Pruned subtrees get no coordinates at all.

use std::collections::{BTreeMap, HashMap};

use tracing::{instrument, trace};

use crate::domain::arena::NodeArena;
use crate::domain::node::NodeId;

pub const DEFAULT_ROW_SPACING: f64 = 100.0;
pub const DEFAULT_TOP_MARGIN: f64 = 60.0;
pub const DEFAULT_MIN_WIDTH: f64 = 900.0;
pub const DEFAULT_WIDTH_PER_NODE: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Coordinates keyed by node id, ordered by id for stable iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    positions: BTreeMap<NodeId, Point>,
}

impl Layout {
    pub fn get(&self, id: NodeId) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Point)> + '_ {
        self.positions.iter().map(|(&id, &p)| (id, p))
    }

    /// Parent/child pairs where both ends have coordinates.
    pub fn edges(&self, nodes: &NodeArena) -> Vec<(NodeId, NodeId)> {
        self.positions
            .keys()
            .filter_map(|&id| nodes.get(id))
            .flat_map(|node| node.children.iter().map(move |&c| (node.id, c)))
            .filter(|(_, child)| self.contains(*child))
            .collect()
    }
}

/// Vertical spacing parameters of the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEngine {
    pub row_spacing: f64,
    pub top_margin: f64,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            row_spacing: DEFAULT_ROW_SPACING,
            top_margin: DEFAULT_TOP_MARGIN,
        }
    }
}

impl LayoutEngine {
    pub fn new(row_spacing: f64, top_margin: f64) -> Self {
        Self {
            row_spacing,
            top_margin,
        }
    }

    /// Computes coordinates for every visible node below `root`.
    ///
    /// Deterministic: identical input yields identical output. The root is
    /// always centered in `width`.
    #[instrument(level = "debug", skip(self, nodes))]
    pub fn compute(&self, nodes: &NodeArena, root: Option<NodeId>, width: f64) -> Layout {
        let mut layout = Layout::default();
        let Some(root) = root else {
            return layout;
        };
        if nodes.get(root).map_or(true, |r| r.is_pruned()) {
            return layout;
        }

        let mut slots: HashMap<NodeId, u64> = HashMap::new();
        for node in nodes.postorder(root) {
            if node.is_pruned() {
                continue;
            }
            let sum: u64 = nodes
                .visible_children(node.id)
                .iter()
                .map(|c| slots.get(c).copied().unwrap_or(1))
                .sum();
            slots.insert(node.id, sum.max(1));
        }

        // (left edge, span) of each node's band
        let mut bands: HashMap<NodeId, (f64, f64)> = HashMap::new();
        bands.insert(root, (0.0, width));
        for node in nodes.preorder_visible(root) {
            let (left, span) = bands.get(&node.id).copied().unwrap_or((0.0, width));
            let point = Point {
                x: left + span / 2.0,
                y: self.top_margin + node.depth as f64 * self.row_spacing,
            };
            trace!("{} at ({:.1}, {:.1})", node.id, point.x, point.y);
            layout.positions.insert(node.id, point);

            let total = slots.get(&node.id).copied().unwrap_or(1) as f64;
            let mut cursor = left;
            for child in nodes.visible_children(node.id) {
                let share = span * slots.get(&child).copied().unwrap_or(1) as f64 / total;
                bands.insert(child, (cursor, share));
                cursor += share;
            }
        }
        layout
    }
}

/// Layout with default spacing.
pub fn compute_layout(nodes: &NodeArena, root: Option<NodeId>, width: f64) -> Layout {
    LayoutEngine::default().compute(nodes, root, width)
}

/// Canvas width that gives every visible node room: `max(min_width, count * per_node)`.
pub fn fit_width(visible_count: usize, min_width: f64, width_per_node: f64) -> f64 {
    min_width.max(visible_count as f64 * width_per_node)
}
