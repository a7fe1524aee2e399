//! Domain layer: node model, tree state machine, layout and export
//!
//! This layer is pure: no I/O, no clock, no gateway calls.

pub mod arena;
pub mod error;
pub mod export;
pub mod layout;
pub mod node;
pub mod tree;

pub use arena::NodeArena;
pub use error::{DomainError, InvariantViolation};
pub use export::export_to_markdown;
pub use layout::{compute_layout, fit_width, Layout, LayoutEngine, Point};
pub use node::{ChildSpec, Node, NodeId, NodeStatus, NodeType, Source};
pub use tree::{Action, LogEntry, LogKind, Outcome, TreeState, PATH_SEPARATOR};
