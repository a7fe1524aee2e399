//! Single-writer session around one tree
//!
//! Owns the authoritative `TreeState` and serialises every dispatch against
//! it. Gateway calls happen here, before an action exists; in-flight markers
//! live next to the state, never inside it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::gateway::{GatewayError, Generator, Searcher};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Action, ChildSpec, DomainError, NodeId, NodeStatus, Outcome, Source, TreeState};

/// Outstanding gateway call for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Growing,
    Searching,
}

/// A gateway call the caller is about to make for `node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub node: NodeId,
    /// Topic or query handed to the gateway
    pub subject: String,
    /// Label path used as generation context
    pub context: Option<String>,
    /// Revision the request was issued against
    pub revision: u64,
}

pub struct Session {
    state: TreeState,
    generator: Arc<dyn Generator>,
    searcher: Arc<dyn Searcher>,
    pending: HashMap<NodeId, Pending>,
}

impl Session {
    pub fn new(generator: Arc<dyn Generator>, searcher: Arc<dyn Searcher>) -> Self {
        Self {
            state: TreeState::new(),
            generator,
            searcher,
            pending: HashMap::new(),
        }
    }

    pub fn state(&self) -> &TreeState {
        &self.state
    }

    pub fn into_state(self) -> TreeState {
        self.state
    }

    /// Creates the tree from `topic` and its generated subtopics.
    #[instrument(level = "debug", skip(self))]
    pub fn plant(&mut self, topic: &str) -> ApplicationResult<Outcome> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ApplicationError::EmptyTopic);
        }
        if self.state.is_initialized() {
            return Ok(Outcome::Ignored(DomainError::AlreadyInitialized));
        }
        let children = self
            .generator
            .generate(topic, None)
            .map_err(|source| gateway_err(topic, source))?;
        info!("planting '{}' with {} subtopics", topic, children.len());
        Ok(self.dispatch(Action::InitTree {
            topic: topic.to_string(),
            children,
        }))
    }

    /// Generates subtopics for `node` and grows it.
    #[instrument(level = "debug", skip(self))]
    pub fn grow(&mut self, node: NodeId) -> ApplicationResult<Outcome> {
        let request = match self.begin(node, Pending::Growing) {
            Ok(request) => request,
            Err(reason) => return Ok(Outcome::Ignored(reason)),
        };
        let result = self
            .generator
            .generate(&request.subject, request.context.as_deref());
        self.finish_grow(&request, result)
    }

    /// Searches reference material for `node` and attaches it.
    #[instrument(level = "debug", skip(self))]
    pub fn search(&mut self, node: NodeId) -> ApplicationResult<Outcome> {
        let request = match self.begin(node, Pending::Searching) {
            Ok(request) => request,
            Err(reason) => return Ok(Outcome::Ignored(reason)),
        };
        let result = self.searcher.search(&request.subject);
        self.finish_search(&request, result)
    }

    /// Marks `node` as having an outstanding gateway call and describes it.
    ///
    /// Fails before planting, for unknown nodes, and for pruned nodes when growing.
    pub fn begin(&mut self, node: NodeId, kind: Pending) -> Result<Request, DomainError> {
        if !self.state.is_initialized() {
            return Err(DomainError::NotInitialized);
        }
        let target = self.state.node(node).ok_or(DomainError::UnknownNode(node))?;
        if kind == Pending::Growing && target.is_pruned() {
            return Err(DomainError::PrunedNode(node));
        }
        let request = Request {
            node,
            subject: target.label.clone(),
            context: match kind {
                Pending::Growing => self.state.context_path(node),
                Pending::Searching => None,
            },
            revision: self.state.revision(),
        };
        self.pending.insert(node, kind);
        debug!("{:?} {} ({})", kind, node, request.subject);
        Ok(request)
    }

    /// Clears the growth marker and dispatches on success.
    ///
    /// A late result for a node pruned in the meantime is ignored by the core.
    pub fn finish_grow(
        &mut self,
        request: &Request,
        result: Result<Vec<ChildSpec>, GatewayError>,
    ) -> ApplicationResult<Outcome> {
        self.pending.remove(&request.node);
        let children = result.map_err(|source| gateway_err(&request.subject, source))?;
        Ok(self.dispatch(Action::GrowNode {
            node: request.node,
            children,
        }))
    }

    /// Clears the search marker and dispatches on success.
    pub fn finish_search(
        &mut self,
        request: &Request,
        result: Result<Vec<Source>, GatewayError>,
    ) -> ApplicationResult<Outcome> {
        self.pending.remove(&request.node);
        let sources = result.map_err(|source| gateway_err(&request.subject, source))?;
        Ok(self.dispatch(Action::AddSources {
            node: request.node,
            sources,
        }))
    }

    pub fn prune(&mut self, node: NodeId) -> Outcome {
        self.dispatch(Action::PruneNode(node))
    }

    pub fn restore(&mut self, node: NodeId) -> Outcome {
        self.dispatch(Action::RestoreNode(node))
    }

    pub fn select(&mut self, node: Option<NodeId>) -> Outcome {
        self.dispatch(Action::SelectNode(node))
    }

    /// Dispatches `action` only if nothing was applied since `base_revision`.
    pub fn commit(&mut self, base_revision: u64, action: Action) -> ApplicationResult<Outcome> {
        let actual = self.state.revision();
        if actual != base_revision {
            return Err(ApplicationError::Stale {
                expected: base_revision,
                actual,
            });
        }
        Ok(self.dispatch(action))
    }

    pub fn pending(&self, node: NodeId) -> Option<Pending> {
        self.pending.get(&node).copied()
    }

    /// Status as a renderer should show it: `growing` while a growth
    /// request for a non-pruned node is outstanding.
    pub fn display_status(&self, node: NodeId) -> Option<NodeStatus> {
        let status = self.state.node(node)?.status;
        match (status, self.pending(node)) {
            (NodeStatus::Active, Some(Pending::Growing)) => Some(NodeStatus::Growing),
            _ => Some(status),
        }
    }

    fn dispatch(&mut self, action: Action) -> Outcome {
        let outcome = self.state.dispatch(action);
        if let Outcome::Ignored(reason) = &outcome {
            debug!("action ignored: {}", reason);
        }
        outcome
    }
}

fn gateway_err(subject: &str, source: GatewayError) -> ApplicationError {
    ApplicationError::Gateway {
        subject: subject.to_string(),
        source,
    }
}
