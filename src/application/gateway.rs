//! Content and search gateway boundary
//!
//! The tree core never calls these. The session calls them first and turns a
//! successful result into an action; a failure produces no action at all.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{ChildSpec, Source};

/// Failure of an external generation or search call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("no result for '{0}'")]
    NoResult(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Proposes subtopics for a topic.
pub trait Generator: Send + Sync {
    /// `context` is the label path from the root to the topic, e.g. `X > A`.
    fn generate(&self, topic: &str, context: Option<&str>) -> Result<Vec<ChildSpec>, GatewayError>;
}

/// Finds reference material for a query.
pub trait Searcher: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<Source>, GatewayError>;
}

/// Tries searchers in order and returns the first success.
#[derive(Clone, Default)]
pub struct SearchChain {
    searchers: Vec<Arc<dyn Searcher>>,
}

impl SearchChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, searcher: Arc<dyn Searcher>) -> Self {
        self.searchers.push(searcher);
        self
    }

    pub fn len(&self) -> usize {
        self.searchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searchers.is_empty()
    }
}

impl Searcher for SearchChain {
    fn search(&self, query: &str) -> Result<Vec<Source>, GatewayError> {
        let mut last = GatewayError::NoResult(query.to_string());
        for (i, searcher) in self.searchers.iter().enumerate() {
            match searcher.search(query) {
                Ok(sources) => {
                    debug!("search '{}' answered by provider {}", query, i);
                    return Ok(sources);
                }
                Err(e) => {
                    warn!("search provider {} failed for '{}': {}", i, query, e);
                    last = e;
                }
            }
        }
        Err(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl Searcher for Failing {
        fn search(&self, _query: &str) -> Result<Vec<Source>, GatewayError> {
            Err(GatewayError::Unavailable("down".into()))
        }
    }

    struct Fixed(Vec<Source>);

    impl Searcher for Fixed {
        fn search(&self, _query: &str) -> Result<Vec<Source>, GatewayError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_chain_falls_back_to_next_provider() {
        let chain = SearchChain::new()
            .with(Arc::new(Failing))
            .with(Arc::new(Fixed(vec![Source::new("T", "http://t")])));

        let sources = chain.search("q").unwrap();

        assert_eq!(chain.len(), 2);
        assert_eq!(sources, vec![Source::new("T", "http://t")]);
    }

    #[test]
    fn test_chain_reports_last_failure() {
        let chain = SearchChain::new().with(Arc::new(Failing));
        assert_eq!(
            chain.search("q"),
            Err(GatewayError::Unavailable("down".into()))
        );
        assert_eq!(
            SearchChain::new().search("q"),
            Err(GatewayError::NoResult("q".into()))
        );
    }
}
