//! Offline session scripts
//!
//! A script is a TOML document that stands in for a user and the external
//! providers: it names the topic to plant, canned generator and search
//! answers, and the steps to replay.
//!
//! ```toml
//! topic = "X"
//!
//! [[generate]]
//! topic = "X"
//! children = [{ label = "A" }, { label = "B", terminal = true }]
//!
//! [[search]]
//! query = "B"
//! sources = [{ title = "Ref1", url = "http://x" }]
//!
//! [[steps]]
//! op = "search"
//! node = "X > B"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::application::gateway::{GatewayError, Generator, SearchChain, Searcher};
use crate::application::session::Session;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ChildSpec, Outcome, Source, PATH_SEPARATOR};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Script {
    pub topic: String,
    #[serde(default)]
    pub generate: Vec<GenerateFixture>,
    #[serde(default)]
    pub search: Vec<SearchFixture>,
    /// Consulted when `search` has no answer
    #[serde(default)]
    pub fallback_search: Vec<SearchFixture>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Canned generator answer. `topic` is matched against the context path
/// first (`X > A`), then against the bare topic label.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GenerateFixture {
    pub topic: String,
    #[serde(default)]
    pub children: Vec<ChildSpec>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchFixture {
    pub query: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// One user interaction. Nodes are addressed by label path.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    Grow { node: String },
    Search { node: String },
    Prune { node: String },
    Restore { node: String },
    Select { node: String },
    Deselect,
}

impl Step {
    fn path(&self) -> Option<&str> {
        match self {
            Step::Grow { node }
            | Step::Search { node }
            | Step::Prune { node }
            | Step::Restore { node }
            | Step::Select { node } => Some(node.as_str()),
            Step::Deselect => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Grow { node } => write!(f, "grow {}", node),
            Step::Search { node } => write!(f, "search {}", node),
            Step::Prune { node } => write!(f, "prune {}", node),
            Step::Restore { node } => write!(f, "restore {}", node),
            Step::Select { node } => write!(f, "select {}", node),
            Step::Deselect => write!(f, "deselect"),
        }
    }
}

/// Result of replaying one step.
#[derive(Debug)]
pub struct StepReport {
    pub step: Step,
    pub result: ApplicationResult<Outcome>,
}

/// Final session plus what happened at every step.
pub struct Replay {
    pub session: Session,
    pub reports: Vec<StepReport>,
}

impl Replay {
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.reports.iter().filter(|r| r.result.is_err())
    }
}

/// Generator answering from script fixtures.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    answers: HashMap<String, Vec<ChildSpec>>,
}

impl ScriptedGenerator {
    pub fn new(fixtures: &[GenerateFixture]) -> Self {
        let answers = fixtures
            .iter()
            .map(|f| (normalize_path(&f.topic), f.children.clone()))
            .collect();
        Self { answers }
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, topic: &str, context: Option<&str>) -> Result<Vec<ChildSpec>, GatewayError> {
        context
            .and_then(|c| self.answers.get(&normalize_path(c)))
            .or_else(|| self.answers.get(topic.trim()))
            .cloned()
            .ok_or_else(|| GatewayError::NoResult(topic.to_string()))
    }
}

/// Searcher answering from script fixtures.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSearcher {
    answers: HashMap<String, Vec<Source>>,
}

impl ScriptedSearcher {
    pub fn new(fixtures: &[SearchFixture]) -> Self {
        let answers = fixtures
            .iter()
            .map(|f| (f.query.trim().to_string(), f.sources.clone()))
            .collect();
        Self { answers }
    }
}

impl Searcher for ScriptedSearcher {
    fn search(&self, query: &str) -> Result<Vec<Source>, GatewayError> {
        self.answers
            .get(query.trim())
            .cloned()
            .ok_or_else(|| GatewayError::NoResult(query.to_string()))
    }
}

/// Splits `X > A > B` into trimmed labels. Only the spaced separator splits,
/// so a label such as `a>b` stays whole.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn normalize_path(path: &str) -> String {
    split_path(path).join(PATH_SEPARATOR)
}

impl Script {
    pub fn parse(content: &str) -> ApplicationResult<Self> {
        toml::from_str(content).map_err(|e| ApplicationError::Script {
            message: e.to_string(),
        })
    }

    /// Fresh session wired to this script's fixtures.
    pub fn session(&self) -> Session {
        let searcher = SearchChain::new()
            .with(Arc::new(ScriptedSearcher::new(&self.search)))
            .with(Arc::new(ScriptedSearcher::new(&self.fallback_search)));
        Session::new(
            Arc::new(ScriptedGenerator::new(&self.generate)),
            Arc::new(searcher),
        )
    }

    /// Plants the topic and replays every step.
    ///
    /// Failing to plant is fatal; a failing step is recorded and replay continues.
    #[instrument(level = "debug", skip(self), fields(topic = %self.topic))]
    pub fn run(&self) -> ApplicationResult<Replay> {
        let mut session = self.session();
        session.plant(&self.topic)?;

        let mut reports = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let result = run_step(&mut session, step);
            match &result {
                Ok(outcome) => debug!("{}: {:?}", step, outcome),
                Err(e) => warn!("{}: {}", step, e),
            }
            reports.push(StepReport {
                step: step.clone(),
                result,
            });
        }
        Ok(Replay { session, reports })
    }
}

fn run_step(session: &mut Session, step: &Step) -> ApplicationResult<Outcome> {
    let target = match step.path() {
        Some(path) => Some(
            session
                .state()
                .find_by_path(&split_path(path))
                .ok_or_else(|| ApplicationError::UnresolvedPath(path.to_string()))?,
        ),
        None => None,
    };

    match (step, target) {
        (Step::Grow { .. }, Some(id)) => session.grow(id),
        (Step::Search { .. }, Some(id)) => session.search(id),
        (Step::Prune { .. }, Some(id)) => Ok(session.prune(id)),
        (Step::Restore { .. }, Some(id)) => Ok(session.restore(id)),
        (Step::Select { .. }, Some(id)) => Ok(session.select(Some(id))),
        (Step::Deselect, _) | (_, None) => Ok(session.select(None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_trims_labels() {
        assert_eq!(split_path(" X  >  A > B "), vec!["X", "A", "B"]);
        assert_eq!(split_path("X > Input>Output"), vec!["X", "Input>Output"]);
        assert!(split_path("").is_empty());
    }

    #[test]
    fn test_generator_prefers_context_over_topic() {
        let generator = ScriptedGenerator::new(&[
            GenerateFixture {
                topic: "A".into(),
                children: vec![ChildSpec::branch("bare")],
            },
            GenerateFixture {
                topic: " X > A ".into(),
                children: vec![ChildSpec::branch("contextual")],
            },
        ]);

        let by_context = generator.generate("A", Some("X > A")).unwrap();
        let by_topic = generator.generate("A", Some("Y > A")).unwrap();

        assert_eq!(by_context[0].label, "contextual");
        assert_eq!(by_topic[0].label, "bare");
        assert!(generator.generate("Z", None).is_err());
    }
}
