//! Tests for the caller-side session: gateway calls, pending markers, commits

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};

use knotree::application::{
    ApplicationError, GatewayError, Generator, Pending, SearchChain, Searcher, Session,
};
use knotree::domain::{Action, ChildSpec, DomainError, LogKind, NodeStatus, Outcome, Source};
use knotree::util::testing::init_test_setup;

/// Generator answering from a fixed table and recording every call.
#[derive(Default)]
struct RecordingGenerator {
    answers: HashMap<String, Vec<ChildSpec>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingGenerator {
    fn answer(mut self, topic: &str, children: Vec<ChildSpec>) -> Self {
        self.answers.insert(topic.to_string(), children);
        self
    }

    fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Generator for RecordingGenerator {
    fn generate(&self, topic: &str, context: Option<&str>) -> Result<Vec<ChildSpec>, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((topic.to_string(), context.map(str::to_string)));
        self.answers
            .get(topic)
            .cloned()
            .ok_or_else(|| GatewayError::NoResult(topic.to_string()))
    }
}

struct FixedSearcher(Vec<Source>);

impl Searcher for FixedSearcher {
    fn search(&self, _query: &str) -> Result<Vec<Source>, GatewayError> {
        Ok(self.0.clone())
    }
}

struct DownSearcher;

impl Searcher for DownSearcher {
    fn search(&self, query: &str) -> Result<Vec<Source>, GatewayError> {
        Err(GatewayError::Unavailable(query.to_string()))
    }
}

fn generator() -> RecordingGenerator {
    RecordingGenerator::default()
        .answer("X", vec![ChildSpec::branch("A"), ChildSpec::terminal("B")])
        .answer("A", vec![ChildSpec::branch("A1"), ChildSpec::branch("A2")])
}

#[fixture]
fn planted() -> (Session, Arc<RecordingGenerator>) {
    init_test_setup();
    let generator = Arc::new(generator());
    let searcher = Arc::new(FixedSearcher(vec![Source::new("Ref1", "http://x")]));
    let mut session = Session::new(generator.clone(), searcher);
    session.plant("X").unwrap();
    (session, generator)
}

#[rstest]
fn given_topic_when_plant_then_tree_has_generated_children(planted: (Session, Arc<RecordingGenerator>)) {
    let (session, generator) = planted;

    let root = session.state().root_node().unwrap();

    assert_eq!(root.label, "X");
    assert_eq!(root.children.len(), 2);
    assert_eq!(generator.calls(), vec![("X".to_string(), None)]);
}

#[rstest]
fn given_planted_session_when_plant_again_then_ignored_without_generator_call(
    planted: (Session, Arc<RecordingGenerator>),
) {
    let (mut session, generator) = planted;

    let outcome = session.plant("Y").unwrap();

    assert_eq!(outcome, Outcome::Ignored(DomainError::AlreadyInitialized));
    assert_eq!(generator.calls().len(), 1);
    assert_eq!(session.state().root_node().unwrap().label, "X");
}

#[rstest]
#[case("")]
#[case("   ")]
fn given_blank_topic_when_plant_then_rejected(#[case] topic: &str) {
    let mut session = Session::new(Arc::new(generator()), Arc::new(DownSearcher));

    let result = session.plant(topic);

    assert!(matches!(result, Err(ApplicationError::EmptyTopic)));
    assert!(!session.state().is_initialized());
}

#[test]
fn given_unplanted_session_when_begin_then_not_initialized() {
    let (other, _) = knotree::util::testing::sample_tree();
    let a = other.root().unwrap();
    let mut session = Session::new(Arc::new(generator()), Arc::new(DownSearcher));

    let result = session.begin(a, Pending::Searching);

    assert_eq!(result, Err(DomainError::NotInitialized));
    assert_eq!(session.pending(a), None);
}

#[rstest]
fn given_branch_when_grow_then_generator_gets_context_path(planted: (Session, Arc<RecordingGenerator>)) {
    let (mut session, generator) = planted;
    let a = session.state().find_by_path(&["X", "A"]).unwrap();

    let outcome = session.grow(a).unwrap();

    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(
        generator.calls().last().unwrap(),
        &("A".to_string(), Some("X > A".to_string()))
    );
    assert_eq!(session.state().node(a).unwrap().children.len(), 2);
    assert_eq!(session.pending(a), None);
}

#[rstest]
fn given_generator_failure_when_grow_then_state_unchanged_and_error_returned(
    planted: (Session, Arc<RecordingGenerator>),
) {
    let (mut session, _) = planted;
    let b = session.state().find_by_path(&["X", "B"]).unwrap();
    let before = session.state().clone();

    let result = session.grow(b);

    assert!(matches!(
        result,
        Err(ApplicationError::Gateway {
            source: GatewayError::NoResult(_),
            ..
        })
    ));
    assert_eq!(session.state(), &before);
    assert_eq!(session.pending(b), None);
}

#[rstest]
fn given_pruned_node_when_grow_then_ignored_before_any_gateway_call(
    planted: (Session, Arc<RecordingGenerator>),
) {
    let (mut session, generator) = planted;
    let a = session.state().find_by_path(&["X", "A"]).unwrap();
    session.prune(a);

    let outcome = session.grow(a).unwrap();

    assert_eq!(outcome, Outcome::Ignored(DomainError::PrunedNode(a)));
    assert_eq!(generator.calls().len(), 1);
}

#[rstest]
fn given_outstanding_growth_then_display_status_is_growing_until_finished(
    planted: (Session, Arc<RecordingGenerator>),
) {
    let (mut session, _) = planted;
    let a = session.state().find_by_path(&["X", "A"]).unwrap();

    let request = session.begin(a, Pending::Growing).unwrap();
    assert_eq!(session.display_status(a), Some(NodeStatus::Growing));
    assert_eq!(session.state().node(a).unwrap().status, NodeStatus::Active);

    session
        .finish_grow(&request, Ok(vec![ChildSpec::branch("A1")]))
        .unwrap();
    assert_eq!(session.display_status(a), Some(NodeStatus::Active));
}

#[rstest]
fn given_node_pruned_while_growing_when_result_arrives_then_ignored(
    planted: (Session, Arc<RecordingGenerator>),
) {
    let (mut session, _) = planted;
    let a = session.state().find_by_path(&["X", "A"]).unwrap();
    let request = session.begin(a, Pending::Growing).unwrap();

    session.prune(a);
    assert_eq!(session.display_status(a), Some(NodeStatus::Pruned));
    let outcome = session
        .finish_grow(&request, Ok(vec![ChildSpec::branch("late")]))
        .unwrap();

    assert_eq!(outcome, Outcome::Ignored(DomainError::PrunedNode(a)));
    assert!(session.state().node(a).unwrap().children.is_empty());
    assert_eq!(session.pending(a), None);
}

#[rstest]
fn given_node_when_search_then_sources_attached_and_logged(planted: (Session, Arc<RecordingGenerator>)) {
    let (mut session, _) = planted;
    let b = session.state().find_by_path(&["X", "B"]).unwrap();

    let outcome = session.search(b).unwrap();

    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(
        session.state().node(b).unwrap().sources,
        vec![Source::new("Ref1", "http://x")]
    );
    assert_eq!(session.state().log().last().unwrap().kind, LogKind::Search);
}

#[test]
fn given_primary_search_down_when_search_then_fallback_answers() {
    let chain = SearchChain::new()
        .with(Arc::new(DownSearcher))
        .with(Arc::new(FixedSearcher(vec![Source::new("Wiki", "http://w")])));
    let mut session = Session::new(Arc::new(generator()), Arc::new(chain));
    session.plant("X").unwrap();
    let b = session.state().find_by_path(&["X", "B"]).unwrap();

    session.search(b).unwrap();

    assert_eq!(session.state().node(b).unwrap().sources[0].title, "Wiki");
}

#[test]
fn given_every_searcher_down_when_search_then_gateway_error_and_no_log_entry() {
    let mut session = Session::new(Arc::new(generator()), Arc::new(DownSearcher));
    session.plant("X").unwrap();
    let b = session.state().find_by_path(&["X", "B"]).unwrap();
    let log_len = session.state().log().len();

    let result = session.search(b);

    assert!(matches!(result, Err(ApplicationError::Gateway { .. })));
    assert_eq!(session.state().log().len(), log_len);
    assert_eq!(session.pending(b), None);
}

#[rstest]
fn given_state_moved_on_when_commit_then_stale(planted: (Session, Arc<RecordingGenerator>)) {
    let (mut session, _) = planted;
    let base = session.state().revision();
    let b = session.state().find_by_path(&["X", "B"]).unwrap();
    session.select(Some(b));

    let result = session.commit(base, Action::PruneNode(b));

    assert!(matches!(
        result,
        Err(ApplicationError::Stale { expected, actual }) if expected == base && actual == base + 1
    ));
    assert!(!session.state().node(b).unwrap().is_pruned());
}

#[rstest]
fn given_current_revision_when_commit_then_applied(planted: (Session, Arc<RecordingGenerator>)) {
    let (mut session, _) = planted;
    let base = session.state().revision();
    let b = session.state().find_by_path(&["X", "B"]).unwrap();

    let outcome = session.commit(base, Action::PruneNode(b)).unwrap();

    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(session.state().revision(), base + 1);
}

#[rstest]
fn given_session_when_into_state_then_tree_is_kept(planted: (Session, Arc<RecordingGenerator>)) {
    let (session, _) = planted;
    let revision = session.state().revision();

    let state = session.into_state();

    assert_eq!(state.revision(), revision);
    assert!(state.check_invariants().is_ok());
}
