//! Shared test setup: logging and a small reference tree

use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{Action, ChildSpec, NodeId, TreeState};

static TEST_SETUP: Once = Once::new();

/// Install a global tracing subscriber once per test binary.
///
/// `RUST_LOG` wins; otherwise this crate logs at debug level.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("knotree=debug"));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_test_writer()
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(env_filter),
        );

        if tracing::dispatcher::has_been_set() {
            debug!("Tracing subscriber already set");
        } else if let Err(e) = subscriber.try_init() {
            eprintln!("Error: Failed to set up logging: {}", e);
        }
        info!("Test Setup complete");
    });
}

/// Ids of the reference tree built by [`sample_tree`].
#[derive(Debug, Clone, Copy)]
pub struct SampleIds {
    pub root: NodeId,
    pub a: NodeId,
    pub b: NodeId,
}

/// `X` with children `A` (branch) and `B` (terminal leaf).
pub fn sample_tree() -> (TreeState, SampleIds) {
    let mut state = TreeState::new();
    state.dispatch(Action::InitTree {
        topic: "X".into(),
        children: vec![ChildSpec::branch("A"), ChildSpec::terminal("B")],
    });
    let ids = SampleIds {
        root: state.root().expect("sample tree has a root"),
        a: state.find_by_path(&["X", "A"]).expect("sample tree has A"),
        b: state.find_by_path(&["X", "B"]).expect("sample tree has B"),
    };
    (state, ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
        init_test_setup();
    }

    #[test]
    fn test_sample_tree() {
        let (state, ids) = sample_tree();
        assert_eq!(state.nodes().len(), 3);
        assert_ne!(ids.a, ids.b);
    }
}
