//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::application::gateway::GatewayError;
use crate::domain::{DomainError, InvariantViolation};

/// Application errors wrap domain errors and add caller-side failures.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("gateway failed for '{subject}': {source}")]
    Gateway {
        subject: String,
        #[source]
        source: GatewayError,
    },

    #[error("stale state: based on revision {expected}, current is {actual}")]
    Stale { expected: u64, actual: u64 },

    #[error("no node at path: {0}")]
    UnresolvedPath(String),

    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("invalid script: {message}")]
    Script { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
