//! knotree: grow, prune and export exploratory knowledge trees
//!
//! - [`domain`]: pure tree state machine, tidy layout, markdown export
//! - [`application`]: gateway traits, the single-writer session, scripts
//! - [`infrastructure`]: filesystem boundary and service container
//! - [`cli`]: the `knotree` command line

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
