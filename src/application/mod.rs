//! Application layer: the caller of the tree core
//!
//! Calls the gateway, turns results into actions and serialises dispatches
//! against one authoritative state.

pub mod error;
pub mod gateway;
pub mod script;
pub mod session;

pub use error::{ApplicationError, ApplicationResult};
pub use gateway::{GatewayError, Generator, SearchChain, Searcher};
pub use script::{Replay, Script, ScriptedGenerator, ScriptedSearcher, Step, StepReport};
pub use session::{Pending, Request, Session};
