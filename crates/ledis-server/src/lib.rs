//! ledis-server: the execution layer over the storage engine.
//!
//! [`dispatch`] routes a parsed command into the keyspace under the
//! arity and pre/post-command rules; [`Gate`] is the façade a transport
//! hands raw lines to, adding snapshot save/restore and the mutation
//! log; [`server`] is a thread-per-connection line transport.

pub mod dispatch;
pub mod gate;
pub mod server;

pub use dispatch::{dispatch, CommandError};
pub use gate::{Gate, GateOutcome};
