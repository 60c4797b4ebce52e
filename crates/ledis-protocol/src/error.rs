//! Protocol error types.

use thiserror::Error;

/// Errors produced while turning a raw line into a [`crate::Command`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The line contained no tokens at all.
    #[error("empty command line")]
    EmptyLine,

    /// The first token didn't match any known opcode.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}
