//! Error types for the storage engine.

use thiserror::Error;

/// Error returned when an operation is attempted against a key holding
/// a value of the wrong shape. The keyspace is left unchanged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Operation against a key holding the wrong kind of value")]
pub struct WrongType;
