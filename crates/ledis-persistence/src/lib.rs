//! ledis-persistence: the snapshotting subsystem.
//!
//! Keeps an in-memory log of modifying commands ([`MutationLog`]) and
//! turns it into an atomically-replaced binary snapshot file
//! ([`SnapshotStore`]) from which a fresh engine can be rebuilt by
//! replay.

pub mod format;
pub mod journal;
pub mod snapshot;

pub use format::DecodeError;
pub use journal::{LoggedCmd, MutationLog};
pub use snapshot::{SnapshotError, SnapshotStore, SNAPSHOT_FILE};
