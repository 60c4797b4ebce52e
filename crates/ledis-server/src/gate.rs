//! The gate: the single entry point a transport hands raw lines to.
//!
//! Drives parse → dispatch → log-append for data commands, handles the
//! session-control and snapshot opcodes itself, and folds every error
//! into an error reply — one error per command, no partial results.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use ledis_core::{Keyspace, TtlResult};
use ledis_persistence::{LoggedCmd, MutationLog, SnapshotError, SnapshotStore};
use ledis_protocol::{Command, Opcode, Reply};

use crate::dispatch::{dispatch, CommandError};

/// What the transport should do after a line has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// EXIT: close the session.
    Terminate,
    /// Anything else: a reply to present (errors included).
    Reply(Reply),
}

/// Top-level façade over the keyspace, the mutation log, and the
/// snapshot store. Safe to share across request threads.
#[derive(Debug)]
pub struct Gate {
    /// Swapped wholesale by RESTORE; in-flight commands finish against
    /// the keyspace they started with.
    db: RwLock<Arc<Keyspace>>,
    log: MutationLog,
    store: SnapshotStore,
}

impl Gate {
    /// A gate snapshotting into the current working directory.
    pub fn new() -> Self {
        Self::with_data_dir(".")
    }

    /// A gate snapshotting into `dir` (the filename stays fixed).
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            db: RwLock::new(Arc::new(Keyspace::new())),
            log: MutationLog::new(),
            store: SnapshotStore::new(dir),
        }
    }

    /// The current keyspace instance.
    pub fn keyspace(&self) -> Arc<Keyspace> {
        self.db.read().clone()
    }

    /// Handles one raw command line.
    pub fn execute(&self, line: &str) -> GateOutcome {
        let cmd = match Command::parse(line) {
            Ok(cmd) => cmd,
            Err(e) => return GateOutcome::Reply(Reply::Error(e.to_string())),
        };

        match cmd.opcode() {
            Opcode::Exit => {
                if cmd.args().is_empty() {
                    GateOutcome::Terminate
                } else {
                    GateOutcome::Reply(Reply::Error(CommandError::Arity("exit").to_string()))
                }
            }
            Opcode::Save => GateOutcome::Reply(self.handle_save(&cmd)),
            Opcode::Restore => GateOutcome::Reply(self.handle_restore(&cmd)),
            _ => {
                let db = self.keyspace();
                match dispatch(&db, &cmd) {
                    Ok(reply) => {
                        self.log.offer(cmd.opcode(), &cmd.arg_line());
                        GateOutcome::Reply(reply)
                    }
                    Err(e) => {
                        warn!(op = cmd.opcode().name(), "command failed: {e}");
                        GateOutcome::Reply(Reply::Error(e.to_string()))
                    }
                }
            }
        }
    }

    fn handle_save(&self, cmd: &Command) -> Reply {
        if !cmd.args().is_empty() {
            return Reply::Error(CommandError::Arity("save").to_string());
        }
        match self.create_snapshot() {
            Ok(()) => Reply::Ok,
            Err(e) => {
                warn!("save failed: {e}");
                Reply::Error(e.to_string())
            }
        }
    }

    fn handle_restore(&self, cmd: &Command) -> Reply {
        if !cmd.args().is_empty() {
            return Reply::Error(CommandError::Arity("restore").to_string());
        }
        match self.restore_snapshot() {
            Ok(()) => Reply::Ok,
            Err(e) => {
                warn!("restore failed: {e}");
                Reply::Error(e.to_string())
            }
        }
    }

    /// Serializes the mutation log to a new snapshot file.
    ///
    /// For each logged command the *live* TTL of its key is consulted:
    /// a key that no longer exists drops the record entirely (replay of
    /// a dead key's history would at best be wasted work and at worst
    /// resurrect an expired key), a key with a live TTL queues a
    /// synthetic EXPIRE record behind the log so the replayed TTL
    /// matches the state at save time.
    fn create_snapshot(&self) -> Result<(), SnapshotError> {
        let db = self.keyspace();
        let mut records = Vec::new();
        let mut ttl_records = Vec::new();
        for entry in self.log.entries() {
            let Some(key) = entry.key().map(str::to_owned) else {
                continue;
            };
            match db.ttl(&key) {
                TtlResult::NotFound => continue,
                TtlResult::NoExpiry => records.push(entry),
                TtlResult::Seconds(secs) => {
                    ttl_records.push(LoggedCmd::new(Opcode::Expire, format!("{key} {secs}")));
                    records.push(entry);
                }
            }
        }
        records.extend(ttl_records);
        self.store.save(records)
    }

    /// Rebuilds a fresh keyspace by replaying the snapshot file through
    /// the regular dispatcher, then installs it and adopts the decoded
    /// records as the new mutation log. Any failure leaves the running
    /// engine untouched.
    fn restore_snapshot(&self) -> Result<(), SnapshotError> {
        let records = self.store.load()?;
        let fresh = Keyspace::new();
        for record in &records {
            let cmd = Command::from_parts(record.opcode, &record.args);
            dispatch(&fresh, &cmd).map_err(|e| SnapshotError::Replay(e.to_string()))?;
        }
        info!(records = records.len(), "snapshot restored, installing keyspace");
        *self.db.write() = Arc::new(fresh);
        self.log.replace(records);
        Ok(())
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
