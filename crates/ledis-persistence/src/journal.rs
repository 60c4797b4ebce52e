//! In-memory log of modifying commands since the last save or restore.
//!
//! Commands are offered after successful execution; only the modifying
//! opcodes are kept. FLUSHDB truncates the log instead of appending —
//! the flushed state is the identity, so replaying nothing reproduces
//! it. The log's order is the successful-execution order.

use parking_lot::Mutex;
use tracing::debug;

use ledis_protocol::Opcode;

/// A logged command: the opcode and its raw argument line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedCmd {
    pub opcode: Opcode,
    pub args: String,
}

impl LoggedCmd {
    pub fn new(opcode: Opcode, args: impl Into<String>) -> Self {
        Self {
            opcode,
            args: args.into(),
        }
    }

    /// The first argument token — the key the command acted on.
    pub fn key(&self) -> Option<&str> {
        self.args.split_whitespace().next()
    }
}

/// Returns `true` for opcodes that can alter the observable keyspace.
fn is_modifying(opcode: Opcode) -> bool {
    matches!(
        opcode,
        Opcode::Set
            | Opcode::LPush
            | Opcode::RPush
            | Opcode::LPop
            | Opcode::RPop
            | Opcode::SAdd
            | Opcode::SRem
            | Opcode::Del
            | Opcode::FlushDb
    )
}

/// The append-only mutation log, serialized by its own lock.
#[derive(Debug, Default)]
pub struct MutationLog {
    entries: Mutex<Vec<LoggedCmd>>,
}

impl MutationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers an executed command to the log. Non-modifying opcodes
    /// are ignored; FLUSHDB truncates.
    pub fn offer(&self, opcode: Opcode, args: &str) {
        if !is_modifying(opcode) {
            return;
        }
        let mut entries = self.entries.lock();
        if opcode == Opcode::FlushDb {
            debug!("flushdb: truncating mutation log");
            entries.clear();
        } else {
            debug!(op = opcode.name(), args, "appending to mutation log");
            entries.push(LoggedCmd::new(opcode, args));
        }
    }

    /// A point-in-time copy of the log contents.
    pub fn entries(&self) -> Vec<LoggedCmd> {
        self.entries.lock().clone()
    }

    /// Replaces the log wholesale, as after a restore.
    pub fn replace(&self, entries: Vec<LoggedCmd>) {
        *self.entries.lock() = entries;
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
