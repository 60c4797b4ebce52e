//! Point-in-time snapshot files.
//!
//! A snapshot is the mutation log serialized record by record, each
//! `[opcode: u16][arg-byte-length: u64][arg bytes]`, with no header and
//! no terminator — records run until EOF. Synthetic EXPIRE records for
//! live TTLs are appended by the caller at the end of the record list,
//! so on replay the final TTL of each key reflects its value at save
//! time.
//!
//! Writes go to a timestamped temp file produced by an isolated worker
//! thread; the live engine is never touched by the writer. Publication
//! is a rename dance under the exclusive file lock: an existing target
//! is first renamed to `.bak`, the temp file is renamed over the
//! target, and the backup is unlinked. Rename-over is atomic on POSIX;
//! the backup bounds the window where no file exists, and is rolled
//! back into place if the second rename fails.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use ledis_protocol::Opcode;

use crate::format::{self, DecodeError, MAX_ARG_LEN};
use crate::journal::LoggedCmd;

/// Fixed snapshot filename.
pub const SNAPSHOT_FILE: &str = "ledis.snpsht";

/// Errors from saving or restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// RESTORE was issued but no snapshot file exists.
    #[error("no snapshot file to restore")]
    NotFound,

    /// A record could not be decoded; the engine is left unchanged.
    #[error("snapshot decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// A decoded record failed to replay; the engine is left unchanged.
    #[error("snapshot replay failed: {0}")]
    Replay(String),

    /// The isolated writer died without reporting a status.
    #[error("snapshot writer thread panicked")]
    WriterPanicked,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Owns the snapshot file: serializes all filesystem access behind an
/// exclusive lock and performs the atomic-replacement dance.
#[derive(Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
    file_lock: Mutex<()>,
}

impl SnapshotStore {
    /// A store writing `ledis.snpsht` under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file_lock: Mutex::new(()),
        }
    }

    /// A store writing into the current working directory.
    pub fn in_current_dir() -> Self {
        Self::new(".")
    }

    /// Path of the snapshot file this store manages.
    pub fn path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.dir.join(format!("{SNAPSHOT_FILE}.bak"))
    }

    fn temp_path(&self) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.dir.join(format!("ledis-{stamp}.snpsht.tmp"))
    }

    /// Writes `records` to a fresh snapshot and atomically replaces the
    /// current file.
    ///
    /// The serialization runs in a worker thread over an owned copy of
    /// the records, so the caller's locks (and the live keyspace) stay
    /// untouched during the write. The whole operation holds the file
    /// lock: concurrent saves and restores serialize here.
    pub fn save(&self, records: Vec<LoggedCmd>) -> Result<(), SnapshotError> {
        let _guard = self.file_lock.lock();

        let tmp = self.temp_path();
        let count = records.len();
        let writer_tmp = tmp.clone();
        let written = thread::spawn(move || write_records(&writer_tmp, &records))
            .join()
            .map_err(|_| SnapshotError::WriterPanicked)?;
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        let target = self.path();
        let backup = self.backup_path();
        let had_backup = target.exists();
        if had_backup {
            fs::rename(&target, &backup)?;
        }
        if let Err(e) = fs::rename(&tmp, &target) {
            if had_backup {
                // put the previous snapshot back so a file still exists
                if let Err(rb) = fs::rename(&backup, &target) {
                    warn!("failed to roll back snapshot backup: {rb}");
                }
            }
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        if had_backup {
            let _ = fs::remove_file(&backup);
        }

        info!(records = count, path = %target.display(), "snapshot saved");
        Ok(())
    }

    /// Reads every record from the snapshot file.
    ///
    /// Fails with [`SnapshotError::NotFound`] if the file is missing
    /// and with a decode error on any malformed or truncated record —
    /// a partial read is never returned.
    pub fn load(&self) -> Result<Vec<LoggedCmd>, SnapshotError> {
        let _guard = self.file_lock.lock();

        let target = self.path();
        if !target.exists() {
            return Err(SnapshotError::NotFound);
        }
        let mut reader = BufReader::new(File::open(&target)?);
        let mut records = Vec::new();
        while let Some(record) = read_record(&mut reader)? {
            records.push(record);
        }
        info!(records = records.len(), path = %target.display(), "snapshot loaded");
        Ok(records)
    }
}

fn write_records(path: &Path, records: &[LoggedCmd]) -> Result<(), SnapshotError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for record in records {
        debug!(op = record.opcode.name(), args = %record.args, "writing snapshot record");
        write_record(&mut writer, record)?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

fn write_record(w: &mut impl Write, record: &LoggedCmd) -> Result<(), SnapshotError> {
    format::write_u16(w, record.opcode.to_wire())?;
    format::write_u64(w, record.args.len() as u64)?;
    w.write_all(record.args.as_bytes())?;
    Ok(())
}

fn read_record(r: &mut impl Read) -> Result<Option<LoggedCmd>, DecodeError> {
    let Some(tag) = format::read_u16_or_eof(r)? else {
        return Ok(None);
    };
    let opcode = Opcode::from_wire(tag).ok_or(DecodeError::UnknownOpcode(tag))?;
    let len = format::read_u64(r)?;
    if len > MAX_ARG_LEN {
        return Err(DecodeError::OversizedArgument(len));
    }
    let mut args = vec![0u8; len as usize];
    format::read_exact(r, &mut args)?;
    let args = String::from_utf8(args).map_err(|_| DecodeError::InvalidUtf8)?;
    debug!(op = opcode.name(), args = %args, "read snapshot record");
    Ok(Some(LoggedCmd { opcode, args }))
}
