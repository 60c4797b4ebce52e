//! Binary primitives for the snapshot file.
//!
//! All multi-byte integers are stored little-endian. (The original
//! engine wrote host byte order; every platform it shipped on was
//! little-endian, so existing files read back unchanged. Fixing the
//! order makes the format portable.)

use std::io::{self, Read, Write};

use thiserror::Error;

/// Maximum length accepted for a record's argument field. A corrupt
/// length prefix must not trigger a multi-gigabyte allocation.
pub const MAX_ARG_LEN: u64 = 64 * 1024 * 1024;

/// Errors produced while decoding a snapshot file.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file ended in the middle of a record.
    #[error("unexpected end of file mid-record")]
    UnexpectedEof,

    /// The record tag doesn't name any known opcode.
    #[error("unknown opcode tag {0}")]
    UnknownOpcode(u16),

    /// A record declared an argument longer than [`MAX_ARG_LEN`].
    #[error("argument length {0} exceeds maximum of {MAX_ARG_LEN}")]
    OversizedArgument(u64),

    /// Argument bytes were not valid UTF-8.
    #[error("argument bytes are not valid utf-8")]
    InvalidUtf8,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Writes a `u16` in little-endian.
pub fn write_u16(w: &mut impl Write, val: u16) -> io::Result<()> {
    w.write_all(&val.to_le_bytes())
}

/// Writes a `u64` in little-endian.
pub fn write_u64(w: &mut impl Write, val: u64) -> io::Result<()> {
    w.write_all(&val.to_le_bytes())
}

/// Reads a `u16` in little-endian.
pub fn read_u16(r: &mut impl Read) -> Result<u16, DecodeError> {
    let mut buf = [0u8; 2];
    read_exact(r, &mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Reads a `u64` in little-endian.
pub fn read_u64(r: &mut impl Read) -> Result<u64, DecodeError> {
    let mut buf = [0u8; 8];
    read_exact(r, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Like [`read_u16`], but distinguishes a clean end-of-file (no bytes
/// at all) from truncation mid-field. Used for the leading field of
/// each record, where clean EOF terminates the file.
pub fn read_u16_or_eof(r: &mut impl Read) -> Result<Option<u16>, DecodeError> {
    let mut buf = [0u8; 2];
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(DecodeError::UnexpectedEof),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(Some(u16::from_le_bytes(buf)))
}

/// Reads exactly `buf.len()` bytes, mapping a short read to
/// [`DecodeError::UnexpectedEof`].
pub fn read_exact(r: &mut impl Read, buf: &mut [u8]) -> Result<(), DecodeError> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            DecodeError::UnexpectedEof
        } else {
            DecodeError::Io(e)
        }
    })
}
