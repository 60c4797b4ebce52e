//! The result variant returned to callers, and its reference rendering.
//!
//! Rendering is Redis-flavored: quoted strings or `(nil)`, `(integer)`
//! prefixes, 1-indexed list lines, `OK`, and `ERROR: <message>`.

use std::fmt;

/// Outcome of a successfully executed (or failed) command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A string value, or nil when absent.
    Str(Option<String>),
    /// A signed integer (lengths, counts, TTLs).
    Int(i64),
    /// A boolean, rendered as `1`/`0`.
    Bool(bool),
    /// Plain acknowledgement.
    Ok,
    /// An ordered collection of strings.
    List(Vec<String>),
    /// A failed command; the message is user-facing.
    Error(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Str(Some(value)) => write!(f, "\"{value}\""),
            Reply::Str(None) => write!(f, "(nil)"),
            Reply::Int(n) => write!(f, "(integer) {n}"),
            Reply::Bool(b) => write!(f, "{}", if *b { 1 } else { 0 }),
            Reply::Ok => write!(f, "OK"),
            Reply::List(items) if items.is_empty() => write!(f, "(empty list)"),
            Reply::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) \"{item}\"", i + 1)?;
                }
                Ok(())
            }
            Reply::Error(msg) => write!(f, "ERROR: {msg}"),
        }
    }
}

impl Reply {
    /// Returns `true` for the error variant.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}
