//! Data type representations for stored values.
//!
//! Each variant maps to one of the three supported value shapes.
//! Projection through the `as_*` accessors is the only way to reach a
//! payload; projecting the wrong shape fails with [`WrongType`] and has
//! no side effect.

use std::collections::{BTreeSet, VecDeque};

use bytes::Bytes;

use crate::error::WrongType;

/// A stored value in the keyspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Binary-safe string data. `Bytes` clones are cheap refcount
    /// bumps, so reads can hand out copies while holding shared locks.
    String(Bytes),

    /// Ordered list of binary-safe elements. `VecDeque` gives O(1)
    /// push/pop at both ends.
    List(VecDeque<Bytes>),

    /// Unique members with deterministic ascending iteration, which
    /// keeps SMEMBERS and SINTER output sorted without an extra pass.
    Set(BTreeSet<String>),
}

impl Value {
    /// Returns the name of this value's shape.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
        }
    }

    /// Projects this value as a string payload.
    pub fn as_string(&self) -> Result<&Bytes, WrongType> {
        match self {
            Value::String(data) => Ok(data),
            _ => Err(WrongType),
        }
    }

    /// Projects this value as a list payload.
    pub fn as_list(&self) -> Result<&VecDeque<Bytes>, WrongType> {
        match self {
            Value::List(list) => Ok(list),
            _ => Err(WrongType),
        }
    }

    /// Projects this value as a mutable list payload.
    pub fn as_list_mut(&mut self) -> Result<&mut VecDeque<Bytes>, WrongType> {
        match self {
            Value::List(list) => Ok(list),
            _ => Err(WrongType),
        }
    }

    /// Projects this value as a set payload.
    pub fn as_set(&self) -> Result<&BTreeSet<String>, WrongType> {
        match self {
            Value::Set(set) => Ok(set),
            _ => Err(WrongType),
        }
    }

    /// Projects this value as a mutable set payload.
    pub fn as_set_mut(&mut self) -> Result<&mut BTreeSet<String>, WrongType> {
        match self {
            Value::Set(set) => Ok(set),
            _ => Err(WrongType),
        }
    }
}

/// Converts range indices (supporting negative values) to a clamped
/// `(start, stop)` pair.
///
/// Negative indices count back from `len` (-1 = last element). Start
/// clamps to 0 at the floor; stop clamps to `len - 1` at the ceiling.
/// The caller sees `start > stop` for any empty range.
pub fn normalize_range(start: i64, stop: i64, len: i64) -> (i64, i64) {
    if len == 0 {
        return (0, -1);
    }

    let s = if start < 0 {
        (len + start).max(0)
    } else {
        start
    };

    // clamp floor to -1 so a hugely-negative stop yields s > e
    let e = if stop < 0 {
        (len + stop).max(-1)
    } else {
        stop.min(len - 1)
    };

    (s, e)
}
