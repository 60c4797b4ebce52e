//! Wall-clock expiry helpers.
//!
//! Expiry instants are absolute `SystemTime` values so that TTLs can be
//! carried across a save/restore cycle as whole-second counts. All
//! arithmetic is at second granularity: remaining time rounds up, so a
//! key given `EXPIRE k 1` reads back as 1 until the deadline passes.

use std::time::{Duration, SystemTime};

/// Returns the current wall-clock time.
#[inline]
pub fn now() -> SystemTime {
    SystemTime::now()
}

/// Converts a TTL in seconds to an absolute deadline.
#[inline]
pub fn deadline_after_secs(secs: u64) -> SystemTime {
    now() + Duration::from_secs(secs)
}

/// Returns `true` once the deadline has been reached.
#[inline]
pub fn has_passed(deadline: SystemTime) -> bool {
    now() >= deadline
}

/// Remaining whole seconds until `deadline`, rounded up. Returns 0 if
/// the deadline has already passed.
#[inline]
pub fn remaining_secs(deadline: SystemTime) -> i64 {
    match deadline.duration_since(now()) {
        Ok(left) => left.as_millis().div_ceil(1000) as i64,
        Err(_) => 0,
    }
}
