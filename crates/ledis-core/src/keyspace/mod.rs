//! The keyspace: a concurrent map from key to entry plus the value
//! arena and the last-access table.
//!
//! Three reader-writer locks guard independent axes of mutability:
//!
//! - **K** (`keys`) — structure of the key→entry map: insertions,
//!   deletions, iteration, and per-entry expiry metadata.
//! - **V** (`vals`) — the arena of live values: creating or destroying
//!   a value, and mutating a value's contents in place.
//! - **A** (`last_access`) — per-key last-access timestamps.
//!
//! Rules of engagement:
//!
//! - pure reads take shared K + shared V
//! - in-place value mutation (push/pop, sadd/srem) takes shared K +
//!   exclusive V — the mapping is unchanged, only value contents move
//! - insert/overwrite of a key takes exclusive K + V + A
//! - deletion (DEL, expiry sweep, empty-collection cleanup) takes
//!   exclusive K + V + A
//!
//! Lock order is always K → V → A. No path upgrades a lock in place:
//! the expiry sweep collects candidates under shared K, drops it, then
//! reacquires all three exclusively and re-checks before deleting.
//! This layout lets reads of distinct keys' values proceed concurrently
//! and keeps value mutation off the map-structure lock.

use std::collections::HashMap;
use std::time::SystemTime;

use parking_lot::RwLock;

use crate::store::ValueStore;
use crate::time;
use crate::types::Value;

mod list;
mod set;
mod string;

/// Per-key metadata: the slot of the owned value in the arena, and an
/// optional absolute expiry instant. The key name itself is the map key.
#[derive(Debug, Clone)]
pub(crate) struct KeyEntry {
    pub(crate) slot: usize,
    pub(crate) expires_at: Option<SystemTime>,
}

impl KeyEntry {
    fn new(slot: usize) -> Self {
        Self {
            slot,
            expires_at: None,
        }
    }

    /// Returns `true` if this entry has passed its expiry instant.
    pub(crate) fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(time::has_passed)
    }
}

/// Result of a TTL query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlResult {
    /// Key exists and has an expiry; remaining whole seconds.
    Seconds(i64),
    /// Key exists but has no expiry set.
    NoExpiry,
    /// Key does not exist (or has expired).
    NotFound,
}

impl TtlResult {
    /// Collapses to the conventional integer encoding:
    /// remaining seconds, -1 for no expiry, -2 for a missing key.
    pub fn as_secs(self) -> i64 {
        match self {
            TtlResult::Seconds(secs) => secs,
            TtlResult::NoExpiry => -1,
            TtlResult::NotFound => -2,
        }
    }
}

/// The concurrent key-value store.
///
/// All operations take `&self`; locking is internal per the rules
/// above. Expired keys are removed only by [`Keyspace::sweep_expired`]
/// (run at command boundaries) — but every read path re-checks the
/// expiry predicate, so an expired-but-unswept key is never observable.
#[derive(Debug, Default)]
pub struct Keyspace {
    keys: RwLock<HashMap<String, KeyEntry>>,
    vals: RwLock<ValueStore>,
    last_access: RwLock<HashMap<String, SystemTime>>,
}

impl Keyspace {
    /// Creates a new, empty keyspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, including expired-but-unswept ones.
    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    /// Returns `true` if the keyspace holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }

    /// Returns the recorded last-access time of a key, if any.
    ///
    /// The timestamp is a diagnostic aid stamped by [`Keyspace::touch`]
    /// and the write paths; nothing in the engine consults it.
    pub fn last_access(&self, key: &str) -> Option<SystemTime> {
        self.last_access.read().get(key).copied()
    }

    // ------------------------------------------------------------------
    // command-boundary passes
    // ------------------------------------------------------------------

    /// Lazy-expiry pass over the given keys: removes each that has
    /// passed its deadline. Runs before every command, over the keys
    /// the command will touch.
    pub fn sweep_expired(&self, touched: &[&str]) {
        let expired: Vec<String> = {
            let keys = self.keys.read();
            touched
                .iter()
                .copied()
                .filter(|key| keys.get(*key).is_some_and(KeyEntry::is_expired))
                .map(str::to_owned)
                .collect()
        };
        self.remove_expired(expired);
    }

    /// Lazy-expiry pass over the whole keyspace, for commands that
    /// touch every key (KEYS, FLUSHDB).
    pub fn sweep_expired_all(&self) {
        let expired: Vec<String> = {
            let keys = self.keys.read();
            keys.iter()
                .filter(|(_, entry)| entry.is_expired())
                .map(|(key, _)| key.clone())
                .collect()
        };
        self.remove_expired(expired);
    }

    /// Deletes the collected keys under exclusive K + V + A. Entries
    /// are re-checked: another thread may have rewritten one in the
    /// window between the shared scan and this pass.
    fn remove_expired(&self, expired: Vec<String>) {
        if expired.is_empty() {
            return;
        }
        let mut keys = self.keys.write();
        let mut vals = self.vals.write();
        let mut access = self.last_access.write();
        for key in &expired {
            if keys.get(key.as_str()).is_some_and(KeyEntry::is_expired) {
                Self::delete_locked(&mut keys, &mut vals, &mut access, key);
            }
        }
        // one entry, one live value
        debug_assert_eq!(keys.len(), vals.len());
    }

    /// Stamps the last-access time of each listed key that exists.
    /// Runs after read-type and in-place-mutation commands.
    pub fn touch(&self, touched: &[&str]) {
        let keys = self.keys.read();
        let mut access = self.last_access.write();
        let now = time::now();
        for key in touched {
            if keys.contains_key(*key) {
                access.insert((*key).to_owned(), now);
            }
        }
    }

    /// Stamps the last-access time of every key.
    pub fn touch_all(&self) {
        let keys = self.keys.read();
        let mut access = self.last_access.write();
        let now = time::now();
        for key in keys.keys() {
            access.insert(key.clone(), now);
        }
    }

    // ------------------------------------------------------------------
    // generic operations
    // ------------------------------------------------------------------

    /// Removes a key. Returns `true` if it existed and had not expired.
    pub fn del(&self, key: &str) -> bool {
        let mut keys = self.keys.write();
        let mut vals = self.vals.write();
        let mut access = self.last_access.write();
        let expired = keys.get(key).is_some_and(KeyEntry::is_expired);
        let existed = Self::delete_locked(&mut keys, &mut vals, &mut access, key);
        existed && !expired
    }

    /// Returns all live (non-expired) keys, sorted ascending.
    pub fn keys(&self) -> Vec<String> {
        let keys = self.keys.read();
        let mut out: Vec<String> = keys
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        out.sort();
        out
    }

    /// Removes every key and destroys every value.
    pub fn flush(&self) {
        let mut keys = self.keys.write();
        let mut vals = self.vals.write();
        let mut access = self.last_access.write();
        keys.clear();
        vals.clear();
        access.clear();
    }

    /// Sets an expiry of `seconds` from now on an existing key.
    ///
    /// Returns the remaining seconds after the set (i.e. `seconds`,
    /// since no time has passed yet), or `None` if the key is absent.
    pub fn expire(&self, key: &str, seconds: u64) -> Option<i64> {
        let mut keys = self.keys.write();
        let entry = keys.get_mut(key)?;
        if entry.is_expired() {
            return None;
        }
        let deadline = time::deadline_after_secs(seconds);
        entry.expires_at = Some(deadline);
        Some(time::remaining_secs(deadline))
    }

    /// Returns the TTL status of a key.
    pub fn ttl(&self, key: &str) -> TtlResult {
        let keys = self.keys.read();
        match keys.get(key) {
            None => TtlResult::NotFound,
            Some(entry) if entry.is_expired() => TtlResult::NotFound,
            Some(KeyEntry {
                expires_at: Some(deadline),
                ..
            }) => TtlResult::Seconds(time::remaining_secs(*deadline)),
            Some(KeyEntry {
                expires_at: None, ..
            }) => TtlResult::NoExpiry,
        }
    }

    // ------------------------------------------------------------------
    // internals shared by the typed operations
    // ------------------------------------------------------------------

    /// Inserts or overwrites a key under exclusive K + V + A.
    /// An overwritten key loses its old value and its expiry.
    pub(crate) fn write_value(&self, key: &str, value: Value) {
        let mut keys = self.keys.write();
        let mut vals = self.vals.write();
        let mut access = self.last_access.write();
        Self::insert_locked(&mut keys, &mut vals, &mut access, key, value);
    }

    /// Insert/overwrite with all three exclusive guards already held.
    pub(crate) fn insert_locked(
        keys: &mut HashMap<String, KeyEntry>,
        vals: &mut ValueStore,
        access: &mut HashMap<String, SystemTime>,
        key: &str,
        value: Value,
    ) {
        if let Some(old) = keys.remove(key) {
            vals.remove(old.slot);
        }
        let slot = vals.insert(value);
        keys.insert(key.to_owned(), KeyEntry::new(slot));
        access.insert(key.to_owned(), time::now());
    }

    /// Full removal (entry + value + access stamp) with all three
    /// exclusive guards already held. Returns `true` if the entry
    /// existed.
    pub(crate) fn delete_locked(
        keys: &mut HashMap<String, KeyEntry>,
        vals: &mut ValueStore,
        access: &mut HashMap<String, SystemTime>,
        key: &str,
    ) -> bool {
        match keys.remove(key) {
            Some(entry) => {
                vals.remove(entry.slot);
                access.remove(key);
                true
            }
            None => false,
        }
    }

    /// Deletes `key` if it currently holds an empty list or set.
    ///
    /// Called after a pop/remove dropped the last element. The check is
    /// repeated under the exclusive locks: another thread may have
    /// refilled the collection since the caller observed it empty.
    pub(crate) fn drop_if_empty_collection(&self, key: &str) {
        let mut keys = self.keys.write();
        let mut vals = self.vals.write();
        let mut access = self.last_access.write();
        let empty = keys
            .get(key)
            .and_then(|entry| vals.get(entry.slot))
            .is_some_and(|value| match value {
                Value::List(list) => list.is_empty(),
                Value::Set(set) => set.is_empty(),
                Value::String(_) => false,
            });
        if empty {
            Self::delete_locked(&mut keys, &mut vals, &mut access, key);
        }
    }
}
