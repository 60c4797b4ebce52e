//! Slot arena that owns every live value.
//!
//! Key entries reference values by slot index rather than owning them
//! directly, so that value contents can be mutated under a shared
//! keyspace lock while the arena's own lock is held exclusively.
//! Freed slots are recycled.

use crate::types::Value;

#[derive(Debug, Default)]
pub(crate) struct ValueStore {
    slots: Vec<Option<Value>>,
    free: Vec<usize>,
}

impl ValueStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores a value and returns its slot.
    pub(crate) fn insert(&mut self, value: Value) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(value);
                slot
            }
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            }
        }
    }

    /// Destroys the value in `slot`, freeing the slot for reuse.
    pub(crate) fn remove(&mut self, slot: usize) -> Option<Value> {
        let value = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        Some(value)
    }

    pub(crate) fn get(&self, slot: usize) -> Option<&Value> {
        self.slots.get(slot)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> Option<&mut Value> {
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Number of live values.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Destroys every live value.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
