use bytes::Bytes;

use super::Keyspace;
use crate::error::WrongType;
use crate::types::Value;

impl Keyspace {
    /// Retrieves the string value for `key`, or `None` if the key is
    /// missing or expired.
    ///
    /// Returns `Err(WrongType)` if the key holds a non-string value.
    /// Takes shared K + shared V.
    pub fn get(&self, key: &str) -> Result<Option<Bytes>, WrongType> {
        let keys = self.keys.read();
        let vals = self.vals.read();
        let Some(entry) = keys.get(key).filter(|e| !e.is_expired()) else {
            return Ok(None);
        };
        match vals.get(entry.slot) {
            Some(value) => Ok(Some(value.as_string()?.clone())),
            None => Ok(None),
        }
    }

    /// Stores a string value, overwriting any previous value and expiry.
    /// Takes exclusive K + V + A.
    pub fn set(&self, key: &str, value: Bytes) {
        self.write_value(key, Value::String(value));
    }
}
