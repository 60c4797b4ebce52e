use std::collections::VecDeque;

use bytes::Bytes;

use super::Keyspace;
use crate::error::WrongType;
use crate::types::{normalize_range, Value};

impl Keyspace {
    /// Pushes values to the head of a list, one by one in argument
    /// order (the last argument ends up at the front). Creates the
    /// list if the key is absent. Returns the new length.
    pub fn lpush(&self, key: &str, values: &[Bytes]) -> Result<usize, WrongType> {
        self.push(key, values, true)
    }

    /// Pushes values to the tail of a list in argument order. Creates
    /// the list if the key is absent. Returns the new length.
    pub fn rpush(&self, key: &str, values: &[Bytes]) -> Result<usize, WrongType> {
        self.push(key, values, false)
    }

    /// Pops a value from the head of a list. `None` if the key is
    /// absent. A list emptied by the pop is removed from the keyspace.
    pub fn lpop(&self, key: &str) -> Result<Option<Bytes>, WrongType> {
        self.pop(key, true)
    }

    /// Pops a value from the tail of a list. `None` if the key is
    /// absent. A list emptied by the pop is removed from the keyspace.
    pub fn rpop(&self, key: &str) -> Result<Option<Bytes>, WrongType> {
        self.pop(key, false)
    }

    /// Returns the length of a list, or 0 if the key is absent.
    pub fn llen(&self, key: &str) -> Result<usize, WrongType> {
        let keys = self.keys.read();
        let vals = self.vals.read();
        let Some(entry) = keys.get(key).filter(|e| !e.is_expired()) else {
            return Ok(0);
        };
        match vals.get(entry.slot) {
            Some(value) => Ok(value.as_list()?.len()),
            None => Ok(0),
        }
    }

    /// Returns the elements between `start` and `stop` inclusive.
    ///
    /// Negative indices count from the end; out-of-bounds indices are
    /// clamped. A missing key yields an empty result.
    pub fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>, WrongType> {
        let keys = self.keys.read();
        let vals = self.vals.read();
        let Some(entry) = keys.get(key).filter(|e| !e.is_expired()) else {
            return Ok(vec![]);
        };
        let Some(value) = vals.get(entry.slot) else {
            return Ok(vec![]);
        };
        let list = value.as_list()?;
        let (s, e) = normalize_range(start, stop, list.len() as i64);
        if s > e {
            return Ok(vec![]);
        }
        Ok(list
            .iter()
            .skip(s as usize)
            .take((e - s + 1) as usize)
            .cloned()
            .collect())
    }

    /// Shared push implementation.
    ///
    /// Existing lists mutate in place under shared K + exclusive V; a
    /// missing (or expired) key escalates to exclusive K + V + A to
    /// create the list. The entry is re-checked after the escalation
    /// because another writer may have claimed the key in the gap.
    fn push(&self, key: &str, values: &[Bytes], front: bool) -> Result<usize, WrongType> {
        {
            let keys = self.keys.read();
            if let Some(entry) = keys.get(key).filter(|e| !e.is_expired()) {
                let mut vals = self.vals.write();
                if let Some(value) = vals.get_mut(entry.slot) {
                    let list = value.as_list_mut()?;
                    push_each(list, values, front);
                    return Ok(list.len());
                }
            }
        }

        let mut keys = self.keys.write();
        let mut vals = self.vals.write();
        let mut access = self.last_access.write();
        if let Some(entry) = keys.get(key).filter(|e| !e.is_expired()) {
            if let Some(value) = vals.get_mut(entry.slot) {
                let list = value.as_list_mut()?;
                push_each(list, values, front);
                return Ok(list.len());
            }
        }
        let mut list = VecDeque::with_capacity(values.len());
        push_each(&mut list, values, front);
        let len = list.len();
        Self::insert_locked(&mut keys, &mut vals, &mut access, key, Value::List(list));
        Ok(len)
    }

    /// Shared pop implementation: shared K + exclusive V, then an
    /// empty-collection cleanup pass if the pop drained the list.
    fn pop(&self, key: &str, front: bool) -> Result<Option<Bytes>, WrongType> {
        let (popped, emptied) = {
            let keys = self.keys.read();
            let Some(entry) = keys.get(key).filter(|e| !e.is_expired()) else {
                return Ok(None);
            };
            let mut vals = self.vals.write();
            let Some(value) = vals.get_mut(entry.slot) else {
                return Ok(None);
            };
            let list = value.as_list_mut()?;
            let popped = if front {
                list.pop_front()
            } else {
                list.pop_back()
            };
            (popped, list.is_empty())
        };
        if emptied {
            self.drop_if_empty_collection(key);
        }
        Ok(popped)
    }
}

fn push_each(list: &mut VecDeque<Bytes>, values: &[Bytes], front: bool) {
    for value in values {
        if front {
            list.push_front(value.clone());
        } else {
            list.push_back(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpush_keeps_argument_order() {
        let ks = Keyspace::new();
        let len = ks
            .rpush("l", &[Bytes::from("a"), Bytes::from("b"), Bytes::from("c")])
            .unwrap();
        assert_eq!(len, 3);
        assert_eq!(
            ks.lrange("l", 0, -1).unwrap(),
            vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]
        );
    }

    #[test]
    fn lpush_reverses_argument_order() {
        let ks = Keyspace::new();
        let len = ks
            .lpush("l", &[Bytes::from("x"), Bytes::from("y"), Bytes::from("z")])
            .unwrap();
        assert_eq!(len, 3);
        // pushed one by one, so the last argument is at the front
        assert_eq!(
            ks.lrange("l", 0, -1).unwrap(),
            vec![Bytes::from("z"), Bytes::from("y"), Bytes::from("x")]
        );
    }

    #[test]
    fn push_to_existing_list_appends() {
        let ks = Keyspace::new();
        ks.rpush("l", &[Bytes::from("a")]).unwrap();
        let len = ks.rpush("l", &[Bytes::from("b")]).unwrap();
        assert_eq!(len, 2);
    }

    #[test]
    fn lpush_then_rpop_returns_same_value() {
        let ks = Keyspace::new();
        ks.lpush("l", &[Bytes::from("only")]).unwrap();
        assert_eq!(ks.rpop("l").unwrap(), Some(Bytes::from("only")));
    }

    #[test]
    fn rpush_then_lpop_returns_same_value() {
        let ks = Keyspace::new();
        ks.rpush("l", &[Bytes::from("only")]).unwrap();
        assert_eq!(ks.lpop("l").unwrap(), Some(Bytes::from("only")));
    }

    #[test]
    fn pop_from_missing_key_is_nil() {
        let ks = Keyspace::new();
        assert_eq!(ks.lpop("nope").unwrap(), None);
        assert_eq!(ks.rpop("nope").unwrap(), None);
    }

    #[test]
    fn emptied_list_is_removed() {
        let ks = Keyspace::new();
        ks.rpush("l", &[Bytes::from("a")]).unwrap();
        assert_eq!(ks.lpop("l").unwrap(), Some(Bytes::from("a")));
        assert!(ks.keys().is_empty());
        assert_eq!(ks.len(), 0);
    }

    #[test]
    fn llen_counts_and_defaults_to_zero() {
        let ks = Keyspace::new();
        assert_eq!(ks.llen("nope").unwrap(), 0);
        ks.rpush("l", &[Bytes::from("a"), Bytes::from("b")]).unwrap();
        assert_eq!(ks.llen("l").unwrap(), 2);
    }

    #[test]
    fn lrange_negative_indices() {
        let ks = Keyspace::new();
        ks.rpush("l", &[Bytes::from("a"), Bytes::from("b"), Bytes::from("c")])
            .unwrap();
        assert_eq!(
            ks.lrange("l", -2, -1).unwrap(),
            vec![Bytes::from("b"), Bytes::from("c")]
        );
    }

    #[test]
    fn lrange_clamps_out_of_bounds() {
        let ks = Keyspace::new();
        ks.rpush("l", &[Bytes::from("a"), Bytes::from("b")]).unwrap();
        assert_eq!(ks.lrange("l", -100, 100).unwrap().len(), 2);
    }

    #[test]
    fn lrange_inverted_range_is_empty() {
        let ks = Keyspace::new();
        ks.rpush("l", &[Bytes::from("a"), Bytes::from("b"), Bytes::from("c")])
            .unwrap();
        assert!(ks.lrange("l", 2, 0).unwrap().is_empty());
        assert!(ks.lrange("l", 5, 9).unwrap().is_empty());
    }

    #[test]
    fn lrange_missing_key_is_empty() {
        let ks = Keyspace::new();
        assert!(ks.lrange("nope", 0, -1).unwrap().is_empty());
    }

    #[test]
    fn list_ops_on_string_key_are_type_errors() {
        let ks = Keyspace::new();
        ks.set("s", Bytes::from("val"));
        assert!(ks.lpush("s", &[Bytes::from("x")]).is_err());
        assert!(ks.rpush("s", &[Bytes::from("x")]).is_err());
        assert!(ks.lpop("s").is_err());
        assert!(ks.rpop("s").is_err());
        assert!(ks.llen("s").is_err());
        assert!(ks.lrange("s", 0, -1).is_err());
        // the string is untouched by the failed attempts
        assert_eq!(ks.get("s").unwrap(), Some(Bytes::from("val")));
    }

    #[test]
    fn push_onto_expired_key_starts_fresh() {
        let ks = Keyspace::new();
        ks.set("k", Bytes::from("old"));
        ks.expire("k", 0);
        // the expired string must not produce a type error
        let len = ks.lpush("k", &[Bytes::from("new")]).unwrap();
        assert_eq!(len, 1);
        assert_eq!(ks.ttl("k").as_secs(), -1);
    }
}
