use std::collections::BTreeSet;

use super::Keyspace;
use crate::error::WrongType;
use crate::types::Value;

impl Keyspace {
    /// Adds members to a set, creating it if the key is absent.
    /// Returns the number of members that were newly inserted
    /// (duplicates, in the set or in the argument list, don't count).
    pub fn sadd(&self, key: &str, members: &[String]) -> Result<usize, WrongType> {
        {
            let keys = self.keys.read();
            if let Some(entry) = keys.get(key).filter(|e| !e.is_expired()) {
                let mut vals = self.vals.write();
                if let Some(value) = vals.get_mut(entry.slot) {
                    let set = value.as_set_mut()?;
                    return Ok(insert_each(set, members));
                }
            }
        }

        let mut keys = self.keys.write();
        let mut vals = self.vals.write();
        let mut access = self.last_access.write();
        if let Some(entry) = keys.get(key).filter(|e| !e.is_expired()) {
            if let Some(value) = vals.get_mut(entry.slot) {
                let set = value.as_set_mut()?;
                return Ok(insert_each(set, members));
            }
        }
        let mut set = BTreeSet::new();
        let added = insert_each(&mut set, members);
        Self::insert_locked(&mut keys, &mut vals, &mut access, key, Value::Set(set));
        Ok(added)
    }

    /// Removes members from a set. Returns the number actually
    /// removed; 0 if the key is absent. A set emptied by the removal
    /// is itself removed from the keyspace.
    pub fn srem(&self, key: &str, members: &[String]) -> Result<usize, WrongType> {
        let (removed, emptied) = {
            let keys = self.keys.read();
            let Some(entry) = keys.get(key).filter(|e| !e.is_expired()) else {
                return Ok(0);
            };
            let mut vals = self.vals.write();
            let Some(value) = vals.get_mut(entry.slot) else {
                return Ok(0);
            };
            let set = value.as_set_mut()?;
            let removed = members.iter().filter(|m| set.remove(m.as_str())).count();
            (removed, set.is_empty())
        };
        if emptied {
            self.drop_if_empty_collection(key);
        }
        Ok(removed)
    }

    /// Returns the cardinality of a set, or 0 if the key is absent.
    pub fn scard(&self, key: &str) -> Result<usize, WrongType> {
        let keys = self.keys.read();
        let vals = self.vals.read();
        let Some(entry) = keys.get(key).filter(|e| !e.is_expired()) else {
            return Ok(0);
        };
        match vals.get(entry.slot) {
            Some(value) => Ok(value.as_set()?.len()),
            None => Ok(0),
        }
    }

    /// Returns all members of a set in ascending order.
    pub fn smembers(&self, key: &str) -> Result<Vec<String>, WrongType> {
        let keys = self.keys.read();
        let vals = self.vals.read();
        let Some(entry) = keys.get(key).filter(|e| !e.is_expired()) else {
            return Ok(vec![]);
        };
        match vals.get(entry.slot) {
            Some(value) => Ok(value.as_set()?.iter().cloned().collect()),
            None => Ok(vec![]),
        }
    }

    /// Returns the ascending intersection of the named sets.
    ///
    /// If any named key is absent the intersection is empty; if any
    /// holds a non-set value the whole operation is a type error.
    pub fn sinter(&self, names: &[&str]) -> Result<Vec<String>, WrongType> {
        let keys = self.keys.read();
        let vals = self.vals.read();

        let mut sets = Vec::with_capacity(names.len());
        for name in names {
            let Some(entry) = keys.get(*name).filter(|e| !e.is_expired()) else {
                return Ok(vec![]);
            };
            let Some(value) = vals.get(entry.slot) else {
                return Ok(vec![]);
            };
            sets.push(value.as_set()?);
        }
        let Some((first, rest)) = sets.split_first() else {
            return Ok(vec![]);
        };
        Ok(first
            .iter()
            .filter(|member| rest.iter().all(|set| set.contains(member.as_str())))
            .cloned()
            .collect())
    }
}

fn insert_each(set: &mut BTreeSet<String>, members: &[String]) -> usize {
    members.iter().filter(|m| set.insert((*m).clone())).count()
}
