//! Change-tracking attribute map.
//!
//! A record's attributes are snapshotted into a [`ControlMap`] at pipeline
//! entry. The map behaves like an ordinary string-keyed mapping but records
//! which keys the transform modified and which it removed, so that only the
//! delta needs to be applied back to the record store.

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// String-keyed mapping that tracks modified and removed keys.
///
/// The modified and removed key sets are always disjoint: removing a key
/// clears any modified-mark, and setting a key after removal re-marks it as
/// modified and clears the removed-mark. Setting a key to `None` is
/// equivalent to removing it.
#[derive(Debug, Clone, Default)]
pub struct ControlMap {
    entries: IndexMap<String, String>,
    modified: HashSet<String>,
    removed: HashSet<String>,
}

impl ControlMap {
    /// Snapshot the record's current attributes into a fresh map with
    /// empty modified and removed sets.
    pub fn new(snapshot: &HashMap<String, String>) -> Self {
        Self {
            entries: snapshot
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            modified: HashSet::new(),
            removed: HashSet::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Store a value and mark the key as modified, or remove the key when
    /// `value` is `None`. Returns the previous value, if any.
    pub fn set<K, V>(&mut self, key: K, value: Option<V>) -> Option<String>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        match value {
            None => self.remove(&key),
            Some(value) => {
                self.removed.remove(&key);
                self.modified.insert(key.clone());
                self.entries.insert(key, value.into())
            }
        }
    }

    /// Remove a key, marking it as removed and clearing any modified-mark.
    /// Returns the previous value, if any.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.modified.remove(key);
        self.removed.insert(key.to_string());
        self.entries.shift_remove(key)
    }

    /// Empty the map, marking every currently-present key as removed.
    pub fn clear(&mut self) {
        self.removed.extend(self.entries.keys().cloned());
        self.modified.clear();
        self.entries.clear();
    }

    /// Apply [`ControlMap::set`] for each entry.
    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// Keys set since creation (excluding keys removed afterwards).
    pub fn modified_keys(&self) -> &HashSet<String> {
        &self.modified
    }

    /// Keys removed since creation (excluding keys set afterwards).
    pub fn removed_keys(&self) -> &HashSet<String> {
        &self.removed
    }

    /// Consume the map into the delta to apply to the record store:
    /// removed keys as a bulk removal, modified keys as upserts with their
    /// current values. Upserts keep the map's insertion order.
    pub fn into_delta(self) -> AttributeDelta {
        let mut upserts = IndexMap::new();
        for (key, value) in self.entries {
            if self.modified.contains(&key) {
                upserts.insert(key, value);
            }
        }
        AttributeDelta {
            removed: self.removed,
            upserts,
        }
    }
}

impl FromIterator<(String, String)> for ControlMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            modified: HashSet::new(),
            removed: HashSet::new(),
        }
    }
}

/// Attribute changes accumulated by one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDelta {
    /// Keys to remove from the record store in bulk.
    pub removed: HashSet<String>,
    /// Keys to insert or update, with their text values.
    pub upserts: IndexMap<String, String>,
}

impl AttributeDelta {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.upserts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(entries: &[(&str, &str)]) -> ControlMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_untouched_map_has_empty_sets() {
        let map = map_with(&[("a", "1"), ("b", "2")]);
        assert_eq!(map.len(), 2);
        assert!(map.modified_keys().is_empty());
        assert!(map.removed_keys().is_empty());
    }

    #[test]
    fn test_set_marks_modified() {
        let mut map = map_with(&[("a", "1")]);
        map.set("a", Some("2"));
        map.set("b", Some("3"));
        assert_eq!(map.get("a"), Some("2"));
        assert_eq!(map.get("b"), Some("3"));
        assert!(map.modified_keys().contains("a"));
        assert!(map.modified_keys().contains("b"));
        assert!(map.removed_keys().is_empty());
    }

    #[test]
    fn test_remove_marks_removed_and_clears_modified() {
        let mut map = map_with(&[("a", "1")]);
        map.set("a", Some("2"));
        map.remove("a");
        assert_eq!(map.get("a"), None);
        assert!(map.modified_keys().is_empty());
        assert!(map.removed_keys().contains("a"));
    }

    #[test]
    fn test_set_none_equals_remove() {
        let mut via_none = map_with(&[("a", "1")]);
        let mut via_remove = map_with(&[("a", "1")]);
        via_none.set("a", None::<String>);
        via_remove.remove("a");
        assert_eq!(via_none.get("a"), via_remove.get("a"));
        assert_eq!(via_none.modified_keys(), via_remove.modified_keys());
        assert_eq!(via_none.removed_keys(), via_remove.removed_keys());
    }

    #[test]
    fn test_remove_absent_key_still_marks_removed() {
        let mut map = map_with(&[]);
        assert_eq!(map.remove("ghost"), None);
        assert!(map.removed_keys().contains("ghost"));
    }

    #[test]
    fn test_clear_marks_all_present_keys_removed() {
        let mut map = map_with(&[("a", "1"), ("b", "2")]);
        map.set("c", Some("3"));
        map.clear();
        assert!(map.is_empty());
        assert!(map.modified_keys().is_empty());
        for key in ["a", "b", "c"] {
            assert!(map.removed_keys().contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_set_after_remove_restores_modified_only() {
        // set "x"="1", remove, set "x"="2": modified={x}, removed={}
        let mut map = map_with(&[]);
        map.set("x", Some("1"));
        map.remove("x");
        map.set("x", Some("2"));
        assert_eq!(map.get("x"), Some("2"));
        assert!(map.modified_keys().contains("x"));
        assert!(map.removed_keys().is_empty());
    }

    #[test]
    fn test_modified_and_removed_stay_disjoint() {
        let ops: &[(&str, Option<&str>)] = &[
            ("a", Some("1")),
            ("b", Some("2")),
            ("a", None),
            ("c", Some("3")),
            ("a", Some("4")),
            ("b", None),
            ("b", Some("5")),
            ("c", None),
        ];
        let mut map = map_with(&[("seed", "0")]);
        for (key, value) in ops {
            map.set(*key, *value);
            let overlap: Vec<_> = map
                .modified_keys()
                .intersection(map.removed_keys())
                .collect();
            assert!(overlap.is_empty(), "overlap after {key:?}: {overlap:?}");
        }
        map.clear();
        let overlap: Vec<_> = map
            .modified_keys()
            .intersection(map.removed_keys())
            .collect();
        assert!(overlap.is_empty());
    }

    #[test]
    fn test_extend_applies_set_per_entry() {
        let mut map = map_with(&[("a", "1")]);
        map.extend([("a", None), ("b", Some("2"))]);
        assert_eq!(map.get("a"), None);
        assert_eq!(map.get("b"), Some("2"));
        assert!(map.removed_keys().contains("a"));
        assert!(map.modified_keys().contains("b"));
    }

    #[test]
    fn test_into_delta() {
        let mut map = map_with(&[("keep", "1"), ("gone", "2")]);
        map.set("added", Some("3"));
        map.set("gone", Some("9"));
        map.remove("gone");
        let delta = map.into_delta();
        assert_eq!(delta.upserts.get("added").map(String::as_str), Some("3"));
        assert!(!delta.upserts.contains_key("keep"));
        assert!(!delta.upserts.contains_key("gone"));
        assert!(delta.removed.contains("gone"));
        assert!(!delta.removed.contains("keep"));
    }

    #[test]
    fn test_delta_is_empty_for_untouched_map() {
        let map = map_with(&[("a", "1")]);
        assert!(map.into_delta().is_empty());
    }
}
