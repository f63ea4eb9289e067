// bulk.rs — Whole-namespace helpers built on keys/get/set/has.
//
// Callbacks run against a snapshot of the working node taken before the
// first call, so they are free to read or write through any handle on the
// same store.

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::key::Key;
use crate::namespace::Namespace;
use crate::tree::{self, NodeKind};

impl Namespace {
    fn entries(&self) -> Result<(NodeKind, Vec<(Key, Value)>), StoreError> {
        tree::into_entries(self.data()?, self.path())
    }

    /// Call `f(value, key)` for every entry, in enumeration order.
    pub fn for_each<F>(&self, mut f: F) -> Result<(), StoreError>
    where
        F: FnMut(&Value, &Key),
    {
        let (_, entries) = self.entries()?;
        for (key, value) in &entries {
            f(value, key);
        }
        Ok(())
    }

    /// A new list or mapping (same kind as this node) of `f(value, key)`.
    pub fn map<F>(&self, mut f: F) -> Result<Value, StoreError>
    where
        F: FnMut(&Value, &Key) -> Value,
    {
        let (kind, entries) = self.entries()?;
        Ok(match kind {
            NodeKind::List => Value::Array(entries.iter().map(|(k, v)| f(v, k)).collect()),
            _ => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.as_name(), f(v, k)))
                    .collect::<Map<String, Value>>(),
            ),
        })
    }

    /// Replace every entry with `f(value, key)` in the working node.
    /// Returns a handle on this namespace for chaining.
    pub fn map_in_place<F>(&self, mut f: F) -> Result<Namespace, StoreError>
    where
        F: FnMut(&Value, &Key) -> Value,
    {
        let (_, entries) = self.entries()?;
        for (key, value) in &entries {
            self.set(key, f(value, key))?;
        }
        Ok(self.clone())
    }

    /// A new list or mapping holding only entries where `f(value, key)` is
    /// true. Lists are re-indexed densely. The working node is untouched.
    pub fn filter<F>(&self, mut f: F) -> Result<Value, StoreError>
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        let (kind, entries) = self.entries()?;
        let kept = entries.into_iter().filter(|(k, v)| f(v, k));
        Ok(match kind {
            NodeKind::List => Value::Array(kept.map(|(_, v)| v).collect()),
            _ => Value::Object(kept.map(|(k, v)| (k.as_name(), v)).collect()),
        })
    }

    /// First unused key among `base{sep}1`, `base{sep}2`, ...
    ///
    /// With `first_clean`, the bare `base` is tried first and counts as the
    /// first candidate, so suffixes then start at 2. The scan is strictly
    /// sequential and reserves nothing.
    pub fn find_free_key(
        &self,
        base: &str,
        separator: &str,
        first_clean: bool,
    ) -> Result<String, StoreError> {
        if first_clean && !self.has(base)? {
            return Ok(base.to_string());
        }
        let mut n: usize = if first_clean { 2 } else { 1 };
        loop {
            let candidate = format!("{}{}{}", base, separator, n);
            if !self.has(candidate.as_str())? {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde_json::json;

    fn store(data: Value) -> Namespace {
        Namespace::with_data("bulk", data, MemoryBackend::new()).unwrap()
    }

    #[test]
    fn for_each_visits_in_order() {
        let s = store(json!({"b": 1, "a": 2}));
        let mut seen = Vec::new();
        s.for_each(|v, k| seen.push((k.as_name(), v.clone()))).unwrap();
        assert_eq!(seen, vec![("b".to_string(), json!(1)), ("a".to_string(), json!(2))]);
    }

    #[test]
    fn map_keeps_node_kind() {
        let s = store(json!({"list": [1, 2, 3], "obj": {"x": 1, "y": 2}}));
        let doubled = s
            .ns("list")
            .map(|v, _| json!(v.as_i64().unwrap_or(0) * 2))
            .unwrap();
        assert_eq!(doubled, json!([2, 4, 6]));
        let keyed = s.ns("obj").map(|_, k| json!(k.to_string())).unwrap();
        assert_eq!(keyed, json!({"x": "x", "y": "y"}));
        assert!(!s.changed().unwrap());
    }

    #[test]
    fn map_in_place_mutates_and_chains() {
        let s = store(json!({"obj": {"x": 1, "y": 2}}));
        let expected = s.ns("obj").map(|v, _| json!(v.as_i64().unwrap_or(0) + 10)).unwrap();
        let handle = s
            .ns("obj")
            .map_in_place(|v, _| json!(v.as_i64().unwrap_or(0) + 10))
            .unwrap();
        assert_eq!(handle.data().unwrap(), expected);
        assert_eq!(s.ns("obj").data().unwrap(), json!({"x": 11, "y": 12}));
        assert!(s.changed().unwrap());
    }

    #[test]
    fn filter_does_not_mutate() {
        let s = store(json!({"list": [1, 2, 3, 4], "obj": {"keep": true, "drop": false}}));
        let evens = s
            .ns("list")
            .filter(|v, _| v.as_i64().is_some_and(|n| n % 2 == 0))
            .unwrap();
        assert_eq!(evens, json!([2, 4]));
        let kept = s.ns("obj").filter(|v, _| v == &json!(true)).unwrap();
        assert_eq!(kept, json!({"keep": true}));
        assert!(!s.changed().unwrap());
    }

    #[test]
    fn bulk_on_leaf_is_not_composite() {
        let s = store(json!({"leaf": 1}));
        assert!(matches!(
            s.ns("leaf").map(|v, _| v.clone()),
            Err(StoreError::NotComposite { .. })
        ));
    }

    #[test]
    fn find_free_key_scans_sequentially_and_reuses_gaps() {
        let s = store(json!({}));
        assert_eq!(s.find_free_key("item", "", false).unwrap(), "item1");
        s.set("item1", "").unwrap();
        assert_eq!(s.find_free_key("item", "", false).unwrap(), "item2");
        s.set("item3", "").unwrap();
        assert_eq!(s.find_free_key("item", "", false).unwrap(), "item2");
        s.set("item2", "").unwrap();
        assert_eq!(s.find_free_key("item", "", false).unwrap(), "item4");
        s.unset("item1").unwrap();
        assert_eq!(s.find_free_key("item", "", false).unwrap(), "item1");
    }

    #[test]
    fn find_free_key_first_clean() {
        let s = store(json!({}));
        assert_eq!(s.find_free_key("item", "", true).unwrap(), "item");
        s.set("item", 1).unwrap();
        assert_eq!(s.find_free_key("item", "", true).unwrap(), "item2");
        assert_eq!(s.find_free_key("item", "-", false).unwrap(), "item-1");
    }
}
