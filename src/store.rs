use std::collections::HashMap;

/// A value recorded under one key, with the weight it was indexed at.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry<V> {
    pub value: V,
    pub score: f64,
}

/// Append-only mapping from normalized key to the entries indexed under it.
///
/// Within a key, entries keep insertion order and no two carry equal values.
#[derive(Debug, Clone)]
pub struct Store<V> {
    buckets: HashMap<String, Vec<StoredEntry<V>>>,
    entries: usize,
}

impl<V> Default for Store<V> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
            entries: 0,
        }
    }
}

impl<V: PartialEq> Store<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` under `key`. Returns `false` when an equal value is
    /// already present; the existing entry keeps its score.
    pub fn insert(&mut self, key: &str, value: V, score: f64) -> bool {
        let bucket = self.buckets.entry(key.to_owned()).or_default();
        if bucket.iter().any(|entry| entry.value == value) {
            return false;
        }
        bucket.push(StoredEntry { value, score });
        self.entries += 1;
        true
    }

    /// Entries under `key` in insertion order; empty when the key is unknown.
    pub fn lookup(&self, key: &str) -> &[StoredEntry<V>] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of entries across all keys.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.buckets.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_key_creates_bucket() {
        let mut store = Store::new();
        assert!(store.insert("chef", "a", 1.0));
        assert_eq!(store.lookup("chef"), &[StoredEntry { value: "a", score: 1.0 }]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicates_are_dropped_without_rescoring() {
        let mut store = Store::new();
        assert!(store.insert("chef", json!({"label": "the chef"}), 0.5));
        assert!(!store.insert("chef", json!({"label": "the chef"}), 1.0));
        let bucket = store.lookup("chef");
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].score, 0.5);
        assert_eq!(store.entry_count(), 1);
    }

    #[test]
    fn distinct_values_append_in_order() {
        let mut store = Store::new();
        store.insert("chef", json!({"id": 1}), 1.0);
        store.insert("chef", json!({"id": 2}), 0.5);
        store.insert("chef", json!({"id": 3}), 1.0);
        let ids: Vec<_> = store
            .lookup("chef")
            .iter()
            .map(|entry| entry.value["id"].as_i64())
            .collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(store.entry_count(), 3);
    }

    #[test]
    fn equality_is_structural_not_key_order() {
        let mut store = Store::new();
        let first: serde_json::Value =
            serde_json::from_str(r#"{"a": 1, "b": [1, 2]}"#).expect("valid json");
        let second: serde_json::Value =
            serde_json::from_str(r#"{"b": [1, 2], "a": 1}"#).expect("valid json");
        store.insert("k", first, 1.0);
        assert!(!store.insert("k", second, 1.0));
    }

    #[test]
    fn lookup_of_unknown_key_is_empty() {
        let store: Store<String> = Store::new();
        assert!(store.lookup("missing").is_empty());
        assert!(store.is_empty());
    }
}
