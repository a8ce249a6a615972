//! Ordered multimap
//!
//! Key to insertion-ordered values, without duplicate values per key.

use std::collections::HashMap;
use std::hash::Hash;

/// Key → ordered sequence of distinct values
#[derive(Debug, Clone)]
pub struct Multimap<K, V> {
    values_by_key: HashMap<K, Vec<V>>,
}

impl<K, V> Default for Multimap<K, V> {
    fn default() -> Self {
        Self {
            values_by_key: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: PartialEq> Multimap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` under `key` unless already present
    pub fn add(&mut self, key: K, value: V) {
        let values = self.values_by_key.entry(key).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    /// Remove `value` from `key`, dropping the key once empty
    pub fn delete(&mut self, key: &K, value: &V) {
        if let Some(values) = self.values_by_key.get_mut(key) {
            values.retain(|v| v != value);
            if values.is_empty() {
                self.values_by_key.remove(key);
            }
        }
    }

    pub fn has(&self, key: &K, value: &V) -> bool {
        self.values_by_key.get(key).is_some_and(|values| values.contains(value))
    }

    pub fn has_key(&self, key: &K) -> bool {
        self.values_by_key.contains_key(key)
    }

    pub fn has_value(&self, value: &V) -> bool {
        self.values_by_key.values().any(|values| values.contains(value))
    }

    /// Values under `key` in insertion order
    pub fn get_values_for_key(&self, key: &K) -> &[V] {
        self.values_by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_keys_for_value(&self, value: &V) -> Vec<&K> {
        self.values_by_key.iter()
            .filter(|(_, values)| values.contains(value))
            .map(|(key, _)| key)
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.values_by_key.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.values_by_key.values().flatten()
    }

    /// Total number of values
    pub fn size(&self) -> usize {
        self.values_by_key.values().map(Vec::len).sum()
    }
}
