//! In-memory preference backend

use dashmap::DashMap;
use std::collections::BTreeMap;

use crate::storage::{PrefValue, PreferenceBackend};

/// Preference backend kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: DashMap<String, PrefValue>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }

    /// Backend pre-filled with `values`
    pub fn from_map(values: BTreeMap<String, PrefValue>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Sorted copy of every stored entry
    pub fn to_map(&self) -> BTreeMap<String, PrefValue> {
        self.values
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).map(|r| r.value().clone())
    }

    fn apply(&self, key: &str, value: PrefValue) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.values.remove(key);
    }

    fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}
