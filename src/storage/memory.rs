//! In-memory store.

use std::collections::BTreeMap;

use crate::RadarResult;

use super::KeyValueStore;

/// [`KeyValueStore`] backed by a `BTreeMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> RadarResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> RadarResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> RadarResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self, prefix: &str) -> RadarResult<Vec<String>> {
        Ok(self
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_scan() {
        let mut store = MemoryStore::new();
        store.set("ai_score_b", "1").unwrap();
        store.set("ai_score_a", "2").unwrap();
        store.set("theme", "dark").unwrap();
        store.set("ai_scorf", "x").unwrap();

        assert_eq!(store.keys("ai_score_").unwrap(), vec!["ai_score_a", "ai_score_b"]);
        assert_eq!(store.keys("").unwrap().len(), 4);
        assert!(store.remove("theme").unwrap());
        assert!(!store.remove("theme").unwrap());
        assert_eq!(store.get("ai_score_a").unwrap().as_deref(), Some("2"));
    }
}
