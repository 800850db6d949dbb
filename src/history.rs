use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::metadata::RenderConfig;
use crate::persist::{Persistence, HISTORY_KEY};

pub const MAX_HISTORY: usize = 20;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub config: RenderConfig,
}

impl HistoryEntry {
    pub fn new(text: impl Into<String>, config: RenderConfig, created_at: DateTime<Utc>) -> Self {
        Self { id: Uuid::new_v4().to_string(), text: text.into(), created_at, config }
    }

    pub fn same_code(&self, text: &str, config: &RenderConfig) -> bool {
        self.text == text && self.config == *config
    }
}

// History store
//------------------------------------------------------------------------------

/// Bounded most-recently-exported log, newest first, persisted under [`HISTORY_KEY`].
pub struct HistoryStore<S> {
    store: S,
    entries: Vec<HistoryEntry>,
}

impl<S: Persistence> HistoryStore<S> {
    /// Loads persisted entries. Unreadable history is logged and replaced by an empty one.
    pub fn load(store: S) -> Self {
        let entries = match Self::read(&store) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable history");
                Vec::new()
            }
        };
        Self { store, entries }
    }

    fn read(store: &S) -> StoreResult<Vec<HistoryEntry>> {
        let Some(json) = store.load(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<HistoryEntry> = serde_json::from_str(&json)?;
        entries.truncate(MAX_HISTORY);
        Ok(entries)
    }

    /// Saves `entries` and only then makes them current, so a failed write leaves memory
    /// matching what is on disk.
    fn commit(&mut self, entries: Vec<HistoryEntry>) -> StoreResult<()> {
        self.store.save(HISTORY_KEY, &serde_json::to_string(&entries)?)?;
        self.entries = entries;
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records an export. A duplicate `(text, config)` moves to the front with a refreshed
    /// timestamp and keeps its id; otherwise a new entry is inserted and the oldest beyond
    /// [`MAX_HISTORY`] evicted. Returns the id of the front entry.
    pub fn add(&mut self, text: &str, config: RenderConfig, now: DateTime<Utc>) -> StoreResult<String> {
        let mut entries = self.entries.clone();
        let entry = match entries.iter().position(|e| e.same_code(text, &config)) {
            Some(i) => {
                let mut entry = entries.remove(i);
                entry.created_at = now;
                entry
            }
            None => HistoryEntry::new(text, config, now),
        };
        let id = entry.id.clone();

        entries.insert(0, entry);
        if entries.len() > MAX_HISTORY {
            let evicted = entries.split_off(MAX_HISTORY);
            tracing::debug!(evicted = evicted.len(), "History full, evicting oldest");
        }

        self.commit(entries)?;
        Ok(id)
    }

    pub fn remove(&mut self, id: &str) -> StoreResult<Option<HistoryEntry>> {
        let Some(i) = self.entries.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        let mut entries = self.entries.clone();
        let entry = entries.remove(i);
        self.commit(entries)?;
        Ok(Some(entry))
    }

    pub fn clear(&mut self) -> StoreResult<()> {
        self.store.remove(HISTORY_KEY)?;
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod history_tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use std::cell::Cell;

    use super::{HistoryStore, MAX_HISTORY};
    use crate::color::Color;
    use crate::error::{StoreError, StoreResult};
    use crate::metadata::{ECLevel, RenderConfig};
    use crate::persist::{MemoryStore, Persistence, HISTORY_KEY};

    /// Wraps a store; writes fail while `broken` is set.
    struct Flaky {
        inner: MemoryStore,
        broken: Cell<bool>,
    }

    impl Flaky {
        fn new() -> Self {
            Self { inner: MemoryStore::new(), broken: Cell::new(false) }
        }

        fn check(&self) -> StoreResult<()> {
            if self.broken.get() {
                return Err(StoreError::Io("disk full".to_string()));
            }
            Ok(())
        }
    }

    impl Persistence for Flaky {
        fn load(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.load(key)
        }

        fn save(&self, key: &str, value: &str) -> StoreResult<()> {
            self.check()?;
            self.inner.save(key, value)
        }

        fn remove(&self, key: &str) -> StoreResult<()> {
            self.check()?;
            self.inner.remove(key)
        }
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_dedup_moves_to_front_and_refreshes() {
        let mut history = HistoryStore::load(MemoryStore::new());
        let cfg = RenderConfig::default();
        let first = history.add("a", cfg, t(0)).unwrap();
        history.add("b", cfg, t(1)).unwrap();
        let again = history.add("a", cfg, t(2)).unwrap();

        assert_eq!(first, again);
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].text, "a");
        assert_eq!(history.entries()[0].created_at, t(2));
        assert_eq!(history.entries()[1].text, "b");
    }

    #[test]
    fn test_different_config_is_not_duplicate() {
        let mut history = HistoryStore::load(MemoryStore::new());
        let cfg = RenderConfig::default();
        history.add("a", cfg, t(0)).unwrap();
        history.add("a", RenderConfig { ec_level: ECLevel::H, ..cfg }, t(1)).unwrap();
        history.add("a", RenderConfig { dark: Color::BLACK, ..cfg }, t(2)).unwrap();
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_bound_evicts_oldest() {
        let mut history = HistoryStore::load(MemoryStore::new());
        for i in 0..25 {
            history.add(&format!("text {i}"), RenderConfig::default(), t(i)).unwrap();
        }
        assert_eq!(history.len(), MAX_HISTORY);
        let texts: Vec<&str> = history.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts[0], "text 24");
        assert_eq!(texts[MAX_HISTORY - 1], "text 5");
        assert!(!texts.contains(&"text 4"));
    }

    #[test]
    fn test_remove_and_clear() {
        let store = MemoryStore::new();
        let mut history = HistoryStore::load(&store);
        let a = history.add("a", RenderConfig::default(), t(0)).unwrap();
        history.add("b", RenderConfig::default(), t(1)).unwrap();

        assert_eq!(history.remove(&a).unwrap().map(|e| e.text), Some("a".to_string()));
        assert_eq!(history.remove(&a).unwrap(), None);
        assert_eq!(history.len(), 1);

        history.clear().unwrap();
        assert!(history.is_empty());
        assert_eq!(store.load(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn test_persists_across_reload() {
        let store = MemoryStore::new();
        {
            let mut history = HistoryStore::load(&store);
            history.add("a", RenderConfig::default(), t(0)).unwrap();
            history.add("b", RenderConfig::default(), t(1)).unwrap();
        }
        let history = HistoryStore::load(&store);
        let texts: Vec<&str> = history.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["b", "a"]);
        assert_eq!(history.entries()[1].created_at, t(0));
    }

    #[test]
    fn test_corrupted_history_loads_empty() {
        let store = MemoryStore::new();
        store.save(HISTORY_KEY, "[{\"nope\":").unwrap();
        assert!(HistoryStore::load(&store).is_empty());
    }

    #[test]
    fn test_failed_write_leaves_entries_untouched() {
        let store = Flaky::new();
        let mut history = HistoryStore::load(&store);
        let cfg = RenderConfig::default();
        let a = history.add("a", cfg, t(0)).unwrap();
        history.add("b", cfg, t(1)).unwrap();
        let before = history.entries().to_vec();

        store.broken.set(true);
        assert!(history.add("c", cfg, t(2)).is_err());
        assert!(history.add("a", cfg, t(3)).is_err());
        assert!(history.remove(&a).is_err());
        assert!(history.clear().is_err());
        assert_eq!(history.entries(), &before[..]);

        store.broken.set(false);
        let reloaded = HistoryStore::load(&store);
        assert_eq!(reloaded.entries(), &before[..]);
    }
}
