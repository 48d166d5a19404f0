//! Recently used and favorite utilities.
//!
//! Both collections live in one JSON record under a single storage key:
//!
//! ```json
//! { "recent": [{ "utilityId": "json-formatter", "lastUsedAt": 1760000000000 }],
//!   "favorites": ["word-counter"] }
//! ```
//!
//! Keeping them together makes clearing history a single `remove`, so a
//! half-cleared state is never persisted. The record is loaded lazily on first
//! access. Missing or unreadable data starts empty.
//!
//! Storage failures are never returned to callers. The first failure switches
//! the store to memory-only for the rest of its lifetime.

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use super::storage::KeyValueStore;
use crate::catalog::{Catalog, UtilityDefinition};
use crate::config::PersonalizationConfig;
use crate::error::StorageError;

/// One recently used utility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEntry {
    pub utility_id: String,
    /// Unix timestamp in milliseconds.
    pub last_used_at: u64,
}

/// Persisted shape of the personalization record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct PersonalizationRecord {
    /// Most recent first, no duplicate ids.
    recent: Vec<RecentEntry>,
    /// Insertion order, oldest first.
    favorites: Vec<String>,
}

impl PersonalizationRecord {
    /// Drop duplicates and blank ids, and enforce the recents bound.
    fn normalize(&mut self, max_recent: usize) {
        let mut seen = HashSet::new();
        self.recent
            .retain(|e| !e.utility_id.is_empty() && seen.insert(e.utility_id.clone()));
        self.recent.truncate(max_recent);

        let mut seen = HashSet::new();
        self.favorites
            .retain(|id| !id.is_empty() && seen.insert(id.clone()));
    }

    fn touch(&mut self, utility_id: &str, at: u64, max_recent: usize) {
        self.recent.retain(|e| e.utility_id != utility_id);
        self.recent.insert(
            0,
            RecentEntry {
                utility_id: utility_id.to_string(),
                last_used_at: at,
            },
        );
        self.recent.truncate(max_recent);
    }

    /// Flip favorite membership. Returns whether it is now a favorite.
    fn toggle_favorite(&mut self, utility_id: &str) -> bool {
        if let Some(pos) = self.favorites.iter().position(|id| id == utility_id) {
            self.favorites.remove(pos);
            false
        } else {
            self.favorites.push(utility_id.to_string());
            true
        }
    }
}

/// Read-only copy of the personalization state, used for tie-breaking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonalizationSnapshot {
    recent: Vec<String>,
    favorites: Vec<String>,
}

impl PersonalizationSnapshot {
    pub fn new(recent: Vec<String>, favorites: Vec<String>) -> Self {
        Self { recent, favorites }
    }

    pub fn is_recent(&self, utility_id: &str) -> bool {
        self.recent.iter().any(|id| id == utility_id)
    }

    pub fn is_favorite(&self, utility_id: &str) -> bool {
        self.favorites.iter().any(|id| id == utility_id)
    }

    /// Recently used or favorite.
    pub fn is_personalized(&self, utility_id: &str) -> bool {
        self.is_recent(utility_id) || self.is_favorite(utility_id)
    }

    pub fn recent_ids(&self) -> &[String] {
        &self.recent
    }

    pub fn favorite_ids(&self) -> &[String] {
        &self.favorites
    }
}

/// Recents and favorites, written through to a [`KeyValueStore`].
pub struct PersonalizationStore<S> {
    storage: S,
    key: String,
    max_recent: usize,
    state: OnceCell<PersonalizationRecord>,
    /// Set after the first storage failure.
    degraded: Cell<bool>,
}

impl<S: KeyValueStore> PersonalizationStore<S> {
    pub fn new(storage: S, config: &PersonalizationConfig) -> Self {
        Self {
            storage,
            key: config.storage_key.clone(),
            max_recent: config.max_recent.max(1),
            state: OnceCell::new(),
            degraded: Cell::new(false),
        }
    }

    /// Record a use of `utility_id`, moving it to the front of the recents.
    pub fn record_use(&mut self, utility_id: &str) {
        self.record_use_at(utility_id, now_millis());
    }

    /// Like [`record_use`](Self::record_use) with an explicit timestamp.
    pub fn record_use_at(&mut self, utility_id: &str, at: u64) {
        if utility_id.is_empty() {
            return;
        }
        let max_recent = self.max_recent;
        self.update(|record| record.touch(utility_id, at, max_recent));
    }

    /// Flip favorite membership. Returns whether the utility is now a favorite.
    pub fn toggle_favorite(&mut self, utility_id: &str) -> bool {
        if utility_id.is_empty() {
            return false;
        }
        let mut now_favorite = false;
        self.update(|record| now_favorite = record.toggle_favorite(utility_id));
        now_favorite
    }

    pub fn is_favorite(&self, utility_id: &str) -> bool {
        self.record().favorites.iter().any(|id| id == utility_id)
    }

    /// Empty both recents and favorites.
    ///
    /// The stored record is removed even after the store has degraded, so
    /// history from before a failed write does not come back next session.
    pub fn clear_history(&mut self) {
        self.state = OnceCell::with_value(PersonalizationRecord::default());

        if let Err(e) = self.storage.remove(&self.key) {
            self.degrade(&e);
        }
    }

    /// Raw recents, most recent first, including ids not in any catalog.
    pub fn recent_entries(&self) -> &[RecentEntry] {
        &self.record().recent
    }

    /// Recently used utilities, most recent first. Ids missing from `catalog`
    /// are skipped.
    pub fn recently_used(&self, catalog: &Catalog) -> Vec<UtilityDefinition> {
        self.record()
            .recent
            .iter()
            .filter_map(|e| catalog.get(&e.utility_id).cloned())
            .collect()
    }

    /// Favorite utilities in the order they were added. Ids missing from
    /// `catalog` are skipped.
    pub fn favorites(&self, catalog: &Catalog) -> Vec<UtilityDefinition> {
        self.record()
            .favorites
            .iter()
            .filter_map(|id| catalog.get(id).cloned())
            .collect()
    }

    pub fn snapshot(&self) -> PersonalizationSnapshot {
        let record = self.record();
        PersonalizationSnapshot::new(
            record.recent.iter().map(|e| e.utility_id.clone()).collect(),
            record.favorites.clone(),
        )
    }

    /// Whether changes are still being written to storage.
    pub fn is_persistent(&self) -> bool {
        !self.degraded.get()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn record(&self) -> &PersonalizationRecord {
        self.state.get_or_init(|| self.load())
    }

    /// Apply `change` to the record and write it through.
    fn update(&mut self, change: impl FnOnce(&mut PersonalizationRecord)) {
        let mut record = match self.state.take() {
            Some(record) => record,
            None => self.load(),
        };
        change(&mut record);
        self.persist(&record);
        self.state = OnceCell::with_value(record);
    }

    fn load(&self) -> PersonalizationRecord {
        if self.degraded.get() {
            return PersonalizationRecord::default();
        }

        match self.storage.get(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str::<PersonalizationRecord>(&raw) {
                Ok(mut record) => {
                    record.normalize(self.max_recent);
                    record
                }
                Err(e) => {
                    tracing::warn!(key = %self.key, "Discarding unreadable personalization data: {}", e);
                    PersonalizationRecord::default()
                }
            },
            Ok(None) => PersonalizationRecord::default(),
            Err(e) => {
                self.degrade(&e);
                PersonalizationRecord::default()
            }
        }
    }

    fn persist(&mut self, record: &PersonalizationRecord) {
        if self.degraded.get() {
            return;
        }

        let result = serde_json::to_string(record)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set(&self.key, &json));

        if let Err(e) = result {
            self.degrade(&e);
        }
    }

    fn degrade(&self, error: &StorageError) {
        if !self.degraded.replace(true) {
            tracing::warn!(
                key = %self.key,
                "Personalization storage failed, keeping history in memory only: {}",
                error
            );
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::services::storage::MemoryStore;

    const KEY: &str = "toolbox.personalization";

    fn catalog() -> Catalog {
        Catalog::new(vec![
            UtilityDefinition::new("json-formatter", "JSON Formatter", Category::Developer),
            UtilityDefinition::new("word-counter", "Word Counter", Category::Text),
            UtilityDefinition::new("tip-calculator", "Tip Calculator", Category::Calculator),
        ])
    }

    fn store(storage: MemoryStore) -> PersonalizationStore<MemoryStore> {
        PersonalizationStore::new(storage, &PersonalizationConfig::default())
    }

    fn ids(utilities: &[UtilityDefinition]) -> Vec<&str> {
        utilities.iter().map(|u| u.id.as_str()).collect()
    }

    /// Fails every write after the first `ok_writes` succeed.
    struct FlakyStore {
        inner: MemoryStore,
        ok_writes: usize,
        attempts: usize,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.attempts += 1;
            if self.attempts > self.ok_writes {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    limit: 0,
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.attempts += 1;
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_record_use_moves_to_front() {
        let mut store = store(MemoryStore::new());

        store.record_use("json-formatter");
        store.record_use("word-counter");
        assert_eq!(
            ids(&store.recently_used(&catalog())),
            vec!["word-counter", "json-formatter"]
        );

        store.record_use("json-formatter");
        assert_eq!(
            ids(&store.recently_used(&catalog())),
            vec!["json-formatter", "word-counter"]
        );
        assert_eq!(store.recent_entries().len(), 2);
        assert_eq!(
            store.snapshot().recent_ids(),
            ["json-formatter", "word-counter"]
        );
    }

    #[test]
    fn test_repeat_use_updates_timestamp() {
        let mut store = store(MemoryStore::new());
        store.record_use_at("json-formatter", 1_000);
        store.record_use_at("json-formatter", 2_000);

        assert_eq!(
            store.recent_entries(),
            &[RecentEntry {
                utility_id: "json-formatter".to_string(),
                last_used_at: 2_000,
            }]
        );
    }

    #[test]
    fn test_recents_are_bounded() {
        let config = PersonalizationConfig {
            max_recent: 3,
            ..PersonalizationConfig::default()
        };
        let mut store = PersonalizationStore::new(MemoryStore::new(), &config);

        for i in 0..10 {
            store.record_use(&format!("tool-{}", i));
        }

        let recent: Vec<&str> = store
            .recent_entries()
            .iter()
            .map(|e| e.utility_id.as_str())
            .collect();
        assert_eq!(recent, vec!["tool-9", "tool-8", "tool-7"]);
    }

    #[test]
    fn test_unknown_ids_are_skipped_on_resolve() {
        let mut store = store(MemoryStore::new());
        store.record_use("retired-tool");
        store.record_use("word-counter");
        store.toggle_favorite("retired-tool");

        assert_eq!(ids(&store.recently_used(&catalog())), vec!["word-counter"]);
        assert!(store.favorites(&catalog()).is_empty());
        assert_eq!(store.recent_entries().len(), 2);
    }

    #[test]
    fn test_toggle_favorite_twice_restores() {
        let mut store = store(MemoryStore::new());

        assert!(store.toggle_favorite("word-counter"));
        assert!(store.is_favorite("word-counter"));
        assert!(!store.toggle_favorite("word-counter"));
        assert!(!store.is_favorite("word-counter"));
    }

    #[test]
    fn test_favorites_keep_insertion_order() {
        let mut store = store(MemoryStore::new());
        store.toggle_favorite("word-counter");
        store.toggle_favorite("json-formatter");
        store.toggle_favorite("tip-calculator");

        assert_eq!(
            ids(&store.favorites(&catalog())),
            vec!["word-counter", "json-formatter", "tip-calculator"]
        );
    }

    #[test]
    fn test_clear_history_empties_both() {
        let mut store = store(MemoryStore::new());
        store.record_use("word-counter");
        store.toggle_favorite("json-formatter");

        store.clear_history();

        assert!(store.recently_used(&catalog()).is_empty());
        assert!(store.favorites(&catalog()).is_empty());
        assert_eq!(store.storage().get(KEY).unwrap(), None);
    }

    #[test]
    fn test_state_survives_new_instance() {
        let mut first = store(MemoryStore::new());
        first.record_use("tip-calculator");
        first.toggle_favorite("word-counter");

        let second = store(first.into_storage());
        assert_eq!(ids(&second.recently_used(&catalog())), vec!["tip-calculator"]);
        assert_eq!(ids(&second.favorites(&catalog())), vec!["word-counter"]);
    }

    #[test]
    fn test_loads_lazily_and_normalizes() {
        let mut storage = MemoryStore::new();
        storage
            .set(
                KEY,
                r#"{"recent": [
                    {"utilityId": "word-counter", "lastUsedAt": 3},
                    {"utilityId": "word-counter", "lastUsedAt": 2},
                    {"utilityId": "", "lastUsedAt": 1}
                ], "favorites": ["json-formatter", "json-formatter"]}"#,
            )
            .unwrap();

        let store = store(storage);
        assert_eq!(store.recent_entries().len(), 1);
        assert_eq!(store.recent_entries()[0].last_used_at, 3);
        assert_eq!(store.snapshot().favorite_ids(), ["json-formatter".to_string()]);
    }

    #[test]
    fn test_corrupt_data_starts_empty() {
        let mut storage = MemoryStore::new();
        storage.set(KEY, "[[[ not a record").unwrap();

        let mut store = store(storage);
        assert!(store.recent_entries().is_empty());

        // Still persistent: the next write replaces the corrupt value
        store.record_use("word-counter");
        assert!(store.is_persistent());
        assert!(store.storage().get(KEY).unwrap().unwrap().contains("word-counter"));
    }

    #[test]
    fn test_disabled_storage_degrades_to_memory() {
        let mut store = store(MemoryStore::disabled());

        store.record_use("word-counter");
        store.toggle_favorite("json-formatter");

        assert!(!store.is_persistent());
        assert_eq!(ids(&store.recently_used(&catalog())), vec!["word-counter"]);
        assert_eq!(ids(&store.favorites(&catalog())), vec!["json-formatter"]);

        store.clear_history();
        assert!(store.recently_used(&catalog()).is_empty());
        assert!(store.favorites(&catalog()).is_empty());
    }

    #[test]
    fn test_write_failure_stops_further_writes() {
        let flaky = FlakyStore {
            inner: MemoryStore::new(),
            ok_writes: 1,
            attempts: 0,
        };
        let mut store = PersonalizationStore::new(flaky, &PersonalizationConfig::default());

        store.record_use("word-counter");
        assert!(store.is_persistent());

        store.record_use("json-formatter");
        assert!(!store.is_persistent());

        store.record_use("tip-calculator");
        assert_eq!(store.storage().attempts, 2);

        // Clearing still reaches storage
        store.clear_history();
        assert_eq!(store.storage().attempts, 3);
        assert!(store.recent_entries().is_empty());
        assert_eq!(store.storage().inner.get(KEY).unwrap(), None);
    }

    #[test]
    fn test_clear_after_quota_failure_reaches_storage() {
        let mut personal = store(MemoryStore::with_quota(200));
        personal.toggle_favorite("word-counter");
        personal.record_use("json-formatter");
        assert!(personal.is_persistent());

        personal.record_use(&"x".repeat(200));
        assert!(!personal.is_persistent());

        personal.clear_history();

        let next_session = store(personal.into_storage());
        assert!(next_session.recent_entries().is_empty());
        assert!(next_session.snapshot().favorite_ids().is_empty());
        assert!(next_session.storage().is_empty());
    }

    #[test]
    fn test_quota_exceeded_is_not_an_error() {
        let mut store = store(MemoryStore::with_quota(8));
        store.record_use("json-formatter");

        assert!(!store.is_persistent());
        assert_eq!(ids(&store.recently_used(&catalog())), vec!["json-formatter"]);
    }
}
