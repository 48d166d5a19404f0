//! The search engine: catalog, index cache and personalization in one place.
//!
//! Constructed explicitly with its catalog and storage backend; there is no
//! global instance.

use super::index::IndexCache;
use super::ranker::{self, SearchResult};
use super::suggestions::{self, SearchSuggestion, SuggestionLimits};
use crate::catalog::{Catalog, UtilityDefinition};
use crate::config::{EngineConfig, SearchConfig};
use crate::services::personalization::{PersonalizationSnapshot, PersonalizationStore};
use crate::services::storage::KeyValueStore;

pub struct SearchEngine<S> {
    catalog: Catalog,
    index: IndexCache,
    personalization: PersonalizationStore<S>,
    config: SearchConfig,
}

impl<S: KeyValueStore> SearchEngine<S> {
    /// Build an engine. `config` is clamped with [`EngineConfig::validate`]
    /// first, so hand-built configs get the same limits as loaded ones.
    pub fn new(catalog: Catalog, storage: S, config: &EngineConfig) -> Self {
        let mut config = config.clone();
        config.validate();

        let mut index = IndexCache::new();
        index.get(&catalog);

        Self {
            catalog,
            index,
            personalization: PersonalizationStore::new(storage, &config.personalization),
            config: config.search,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Swap in a new catalog. The index is rebuilt on the next search.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        tracing::debug!(utilities = catalog.len(), "Replacing catalog");
        self.catalog = catalog;
    }

    /// Ranked results for `query`, capped at `max_results`.
    pub fn rank(&mut self, query: &str) -> Vec<SearchResult> {
        let personal = self.personalization.snapshot();
        let index = self.index.get(&self.catalog);

        let mut results = ranker::rank(query, index, &personal);
        results.truncate(self.config.max_results);
        results
    }

    /// Typed suggestions for `query`.
    pub fn suggest(&mut self, query: &str) -> Vec<SearchSuggestion> {
        let personal = self.personalization.snapshot();
        let index = self.index.get(&self.catalog);

        suggestions::suggest(query, index, &personal, SuggestionLimits::from(&self.config))
    }

    pub fn record_use(&mut self, utility_id: &str) {
        self.personalization.record_use(utility_id);
    }

    /// Flip favorite membership. Returns whether the utility is now a favorite.
    pub fn toggle_favorite(&mut self, utility_id: &str) -> bool {
        self.personalization.toggle_favorite(utility_id)
    }

    pub fn is_favorite(&self, utility_id: &str) -> bool {
        self.personalization.is_favorite(utility_id)
    }

    pub fn clear_history(&mut self) {
        self.personalization.clear_history();
    }

    pub fn recently_used(&self) -> Vec<UtilityDefinition> {
        self.personalization.recently_used(&self.catalog)
    }

    pub fn favorites(&self) -> Vec<UtilityDefinition> {
        self.personalization.favorites(&self.catalog)
    }

    pub fn personalization_snapshot(&self) -> PersonalizationSnapshot {
        self.personalization.snapshot()
    }

    pub fn personalization(&self) -> &PersonalizationStore<S> {
        &self.personalization
    }

    /// Number of index builds so far.
    pub fn index_rebuilds(&self) -> usize {
        self.index.rebuilds()
    }
}
