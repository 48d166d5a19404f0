//! Search controller: the stateful façade the UI layer talks to.
//!
//! The controller is a plain state machine over explicit instants:
//!
//! ```text
//! idle --perform_search--> pending --deadline reached--> settled
//!  ^                        |   ^                          |
//!  |                        +---+ (new query resets timer) |
//!  +---------------- empty query <-------------------------+
//! ```
//!
//! Submitting a query records a deadline `debounce` in the future and replaces
//! any earlier pending query, so only the last query inside the window is ever
//! evaluated. Whoever owns the controller calls [`SearchController::poll_at`]
//! when [`SearchController::next_deadline`] passes; the tokio [`driver`] does
//! exactly that.

#[cfg(feature = "runtime")]
pub mod driver;

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::catalog::{Catalog, UtilityDefinition};
use crate::core::engine::SearchEngine;
use crate::core::ranker::SearchResult;
use crate::core::suggestions::SearchSuggestion;
use crate::services::storage::KeyValueStore;

/// Where the controller is in its search cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchState {
    /// Empty query, no results.
    Idle,
    /// Query submitted, waiting for the debounce deadline.
    Pending,
    /// Results and suggestions computed for the current query.
    Settled,
}

#[derive(Debug, Clone, Copy)]
struct PendingSearch {
    deadline: Instant,
    /// Selections re-run the search without suggestions.
    with_suggestions: bool,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnapshot {
    pub query: String,
    pub state: SearchState,
    pub is_loading: bool,
    pub results: Vec<SearchResult>,
    pub suggestions: Vec<SearchSuggestion>,
    pub recently_used: Vec<UtilityDefinition>,
    pub favorites: Vec<UtilityDefinition>,
    /// Number of searches evaluated so far.
    pub evaluations: u64,
}

impl Default for SearchSnapshot {
    fn default() -> Self {
        Self {
            query: String::new(),
            state: SearchState::Idle,
            is_loading: false,
            results: Vec::new(),
            suggestions: Vec::new(),
            recently_used: Vec::new(),
            favorites: Vec::new(),
            evaluations: 0,
        }
    }
}

pub struct SearchController<S> {
    engine: SearchEngine<S>,
    debounce: Duration,

    query: String,
    state: SearchState,
    pending: Option<PendingSearch>,
    results: Vec<SearchResult>,
    suggestions: Vec<SearchSuggestion>,

    // Cached personalization views
    recently_used: Vec<UtilityDefinition>,
    favorites: Vec<UtilityDefinition>,

    evaluations: u64,
}

impl<S: KeyValueStore> SearchController<S> {
    pub fn new(engine: SearchEngine<S>) -> Self {
        let debounce = engine.config().debounce();
        let mut controller = Self {
            engine,
            debounce,
            query: String::new(),
            state: SearchState::Idle,
            pending: None,
            results: Vec::new(),
            suggestions: Vec::new(),
            recently_used: Vec::new(),
            favorites: Vec::new(),
            evaluations: 0,
        };
        controller.refresh_personalization();
        controller
    }

    /// Submit a query typed by the user.
    pub fn perform_search(&mut self, query: &str) {
        self.perform_search_at(query, Instant::now());
    }

    /// Submit a query as of `now`.
    ///
    /// The query text is updated immediately. Empty or whitespace-only input
    /// cancels any pending search and goes straight to idle.
    pub fn perform_search_at(&mut self, query: &str, now: Instant) {
        self.schedule(query, now, true);
    }

    /// Handle the user picking a suggestion.
    pub fn handle_suggestion_select(&mut self, suggestion: &SearchSuggestion) {
        self.handle_suggestion_select_at(suggestion, Instant::now());
    }

    /// Handle a suggestion pick as of `now`.
    ///
    /// Utility suggestions count as a use. Every selection clears the current
    /// suggestions and searches for the suggestion text without producing new
    /// suggestions. Unknown suggestion types are ignored.
    pub fn handle_suggestion_select_at(&mut self, suggestion: &SearchSuggestion, now: Instant) {
        let Some(text) = suggestion.text() else {
            tracing::debug!(kind = suggestion.kind(), "Ignoring unsupported suggestion");
            return;
        };

        if let SearchSuggestion::Utility { utility, .. } = suggestion {
            self.engine.record_use(&utility.id);
            self.refresh_personalization();
        }

        self.suggestions.clear();
        let text = text.to_string();
        self.schedule(&text, now, false);
    }

    /// Flip favorite membership. Returns whether the utility is now a favorite.
    pub fn toggle_favorite(&mut self, utility_id: &str) -> bool {
        let now_favorite = self.engine.toggle_favorite(utility_id);
        self.refresh_personalization();
        now_favorite
    }

    /// Forget all recents and favorites.
    pub fn clear_history(&mut self) {
        self.engine.clear_history();
        self.refresh_personalization();
    }

    /// Swap in a new catalog. Settled results are recomputed right away so
    /// they never point at utilities that no longer exist.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        self.engine.replace_catalog(catalog);
        self.refresh_personalization();

        if self.state == SearchState::Settled {
            let with_suggestions = !self.suggestions.is_empty();
            self.evaluate(with_suggestions);
        }
    }

    /// When the pending search becomes due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    /// Evaluate the pending search if its deadline has passed.
    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    /// Evaluate the pending search if its deadline is at or before `now`.
    /// Returns whether a search settled.
    pub fn poll_at(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(pending) if now >= pending.deadline => {
                self.pending = None;
                self.evaluate(pending.with_suggestions);
                true
            }
            _ => false,
        }
    }

    /// Evaluate the pending search immediately, ignoring the debounce.
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                self.evaluate(pending.with_suggestions);
                true
            }
            None => false,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == SearchState::Pending
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn suggestions(&self) -> &[SearchSuggestion] {
        &self.suggestions
    }

    pub fn recently_used(&self) -> &[UtilityDefinition] {
        &self.recently_used
    }

    pub fn favorites(&self) -> &[UtilityDefinition] {
        &self.favorites
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn engine(&self) -> &SearchEngine<S> {
        &self.engine
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            query: self.query.clone(),
            state: self.state,
            is_loading: self.is_loading(),
            results: self.results.clone(),
            suggestions: self.suggestions.clone(),
            recently_used: self.recently_used.clone(),
            favorites: self.favorites.clone(),
            evaluations: self.evaluations,
        }
    }

    fn schedule(&mut self, query: &str, now: Instant, with_suggestions: bool) {
        self.query = query.to_string();

        if query.trim().is_empty() {
            self.pending = None;
            self.results.clear();
            self.suggestions.clear();
            self.state = SearchState::Idle;
            return;
        }

        // Replaces, never queues behind, an earlier pending search
        self.pending = Some(PendingSearch {
            deadline: now + self.debounce,
            with_suggestions,
        });
        self.state = SearchState::Pending;
    }

    fn evaluate(&mut self, with_suggestions: bool) {
        self.results = self.engine.rank(&self.query);
        self.suggestions = if with_suggestions {
            self.engine.suggest(&self.query)
        } else {
            Vec::new()
        };
        self.state = SearchState::Settled;
        self.evaluations += 1;

        tracing::debug!(
            query = %self.query,
            results = self.results.len(),
            suggestions = self.suggestions.len(),
            "Search settled"
        );
    }

    fn refresh_personalization(&mut self) {
        self.recently_used = self.engine.recently_used();
        self.favorites = self.engine.favorites();
    }
}
