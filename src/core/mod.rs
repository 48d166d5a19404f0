//! Core engine module - catalog-agnostic search logic.
//!
//! - [`index`] - per-utility token sets, cached per catalog
//! - [`scorer`] - weighted relevance of a query against one utility
//! - [`ranker`] - ordered results across the catalog
//! - [`suggestions`] - typed suggestions for search-as-you-type
//! - [`engine`] - the above plus personalization behind one type

pub mod engine;
pub mod index;
pub mod ranker;
pub mod scorer;
pub mod suggestions;

pub use engine::SearchEngine;
pub use index::{build_index, IndexCache, IndexedUtility};
pub use ranker::{rank, SearchResult};
pub use scorer::{score, MatchedField, Score};
pub use suggestions::{suggest, SearchSuggestion, SuggestionLimits};
