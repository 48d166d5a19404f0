//! Toolbox search - search and personalization engine for a catalog of
//! client-side utility tools.
//!
//! Given a catalog of utility definitions and a free-text query, the engine
//! produces ranked results and typed suggestions while tracking recently used
//! and favorite utilities.
//!
//! # Architecture
//!
//! - [`catalog`] - Utility definitions and catalog loading
//! - [`core`] - Indexing, scoring, ranking and suggestions
//! - [`services`] - Persistence backends and the personalization store
//! - [`controller`] - Debounced search-as-you-type state machine (plus a tokio
//!   driver with the `runtime` feature)
//! - [`config`] - Engine configuration
//!
//! # Example
//!
//! ```
//! use toolbox_search::{Catalog, EngineConfig, MemoryStore, SearchEngine};
//!
//! let catalog = Catalog::bundled().expect("bundled catalog is valid");
//! let mut engine = SearchEngine::new(catalog, MemoryStore::new(), &EngineConfig::default());
//!
//! let results = engine.rank("json");
//! assert_eq!(results[0].utility.id, "json-formatter");
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod controller;
pub mod core;
pub mod services;

mod error;

// Re-export commonly used types for convenience
pub use catalog::{Catalog, Category, UtilityDefinition};
pub use config::EngineConfig;
pub use controller::{SearchController, SearchSnapshot, SearchState};
pub use core::{MatchedField, SearchEngine, SearchResult, SearchSuggestion};
pub use error::{StorageError, ToolboxError, ToolboxResult};
pub use services::{JsonFileStore, KeyValueStore, MemoryStore, PersonalizationStore};
