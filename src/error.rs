//! Error types for the toolbox search engine.
//!
//! Search-path operations never fail; these errors only surface from loading
//! catalogs and configuration, and from the storage backends (where the
//! personalization store absorbs them).

use thiserror::Error;

/// Errors that can occur while setting up the engine.
#[derive(Debug, Error)]
pub enum ToolboxError {
    /// Catalog loading errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistence backend errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Errors raised by a [`KeyValueStore`](crate::services::storage::KeyValueStore).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage quota of {limit} bytes exceeded while writing '{key}'")]
    QuotaExceeded { key: String, limit: usize },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for toolbox operations
pub type ToolboxResult<T> = Result<T, ToolboxError>;
