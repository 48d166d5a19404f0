//! Engine configuration.
//!
//! Loaded from `~/.config/toolbox/search.toml`. Every field has a default, so
//! a missing or partial file is never an error for [`EngineConfig::load`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ToolboxError, ToolboxResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchConfig,
    pub personalization: PersonalizationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search is evaluated.
    pub debounce_ms: u64,
    pub max_results: usize,
    pub max_suggestions: usize,
    // Per-bucket suggestion limits
    pub utility_suggestions: usize,
    pub category_suggestions: usize,
    pub keyword_suggestions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalizationConfig {
    /// Maximum number of recently used utilities to remember.
    pub max_recent: usize,
    /// Key of the combined recents/favorites record in the backing store.
    pub storage_key: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            max_results: 50,
            max_suggestions: 8,
            utility_suggestions: 3,
            category_suggestions: 2,
            keyword_suggestions: 3,
        }
    }
}

impl Default for PersonalizationConfig {
    fn default() -> Self {
        Self {
            max_recent: 10,
            storage_key: "toolbox.personalization".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl EngineConfig {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("toolbox")
            .join("search.toml")
    }

    /// Load config from the default location, or return defaults if it is
    /// missing or unreadable.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to load config: {}", e);
                Self::default()
            }
        }
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> ToolboxResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML text. Values are clamped to acceptable ranges.
    pub fn from_toml(content: &str) -> ToolboxResult<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.validate();
        Ok(config)
    }

    /// Validate and clamp config values to acceptable ranges
    pub fn validate(&mut self) {
        let search = &mut self.search;

        // Anything above two seconds reads as a frozen search box
        search.debounce_ms = search.debounce_ms.min(2000);
        search.max_results = search.max_results.clamp(1, 500);
        search.max_suggestions = search.max_suggestions.clamp(1, 20);

        search.utility_suggestions = search.utility_suggestions.min(search.max_suggestions);
        search.category_suggestions = search.category_suggestions.min(search.max_suggestions);
        search.keyword_suggestions = search.keyword_suggestions.min(search.max_suggestions);

        self.personalization.max_recent = self.personalization.max_recent.clamp(1, 100);

        if self.personalization.storage_key.trim().is_empty() {
            tracing::warn!("Empty personalization storage key, using default");
            self.personalization.storage_key = PersonalizationConfig::default().storage_key;
        }
    }

    /// Save config to the default location.
    pub fn save(&self) -> ToolboxResult<()> {
        self.save_to(&Self::config_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: &Path) -> ToolboxResult<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ToolboxError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)?;
        Ok(())
    }
}
