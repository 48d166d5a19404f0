//! Utility catalog: the externally supplied list of tools the engine searches.
//!
//! The catalog is immutable once loaded. Replacing it means building a new
//! [`Catalog`]; the index cache notices the new allocation and rebuilds.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ToolboxError, ToolboxResult};

/// Catalog shipped with the crate.
const BUNDLED_CATALOG: &str = include_str!("../data/catalog.json");

/// Tool category. Unknown labels in catalog data map to [`Category::Other`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Calculator,
    Converter,
    Text,
    Developer,
    Generator,
    Productivity,
    Finance,
    Health,
    Design,
    #[default]
    #[serde(other)]
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Calculator,
        Category::Converter,
        Category::Text,
        Category::Developer,
        Category::Generator,
        Category::Productivity,
        Category::Finance,
        Category::Health,
        Category::Design,
        Category::Other,
    ];

    /// Stable lowercase identifier, as used in catalog data.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Calculator => "calculator",
            Category::Converter => "converter",
            Category::Text => "text",
            Category::Developer => "developer",
            Category::Generator => "generator",
            Category::Productivity => "productivity",
            Category::Finance => "finance",
            Category::Health => "health",
            Category::Design => "design",
            Category::Other => "other",
        }
    }

    /// Human-readable label shown in the command palette.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Calculator => "Calculators",
            Category::Converter => "Converters",
            Category::Text => "Text Tools",
            Category::Developer => "Developer Tools",
            Category::Generator => "Generators",
            Category::Productivity => "Productivity",
            Category::Finance => "Finance",
            Category::Health => "Health & Fitness",
            Category::Design => "Design",
            Category::Other => "Other",
        }
    }
}

/// A single tool definition. Missing fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilityDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub keywords: Vec<String>,
    /// Opaque navigation target.
    pub route: String,
}

impl UtilityDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_keywords<I, K>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }
}

/// Shared, immutable list of utility definitions.
///
/// Cloning is cheap; clones share the same allocation and therefore the same
/// index cache entry.
#[derive(Debug, Clone)]
pub struct Catalog {
    utilities: Arc<[UtilityDefinition]>,
}

impl Catalog {
    /// Build a catalog, dropping entries without an id and later duplicates.
    pub fn new(utilities: Vec<UtilityDefinition>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(utilities.len());

        for utility in utilities {
            if utility.id.is_empty() {
                tracing::warn!(name = %utility.name, "Dropping catalog entry without an id");
                continue;
            }
            if !seen.insert(utility.id.clone()) {
                tracing::warn!(id = %utility.id, "Dropping duplicate catalog entry");
                continue;
            }
            kept.push(utility);
        }

        Self {
            utilities: kept.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Parse a catalog from a JSON array of utility definitions.
    pub fn from_json(json: &str) -> ToolboxResult<Self> {
        let utilities: Vec<UtilityDefinition> = serde_json::from_str(json)
            .map_err(|e| ToolboxError::Catalog(format!("Invalid catalog JSON: {}", e)))?;
        Ok(Self::new(utilities))
    }

    /// Load a catalog file from disk.
    pub fn load(path: &Path) -> ToolboxResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The catalog shipped with the crate.
    pub fn bundled() -> ToolboxResult<Self> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn get(&self, id: &str) -> Option<&UtilityDefinition> {
        self.utilities.iter().find(|u| u.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UtilityDefinition> {
        self.utilities.iter()
    }

    pub fn as_slice(&self) -> &[UtilityDefinition] {
        &self.utilities
    }

    pub fn len(&self) -> usize {
        self.utilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utilities.is_empty()
    }

    /// Categories that have at least one utility, in [`Category::ALL`] order.
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.utilities.iter().any(|u| u.category == *c))
            .collect()
    }

    /// Whether two handles point at the same catalog allocation.
    pub fn same_as(&self, other: &Catalog) -> bool {
        Arc::ptr_eq(&self.utilities, &other.utilities)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<UtilityDefinition>> for Catalog {
    fn from(utilities: Vec<UtilityDefinition>) -> Self {
        Self::new(utilities)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a UtilityDefinition;
    type IntoIter = std::slice::Iter<'a, UtilityDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
