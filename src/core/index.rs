//! Per-utility searchable token sets.
//!
//! Lowercasing and tokenizing every field on every keystroke is wasted work,
//! so each catalog entry is converted once into an [`IndexedUtility`]. The
//! [`IndexCache`] keeps the result for as long as the catalog allocation
//! stays the same.

use crate::catalog::{Catalog, Category, UtilityDefinition};

/// A utility definition plus precomputed lowercase fields.
#[derive(Debug, Clone)]
pub struct IndexedUtility {
    pub utility: UtilityDefinition,
    /// Full lowercase name.
    pub name: String,
    pub name_tokens: Vec<String>,
    /// Full lowercase description.
    pub description: String,
    pub description_tokens: Vec<String>,
    /// Lowercase keywords, whole (multi-word keywords are kept intact).
    pub keywords: Vec<String>,
    pub category: Category,
    /// Lowercase slug, label and label tokens of the category.
    pub category_terms: Vec<String>,
}

impl IndexedUtility {
    pub fn new(utility: &UtilityDefinition) -> Self {
        let name = utility.name.trim().to_lowercase();
        let description = utility.description.trim().to_lowercase();

        let keywords = utility
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let label = utility.category.label().to_lowercase();
        let mut category_terms = vec![utility.category.slug().to_string()];
        for term in std::iter::once(label.clone()).chain(tokenize(&label)) {
            if !category_terms.contains(&term) {
                category_terms.push(term);
            }
        }

        Self {
            utility: utility.clone(),
            name_tokens: tokenize(&name),
            name,
            description_tokens: tokenize(&description),
            description,
            keywords,
            category: utility.category,
            category_terms,
        }
    }

    pub fn id(&self) -> &str {
        &self.utility.id
    }
}

/// Lowercase `text` and split it on non-alphanumeric boundaries.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Build the index for a whole catalog, preserving catalog order.
pub fn build_index(catalog: &Catalog) -> Vec<IndexedUtility> {
    catalog.iter().map(IndexedUtility::new).collect()
}

/// Index for the catalog it was last asked about.
#[derive(Debug, Default)]
pub struct IndexCache {
    source: Option<Catalog>,
    entries: Vec<IndexedUtility>,
    rebuilds: usize,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index for `catalog`, rebuilding it if the catalog handle
    /// points at a different allocation than last time.
    pub fn get(&mut self, catalog: &Catalog) -> &[IndexedUtility] {
        let stale = match &self.source {
            Some(source) => !source.same_as(catalog),
            None => true,
        };

        if stale {
            self.entries = build_index(catalog);
            self.source = Some(catalog.clone());
            self.rebuilds += 1;
            tracing::debug!(utilities = self.entries.len(), "Rebuilt search index");
        }

        &self.entries
    }

    /// Number of times the index has been (re)built.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }
}
