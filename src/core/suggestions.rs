//! Typed suggestions for search-as-you-type.
//!
//! Suggestions are composed from three buckets, in order:
//! 1. utilities whose score is above zero, best first
//! 2. categories whose label starts with the query
//! 3. raw keywords that start with the query, from utilities not already
//!    suggested in bucket 1
//!
//! No two suggestions share the same text (case-insensitive).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::index::IndexedUtility;
use super::ranker;
use super::scorer::Query;
use crate::catalog::{Category, UtilityDefinition};
use crate::config::SearchConfig;
use crate::services::personalization::PersonalizationSnapshot;

/// A suggestion shown while typing.
///
/// Tagged by `type` on the wire so the presentation layer can hand back
/// whatever it received; unrecognised types become [`SearchSuggestion::Unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchSuggestion {
    Utility {
        text: String,
        utility: UtilityDefinition,
    },
    Category {
        text: String,
        category: Category,
    },
    Keyword {
        text: String,
    },
    #[serde(other)]
    Unknown,
}

impl SearchSuggestion {
    /// Display text, which is also the query a selection searches for.
    pub fn text(&self) -> Option<&str> {
        match self {
            SearchSuggestion::Utility { text, .. }
            | SearchSuggestion::Category { text, .. }
            | SearchSuggestion::Keyword { text } => Some(text),
            SearchSuggestion::Unknown => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SearchSuggestion::Utility { .. } => "utility",
            SearchSuggestion::Category { .. } => "category",
            SearchSuggestion::Keyword { .. } => "keyword",
            SearchSuggestion::Unknown => "unknown",
        }
    }
}

/// Bucket sizes and the overall cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionLimits {
    pub total: usize,
    pub utilities: usize,
    pub categories: usize,
    pub keywords: usize,
}

impl Default for SuggestionLimits {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SuggestionLimits {
    fn from(config: &SearchConfig) -> Self {
        Self {
            total: config.max_suggestions,
            utilities: config.utility_suggestions,
            categories: config.category_suggestions,
            keywords: config.keyword_suggestions,
        }
    }
}

/// Collects suggestions while enforcing the overall cap and text uniqueness.
struct SuggestionList {
    items: Vec<SearchSuggestion>,
    seen: HashSet<String>,
    limit: usize,
}

impl SuggestionList {
    fn new(limit: usize) -> Self {
        Self {
            items: Vec::with_capacity(limit),
            seen: HashSet::new(),
            limit,
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    /// Returns whether the suggestion was accepted.
    fn push(&mut self, text: &str, suggestion: SearchSuggestion) -> bool {
        if self.is_full() || !self.seen.insert(text.to_lowercase()) {
            return false;
        }
        self.items.push(suggestion);
        true
    }
}

/// Derive suggestions for `query`. Empty queries yield nothing.
pub fn suggest(
    query: &str,
    index: &[IndexedUtility],
    personal: &PersonalizationSnapshot,
    limits: SuggestionLimits,
) -> Vec<SearchSuggestion> {
    let Some(parsed) = Query::parse(query) else {
        return Vec::new();
    };

    let mut list = SuggestionList::new(limits.total);

    // 1. Utility names
    let mut suggested_ids = HashSet::new();
    let mut taken = 0;
    for result in ranker::rank(query, index, personal) {
        if taken >= limits.utilities || list.is_full() {
            break;
        }
        let text = result.utility.name.clone();
        if text.is_empty() {
            continue;
        }
        let id = result.utility.id.clone();
        let accepted = list.push(
            &text,
            SearchSuggestion::Utility {
                text: text.clone(),
                utility: result.utility,
            },
        );
        if accepted {
            suggested_ids.insert(id);
            taken += 1;
        }
    }

    // 2. Categories present in the catalog
    let mut taken = 0;
    for category in present_categories(index) {
        if taken >= limits.categories || list.is_full() {
            break;
        }
        let label = category.label();
        let matches = label.to_lowercase().starts_with(&parsed.text)
            || category.slug().starts_with(&parsed.text);
        if matches
            && list.push(
                label,
                SearchSuggestion::Category {
                    text: label.to_string(),
                    category,
                },
            )
        {
            taken += 1;
        }
    }

    // 3. Raw keywords
    let mut taken = 0;
    'outer: for entry in index {
        if suggested_ids.contains(entry.id()) {
            continue;
        }
        for keyword in &entry.keywords {
            if taken >= limits.keywords || list.is_full() {
                break 'outer;
            }
            if keyword.starts_with(&parsed.text)
                && list.push(
                    keyword,
                    SearchSuggestion::Keyword {
                        text: keyword.clone(),
                    },
                )
            {
                taken += 1;
            }
        }
    }

    list.items
}

fn present_categories(index: &[IndexedUtility]) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|c| index.iter().any(|entry| entry.category == *c))
        .collect()
}
