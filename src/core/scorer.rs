//! Relevance scoring of a query against one indexed utility.
//!
//! Each field check contributes a fixed weight. The final score is the
//! strongest single contribution, not a sum, so one exact name hit always
//! beats a pile of weak partial hits. Every field that fired is still
//! reported for highlighting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::index::IndexedUtility;

pub const EXACT_NAME: f64 = 1.0;
pub const NAME_PREFIX: f64 = 0.8;
pub const NAME_SUBSTRING: f64 = 0.6;
pub const KEYWORD_EXACT: f64 = 0.5;
pub const CATEGORY_MATCH: f64 = 0.3;
pub const DESCRIPTION_SUBSTRING: f64 = 0.2;

/// Utility field that contributed to a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchedField {
    Name,
    Keywords,
    Category,
    Description,
}

impl MatchedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchedField::Name => "name",
            MatchedField::Keywords => "keywords",
            MatchedField::Category => "category",
            MatchedField::Description => "description",
        }
    }
}

/// Outcome of scoring one utility.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    /// 0.0 (no match) to 1.0 (exact name).
    pub value: f64,
    pub matched_fields: BTreeSet<MatchedField>,
}

impl Score {
    pub fn is_match(&self) -> bool {
        self.value > 0.0
    }

    fn hit(&mut self, field: MatchedField, weight: f64) {
        self.matched_fields.insert(field);
        if weight > self.value {
            self.value = weight;
        }
    }
}

/// A normalized query: trimmed, lowercased, and split on whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub terms: Vec<String>,
}

impl Query {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        let terms = text.split_whitespace().map(str::to_string).collect();
        Some(Self { text, terms })
    }

    /// The whole query followed by its terms, without repeats.
    fn candidates(&self) -> impl Iterator<Item = &str> {
        let whole = (self.terms.len() > 1).then_some(self.text.as_str());
        whole
            .into_iter()
            .chain(self.terms.iter().map(String::as_str))
    }

    fn all_terms_in(&self, haystack: &str) -> bool {
        !haystack.is_empty() && self.terms.iter().all(|t| haystack.contains(t.as_str()))
    }
}

/// Score a raw query string against one utility.
pub fn score(query: &str, indexed: &IndexedUtility) -> Score {
    match Query::parse(query) {
        Some(query) => score_query(&query, indexed),
        None => Score::default(),
    }
}

/// Score an already-normalized query against one utility.
pub fn score_query(query: &Query, indexed: &IndexedUtility) -> Score {
    let mut score = Score::default();
    let q = query.text.as_str();

    // Name
    if indexed.name == q {
        score.hit(MatchedField::Name, EXACT_NAME);
    } else if indexed.name.starts_with(q) {
        score.hit(MatchedField::Name, NAME_PREFIX);
    } else if indexed.name.contains(q) || query.all_terms_in(&indexed.name) {
        score.hit(MatchedField::Name, NAME_SUBSTRING);
    }

    // Keywords: one exact hit is enough, more don't add anything
    if query
        .candidates()
        .any(|c| indexed.keywords.iter().any(|k| k == c))
    {
        score.hit(MatchedField::Keywords, KEYWORD_EXACT);
    }

    // Category
    if query
        .candidates()
        .any(|c| indexed.category_terms.iter().any(|t| t == c))
    {
        score.hit(MatchedField::Category, CATEGORY_MATCH);
    }

    // Description
    if indexed.description.contains(q) || query.all_terms_in(&indexed.description) {
        score.hit(MatchedField::Description, DESCRIPTION_SUBSTRING);
    }

    score
}
