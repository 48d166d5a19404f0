//! Ranking of scored utilities into an ordered result list.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::index::IndexedUtility;
use super::scorer::{self, MatchedField, Query};
use crate::catalog::UtilityDefinition;
use crate::services::personalization::PersonalizationSnapshot;

/// A ranked match. Created fresh on every ranking pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub utility: UtilityDefinition,
    pub relevance_score: f64,
    pub matched_fields: BTreeSet<MatchedField>,
}

/// Rank every indexed utility against `query`.
///
/// Zero scores are dropped. Ordering is by score descending; ties go to
/// recently used or favorite utilities first, then alphabetically by name,
/// then by id, so identical inputs always produce identical output.
pub fn rank(
    query: &str,
    index: &[IndexedUtility],
    personal: &PersonalizationSnapshot,
) -> Vec<SearchResult> {
    let Some(query) = Query::parse(query) else {
        return Vec::new();
    };

    let mut scored: Vec<(&IndexedUtility, scorer::Score)> = index
        .iter()
        .filter_map(|entry| {
            let score = scorer::score_query(&query, entry);
            score.is_match().then_some((entry, score))
        })
        .collect();

    scored.sort_by(|(a, a_score), (b, b_score)| {
        b_score
            .value
            .total_cmp(&a_score.value)
            .then_with(|| compare_ties(a, b, personal))
    });

    scored
        .into_iter()
        .map(|(entry, score)| SearchResult {
            utility: entry.utility.clone(),
            relevance_score: score.value,
            matched_fields: score.matched_fields,
        })
        .collect()
}

/// Tie-break for equal scores.
fn compare_ties(
    a: &IndexedUtility,
    b: &IndexedUtility,
    personal: &PersonalizationSnapshot,
) -> Ordering {
    let a_personal = personal.is_personalized(a.id());
    let b_personal = personal.is_personalized(b.id());

    b_personal
        .cmp(&a_personal)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id().cmp(b.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Category};
    use crate::core::index::build_index;
    use proptest::prelude::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            UtilityDefinition::new("json-formatter", "JSON Formatter", Category::Developer)
                .with_keywords(["json"]),
            UtilityDefinition::new("jwt-decoder", "JWT Decoder", Category::Developer)
                .with_description("Decode JSON Web Tokens")
                .with_keywords(["jwt", "json"]),
            UtilityDefinition::new("yaml-to-json", "YAML to JSON", Category::Converter)
                .with_keywords(["yaml"]),
            UtilityDefinition::new("base64", "Base64 Encoder", Category::Developer)
                .with_keywords(["encode"]),
            UtilityDefinition::new("url-encoder", "URL Encoder", Category::Developer)
                .with_keywords(["encode"]),
            UtilityDefinition::new("word-counter", "Word Counter", Category::Text),
        ])
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.utility.id.as_str()).collect()
    }

    #[test]
    fn test_sorted_descending_and_positive() {
        let index = build_index(&catalog());
        let results = rank("json", &index, &PersonalizationSnapshot::default());

        assert_eq!(ids(&results), vec!["json-formatter", "yaml-to-json", "jwt-decoder"]);
        assert!(results.iter().all(|r| r.relevance_score > 0.0));
        assert!(results
            .windows(2)
            .all(|w| w[0].relevance_score >= w[1].relevance_score));
    }

    #[test]
    fn test_exact_name_scores_one() {
        let index = build_index(&catalog());
        let results = rank("JSON Formatter", &index, &PersonalizationSnapshot::default());

        assert_eq!(results[0].utility.id, "json-formatter");
        assert_eq!(results[0].relevance_score, 1.0);
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let index = build_index(&catalog());
        assert!(rank("", &index, &PersonalizationSnapshot::default()).is_empty());
        assert!(rank("   ", &index, &PersonalizationSnapshot::default()).is_empty());
    }

    #[test]
    fn test_ties_are_alphabetical() {
        let index = build_index(&catalog());
        let results = rank("encode", &index, &PersonalizationSnapshot::default());

        assert_eq!(ids(&results), vec!["base64", "url-encoder"]);
        assert_eq!(results[0].relevance_score, results[1].relevance_score);
    }

    #[test]
    fn test_ties_prefer_personalized_entries() {
        let index = build_index(&catalog());
        let personal = PersonalizationSnapshot::new(vec!["url-encoder".to_string()], Vec::new());
        let results = rank("encode", &index, &personal);
        assert_eq!(ids(&results), vec!["url-encoder", "base64"]);

        let personal = PersonalizationSnapshot::new(Vec::new(), vec!["url-encoder".to_string()]);
        let results = rank("encode", &index, &personal);
        assert_eq!(ids(&results), vec!["url-encoder", "base64"]);
    }

    #[test]
    fn test_personalization_never_beats_a_higher_score() {
        let index = build_index(&catalog());
        let personal = PersonalizationSnapshot::new(vec!["jwt-decoder".to_string()], Vec::new());
        let results = rank("json", &index, &personal);

        assert_eq!(results[0].utility.id, "json-formatter");
    }

    #[test]
    fn test_repeated_ranking_is_identical() {
        let index = build_index(&catalog());
        let personal = PersonalizationSnapshot::new(vec!["base64".to_string()], Vec::new());

        let first = rank("e", &index, &personal);
        for _ in 0..5 {
            assert_eq!(rank("e", &index, &personal), first);
        }
    }

    proptest! {
        #[test]
        fn test_bundled_ranking_is_sorted_and_positive(query in "[a-zA-Z &-]{0,12}") {
            let index = build_index(&Catalog::bundled().unwrap());
            let personal = PersonalizationSnapshot::new(
                vec!["word-counter".to_string()],
                vec!["json-formatter".to_string()],
            );
            let results = rank(&query, &index, &personal);

            prop_assert!(results
                .iter()
                .all(|r| r.relevance_score > 0.0 && r.relevance_score <= 1.0));
            prop_assert!(results
                .windows(2)
                .all(|w| w[0].relevance_score >= w[1].relevance_score));
            prop_assert_eq!(rank(&query, &index, &personal), results);
        }

        #[test]
        fn test_blank_queries_rank_nothing(query in "[ \t\n]{0,8}") {
            let index = build_index(&Catalog::bundled().unwrap());
            prop_assert!(rank(&query, &index, &PersonalizationSnapshot::default()).is_empty());
        }
    }
}
