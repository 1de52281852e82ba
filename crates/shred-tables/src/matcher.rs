//! Name-based matching of tables across two generation passes.
//!
//! Matching runs in three passes: identical names, plural-normalized names,
//! then best string similarity above a threshold. Each name participates in
//! at most one match; candidate iteration is in sorted name order so the
//! output is reproducible regardless of table-set iteration order.

use crate::table::Table;
use indexmap::IndexMap;
use serde::Serialize;
use similar::TextDiff;
use std::collections::BTreeSet;

/// Default minimum similarity for the third matching pass.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// How a pair of table names was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Identical names.
    Exact,
    /// Equal after plural-suffix normalization.
    Normalized,
    /// Best similarity ratio above the threshold.
    Similar,
}

/// One matched pair of table names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMatch {
    pub first: String,
    pub second: String,
    pub kind: MatchKind,
    /// 1.0 for exact, 0.95 for normalized, the ratio otherwise.
    pub similarity: f64,
}

/// Full matching outcome, including names left unmatched on either side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchOutcome {
    pub matches: Vec<TableMatch>,
    pub only_in_first: Vec<String>,
    pub only_in_second: Vec<String>,
}

/// Pairs tables from two table sets by name.
#[derive(Debug, Clone)]
pub struct TableMatcher {
    similarity_threshold: f64,
}

impl Default for TableMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl TableMatcher {
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold,
        }
    }

    /// Match two table sets by name.
    pub fn match_tables(
        &self,
        first: &IndexMap<String, Table>,
        second: &IndexMap<String, Table>,
    ) -> MatchOutcome {
        let names1: Vec<&str> = first.keys().map(String::as_str).collect();
        let names2: Vec<&str> = second.keys().map(String::as_str).collect();
        self.match_names(&names1, &names2)
    }

    /// Match two name lists; exposed for callers that only carry names.
    pub fn match_names(&self, first: &[&str], second: &[&str]) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let names1: BTreeSet<&str> = first.iter().copied().collect();
        let names2: BTreeSet<&str> = second.iter().copied().collect();
        let mut matched2: BTreeSet<&str> = BTreeSet::new();

        // First pass: exact matches.
        for name in names1.intersection(&names2) {
            outcome.matches.push(TableMatch {
                first: (*name).to_string(),
                second: (*name).to_string(),
                kind: MatchKind::Exact,
                similarity: 1.0,
            });
            matched2.insert(name);
        }

        // Second and third passes: normalized equality, then similarity.
        for name1 in names1.iter().filter(|n| !names2.contains(*n)) {
            let norm1 = normalize_name(name1);
            let mut best: Option<(&str, f64)> = None;

            for name2 in names2.iter().filter(|n| !matched2.contains(*n)) {
                let norm2 = normalize_name(name2);
                if norm1 == norm2 {
                    best = Some((name2, 0.95));
                    break;
                }
                let similarity = similarity_ratio(&norm1, &norm2);
                if similarity >= self.similarity_threshold
                    && best.map(|(_, s)| similarity > s).unwrap_or(true)
                {
                    best = Some((name2, similarity));
                }
            }

            if let Some((name2, similarity)) = best {
                outcome.matches.push(TableMatch {
                    first: (*name1).to_string(),
                    second: name2.to_string(),
                    kind: if similarity >= 0.95 {
                        MatchKind::Normalized
                    } else {
                        MatchKind::Similar
                    },
                    similarity,
                });
                matched2.insert(name2);
            }
        }

        let matched1: BTreeSet<&str> = outcome.matches.iter().map(|m| m.first.as_str()).collect();
        outcome.only_in_first = names1
            .iter()
            .filter(|n| !matched1.contains(*n))
            .map(|n| (*n).to_string())
            .collect();
        outcome.only_in_second = names2
            .iter()
            .filter(|n| !matched2.contains(*n))
            .map(|n| (*n).to_string())
            .collect();

        outcome
    }
}

/// Lowercase and strip common plural suffixes.
fn normalize_name(name: &str) -> String {
    let name = name.trim().to_lowercase();
    if let Some(stem) = name.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    if name.ends_with("es") && !name.ends_with("sse") {
        return name[..name.len() - 2].to_string();
    }
    if name.ends_with('s') && !name.ends_with("ss") {
        return name[..name.len() - 1].to_string();
    }
    name
}

/// Similarity of two strings in `[0, 1]`, the difflib ratio: twice the
/// matched character count over the total length.
fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(a, b).ratio())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(first: &[&str], second: &[&str]) -> MatchOutcome {
        TableMatcher::default().match_names(first, second)
    }

    #[test]
    fn test_exact_match() {
        let outcome = outcome(&["USERS"], &["USERS"]);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].kind, MatchKind::Exact);
        assert_eq!(outcome.matches[0].similarity, 1.0);
    }

    #[test]
    fn test_singular_plural_normalization() {
        let outcome = outcome(&["community", "report"], &["communities", "reports"]);

        assert_eq!(outcome.matches.len(), 2);
        for m in &outcome.matches {
            assert_eq!(m.kind, MatchKind::Normalized);
            assert_eq!(m.similarity, 0.95);
        }
        assert!(outcome.only_in_first.is_empty());
        assert!(outcome.only_in_second.is_empty());
    }

    #[test]
    fn test_dissimilar_names_do_not_match() {
        let outcome = outcome(&["users"], &["products"]);
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.only_in_first, vec!["users"]);
        assert_eq!(outcome.only_in_second, vec!["products"]);
    }

    #[test]
    fn test_similar_names_match_above_threshold() {
        let outcome = outcome(&["user_account"], &["user_accounts_v2"]);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].kind, MatchKind::Similar);
        assert!(outcome.matches[0].similarity >= 0.8);
    }

    #[test]
    fn test_each_name_matches_at_most_once() {
        let outcome = outcome(&["item", "items"], &["items"]);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].kind, MatchKind::Exact);
        assert_eq!(outcome.matches[0].first, "items");
        assert_eq!(outcome.only_in_first, vec!["item"]);
    }

    #[test]
    fn test_normalize_suffix_rules() {
        assert_eq!(normalize_name("communities"), "community");
        assert_eq!(normalize_name("boxes"), "box");
        assert_eq!(normalize_name("reports"), "report");
        assert_eq!(normalize_name("classes"), "class");
        assert_eq!(normalize_name("class"), "class");
    }

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(similarity_ratio("abc", "abc"), 1.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        let mid = similarity_ratio("report", "reports");
        assert!(mid > 0.9 && mid < 1.0);
    }
}
