//! Heuristic primary-key detection for generated tables.

use crate::table::{Cell, Table};
use serde::Serialize;
use std::collections::HashSet;

/// Maximum number of columns a composite key may span.
const MAX_COMPOSITE_ARITY: usize = 3;

/// Candidates must have (nearly) all-distinct non-null values.
const UNIQUENESS_THRESHOLD: f64 = 0.99;

/// Column names eligible for the composite-key search.
const COMPOSITE_POOL: [&str; 6] = ["id", "code", "name", "type", "action_code", "action_type"];

/// Outcome of primary-key detection.
///
/// "No key found" is a recognized state, not an error: consumers (the data
/// comparer) branch on it explicitly to pick a degraded comparison mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDetection {
    /// Identifying column(s), in key order.
    Detected(Vec<String>),
    /// No single or composite key qualified.
    NotDetected,
}

impl KeyDetection {
    pub fn is_detected(&self) -> bool {
        matches!(self, KeyDetection::Detected(_))
    }

    /// The key columns, if any were detected.
    pub fn columns(&self) -> Option<&[String]> {
        match self {
            KeyDetection::Detected(columns) => Some(columns),
            KeyDetection::NotDetected => None,
        }
    }
}

/// Guesses the identifying column(s) of a table from column names and
/// value uniqueness.
#[derive(Debug, Clone, Default)]
pub struct PrimaryKeyDetector;

impl PrimaryKeyDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect the primary key of `table`.
    ///
    /// Single-column candidates are columns whose name matches an
    /// identifying pattern; each is scored `base_score * unique_ratio` and
    /// only qualifies when its non-null values are at least 99% distinct.
    /// If no single column qualifies, increasing contiguous windows over
    /// the identifying-name column subset are tested for perfect grouping
    /// uniqueness, up to three columns wide.
    pub fn detect(&self, table: &Table) -> KeyDetection {
        if table.is_empty() {
            return KeyDetection::NotDetected;
        }

        let mut best: Option<(&str, i64)> = None;
        for column in &table.columns {
            if !matches_key_pattern(column) {
                continue;
            }
            let score = score_candidate(table, column);
            if score > 0 && best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((column, score));
            }
        }

        if let Some((column, score)) = best {
            tracing::debug!(table = %table.name, column, score, "detected primary key");
            return KeyDetection::Detected(vec![column.to_string()]);
        }

        self.find_composite_key(table)
    }

    /// Composite search over the fixed identifying-name pool, in table
    /// column order, testing increasing contiguous windows.
    fn find_composite_key(&self, table: &Table) -> KeyDetection {
        if table.row_count() <= 1 {
            return KeyDetection::NotDetected;
        }

        let pool: Vec<&String> = table
            .columns
            .iter()
            .filter(|c| COMPOSITE_POOL.contains(&c.to_lowercase().as_str()))
            .collect();
        if pool.is_empty() {
            return KeyDetection::NotDetected;
        }

        for start in 0..pool.len() {
            let widest = (start + MAX_COMPOSITE_ARITY).min(pool.len());
            for end in (start + 1)..=widest {
                let window = &pool[start..end];
                if groups_rows_uniquely(table, window) {
                    let columns: Vec<String> = window.iter().map(|c| (*c).clone()).collect();
                    tracing::debug!(table = %table.name, ?columns, "detected composite primary key");
                    return KeyDetection::Detected(columns);
                }
            }
        }

        KeyDetection::NotDetected
    }
}

/// Identifying-name patterns: exact `id`/`_id`/`key`/`code`/`name`/`uuid`/
/// `guid`, or a `_id`/`_code` suffix.
fn matches_key_pattern(column: &str) -> bool {
    let lower = column.to_lowercase();
    matches!(
        lower.as_str(),
        "id" | "_id" | "key" | "code" | "name" | "uuid" | "guid"
    ) || lower.ends_with("_id")
        || lower.ends_with("_code")
}

/// Score one candidate column: 0 disqualifies, higher is better.
fn score_candidate(table: &Table, column: &str) -> i64 {
    let values = table.column_values(column);
    let non_null: Vec<&Cell> = values.iter().filter(|c| !c.is_null()).collect();
    if non_null.is_empty() {
        return 0;
    }

    let distinct: HashSet<&&Cell> = non_null.iter().collect();
    let unique_ratio = distinct.len() as f64 / non_null.len() as f64;
    if unique_ratio < UNIQUENESS_THRESHOLD {
        return 0;
    }

    let lower = column.to_lowercase();
    let mut base: i64 = match lower.as_str() {
        "id" => 100,
        "_id" => 95,
        "key" => 90,
        "uuid" | "guid" => 85,
        "code" => 80,
        "name" => 70,
        _ => 50,
    };
    if lower.ends_with("_id") {
        base += 20;
    } else if lower.ends_with("_code") {
        base += 15;
    }

    (base as f64 * unique_ratio) as i64
}

/// True when grouping rows by the window's value tuples yields exactly one
/// group per row.
fn groups_rows_uniquely(table: &Table, window: &[&String]) -> bool {
    let mut groups: HashSet<Vec<Cell>> = HashSet::with_capacity(table.row_count());
    for row in &table.rows {
        let tuple: Vec<Cell> = window
            .iter()
            .map(|column| row.get(*column).cloned().unwrap_or_else(Cell::null))
            .collect();
        groups.insert(tuple);
    }
    groups.len() == table.row_count()
}
