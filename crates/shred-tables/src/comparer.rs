//! Row- and field-level comparison of matched tables.
//!
//! With a resolvable key (explicit or detected) the comparer partitions
//! rows by key tuple and reports field-level differences for rows present
//! on both sides. Without one it degrades to a set-based comparison that
//! only reports presence counts; that degraded mode is a recognized state,
//! logged but never raised as an error.

use crate::keys::{KeyDetection, PrimaryKeyDetector};
use crate::matcher::{MatchOutcome, TableMatch, TableMatcher};
use crate::table::{Cell, Row, Table};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

/// Which comparison strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// Rows were aligned by primary-key tuples.
    Keyed,
    /// No key resolved; rows were compared as a set (presence only).
    SetBased,
}

/// One field-level difference between two keyed rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDifference {
    /// Key column -> value of the row pair.
    pub primary_key: IndexMap<String, Cell>,
    pub field: String,
    pub old_value: Cell,
    pub new_value: Cell,
}

/// Comparison result for one matched table pair.
#[derive(Debug, Clone, Serialize)]
pub struct TableComparison {
    pub table_name: String,
    pub mode: ComparisonMode,
    pub primary_key: KeyDetection,
    pub rows_in_first: usize,
    pub rows_in_second: usize,
    /// Columns present on both sides, in first-table order.
    pub common_columns: Vec<String>,
    pub columns_only_in_first: Vec<String>,
    pub columns_only_in_second: Vec<String>,
    pub rows_only_in_first: usize,
    pub rows_only_in_second: usize,
    pub rows_modified: usize,
    pub rows_unchanged: usize,
    /// Field-level records; empty in set-based mode.
    pub field_differences: Vec<FieldDifference>,
}

impl TableComparison {
    pub fn has_differences(&self) -> bool {
        self.rows_only_in_first > 0 || self.rows_only_in_second > 0 || self.rows_modified > 0
    }
}

/// A table comparison together with how its tables were paired.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedComparison {
    pub match_info: TableMatch,
    pub comparison: TableComparison,
}

/// Aggregate counts over one dataset comparison.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub tables_matched: usize,
    pub tables_only_in_first: usize,
    pub tables_only_in_second: usize,
    pub tables_with_differences: usize,
}

/// Full two-dataset comparison: summary, table matching, per-pair results.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetComparison {
    pub summary: DatasetSummary,
    pub matching: MatchOutcome,
    pub comparisons: Vec<MatchedComparison>,
}

/// Compares matched tables, orchestrating key detection and table matching.
#[derive(Debug, Clone, Default)]
pub struct DataComparer {
    detector: PrimaryKeyDetector,
    matcher: TableMatcher,
}

impl DataComparer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a non-default similarity threshold for table matching.
    pub fn with_similarity_threshold(threshold: f64) -> Self {
        Self {
            detector: PrimaryKeyDetector::new(),
            matcher: TableMatcher::new(threshold),
        }
    }

    /// Compare two tables, auto-detecting the primary key when none is given.
    ///
    /// Key resolution order: the explicit key, then detection on the first
    /// table, then on the second. A resolved key whose columns are missing
    /// on either side downgrades to the set-based mode.
    pub fn compare_tables(
        &self,
        first: &Table,
        second: &Table,
        primary_key: Option<&[String]>,
        name: &str,
    ) -> TableComparison {
        let resolved = match primary_key {
            Some(columns) => KeyDetection::Detected(columns.to_vec()),
            None => match self.detector.detect(first) {
                KeyDetection::NotDetected => self.detector.detect(second),
                detected => detected,
            },
        };

        if let KeyDetection::Detected(columns) = &resolved {
            let missing = columns
                .iter()
                .find(|c| !first.has_column(c) || !second.has_column(c));
            if let Some(column) = missing {
                tracing::warn!(
                    table = name,
                    column,
                    "primary key column missing on one side; falling back to set comparison"
                );
                return self.compare_without_key(first, second, name);
            }
            return self.compare_with_key(first, second, columns, name);
        }

        tracing::warn!(table = name, "no primary key detected; using set comparison");
        self.compare_without_key(first, second, name)
    }

    fn compare_with_key(
        &self,
        first: &Table,
        second: &Table,
        key_columns: &[String],
        name: &str,
    ) -> TableComparison {
        let first_by_key = index_by_key(first, key_columns);
        let second_by_key = index_by_key(second, key_columns);

        let common_columns = common_columns(first, second);

        let rows_only_in_first = first_by_key
            .keys()
            .filter(|k| !second_by_key.contains_key(*k))
            .count();
        let rows_only_in_second = second_by_key
            .keys()
            .filter(|k| !first_by_key.contains_key(*k))
            .count();

        let mut field_differences = Vec::new();
        let mut rows_modified = 0;
        let mut rows_common = 0;

        for (key, row1) in &first_by_key {
            let Some(row2) = second_by_key.get(key) else {
                continue;
            };
            rows_common += 1;

            let mut changed = false;
            for column in &common_columns {
                if key_columns.contains(column) {
                    continue;
                }
                let old_value = row1.get(column).cloned().unwrap_or_else(Cell::null);
                let new_value = row2.get(column).cloned().unwrap_or_else(Cell::null);
                if old_value != new_value {
                    changed = true;
                    field_differences.push(FieldDifference {
                        primary_key: key_columns
                            .iter()
                            .cloned()
                            .zip(key.iter().cloned())
                            .collect(),
                        field: column.clone(),
                        old_value,
                        new_value,
                    });
                }
            }
            if changed {
                rows_modified += 1;
            }
        }

        TableComparison {
            table_name: name.to_string(),
            mode: ComparisonMode::Keyed,
            primary_key: KeyDetection::Detected(key_columns.to_vec()),
            rows_in_first: first.row_count(),
            rows_in_second: second.row_count(),
            common_columns,
            columns_only_in_first: column_difference(first, second),
            columns_only_in_second: column_difference(second, first),
            rows_only_in_first,
            rows_only_in_second,
            rows_modified,
            rows_unchanged: rows_common - rows_modified,
            field_differences,
        }
    }

    /// Degraded mode: null-normalize rows over the common columns and take
    /// pure set differences. Only presence counts are produced.
    fn compare_without_key(&self, first: &Table, second: &Table, name: &str) -> TableComparison {
        let common_columns = common_columns(first, second);

        let rows1 = row_tuples(first, &common_columns);
        let rows2 = row_tuples(second, &common_columns);

        let (only_first, only_second, unchanged) = if common_columns.is_empty() {
            // Nothing comparable; both sides are entirely distinct.
            (first.row_count(), second.row_count(), 0)
        } else {
            (
                rows1.difference(&rows2).count(),
                rows2.difference(&rows1).count(),
                rows1.intersection(&rows2).count(),
            )
        };

        TableComparison {
            table_name: name.to_string(),
            mode: ComparisonMode::SetBased,
            primary_key: KeyDetection::NotDetected,
            rows_in_first: first.row_count(),
            rows_in_second: second.row_count(),
            common_columns,
            columns_only_in_first: column_difference(first, second),
            columns_only_in_second: column_difference(second, first),
            rows_only_in_first: only_first,
            rows_only_in_second: only_second,
            rows_modified: 0,
            rows_unchanged: unchanged,
            field_differences: Vec::new(),
        }
    }

    /// Compare two whole table sets: match tables by name, compare each
    /// matched pair, and aggregate a summary.
    pub fn compare_datasets(
        &self,
        first: &IndexMap<String, Table>,
        second: &IndexMap<String, Table>,
        primary_keys: Option<&IndexMap<String, Vec<String>>>,
    ) -> DatasetComparison {
        let matching = self.matcher.match_tables(first, second);

        let mut comparisons = Vec::with_capacity(matching.matches.len());
        for table_match in &matching.matches {
            let (Some(t1), Some(t2)) = (
                first.get(&table_match.first),
                second.get(&table_match.second),
            ) else {
                continue;
            };

            let explicit = primary_keys.and_then(|keys| {
                keys.get(&table_match.first)
                    .or_else(|| keys.get(&table_match.second))
            });

            let comparison =
                self.compare_tables(t1, t2, explicit.map(Vec::as_slice), &table_match.first);
            comparisons.push(MatchedComparison {
                match_info: table_match.clone(),
                comparison,
            });
        }

        let summary = DatasetSummary {
            tables_matched: matching.matches.len(),
            tables_only_in_first: matching.only_in_first.len(),
            tables_only_in_second: matching.only_in_second.len(),
            tables_with_differences: comparisons
                .iter()
                .filter(|c| c.comparison.has_differences())
                .count(),
        };

        DatasetComparison {
            summary,
            matching,
            comparisons,
        }
    }
}

/// Key tuple -> first row carrying it (later duplicates are ignored).
fn index_by_key<'a>(table: &'a Table, key_columns: &[String]) -> IndexMap<Vec<Cell>, &'a Row> {
    let mut by_key = IndexMap::with_capacity(table.row_count());
    for row in &table.rows {
        let key: Vec<Cell> = key_columns
            .iter()
            .map(|c| row.get(c).cloned().unwrap_or_else(Cell::null))
            .collect();
        by_key.entry(key).or_insert(row);
    }
    by_key
}

/// Columns present on both sides, in first-table order.
fn common_columns(first: &Table, second: &Table) -> Vec<String> {
    first
        .columns
        .iter()
        .filter(|c| second.has_column(c))
        .cloned()
        .collect()
}

fn column_difference(of: &Table, against: &Table) -> Vec<String> {
    of.columns
        .iter()
        .filter(|c| !against.has_column(c))
        .cloned()
        .collect()
}

/// Null-normalized row tuples over the given columns.
fn row_tuples(table: &Table, columns: &[String]) -> HashSet<Vec<Cell>> {
    table
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(c).cloned().unwrap_or_else(Cell::null))
                .collect()
        })
        .collect()
}
