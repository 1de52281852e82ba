//! Flat table structures produced by shredding.

use indexmap::IndexMap;
use serde::Serialize;
use shred_document::Scalar;
use std::fmt;

/// Positional ordering column added to every child-table row.
pub const ROW_INDEX_COLUMN: &str = "_row_index";

/// A single table cell: a scalar, or an opaque canonical-text blob holding
/// a nested map that the flatten depth cut off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Scalar(Scalar),
    Blob(String),
}

impl Cell {
    /// True for a null scalar cell.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Scalar(Scalar::Null))
    }

    pub fn null() -> Cell {
        Cell::Scalar(Scalar::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Scalar(s) => write!(f, "{}", s),
            Cell::Blob(text) => write!(f, "{}", text),
        }
    }
}

impl From<Scalar> for Cell {
    fn from(s: Scalar) -> Self {
        Cell::Scalar(s)
    }
}

/// One table row: an ordered column -> cell mapping.
///
/// Rows are allowed to miss columns other rows have; readers treat a
/// missing column as null.
pub type Row = IndexMap<String, Cell>;

/// A named rectangular dataset.
///
/// Columns are kept in first-discovery order; rows in discovery order.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    /// Unique (within one generation pass) table name.
    pub name: String,
    /// Ordered column list.
    pub columns: Vec<String>,
    /// Ordered row list.
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a row, registering any new columns in first-discovery order.
    pub fn push_row(&mut self, row: Row) {
        for column in row.keys() {
            if !self.columns.iter().any(|c| c == column) {
                self.columns.push(column.clone());
            }
        }
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// The cell at (row, column), if the row carries that column.
    pub fn cell<'a>(&self, row: &'a Row, column: &str) -> Option<&'a Cell> {
        row.get(column)
    }

    /// All values of one column, with missing entries as null.
    pub fn column_values(&self, column: &str) -> Vec<Cell> {
        self.rows
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or_else(Cell::null))
            .collect()
    }
}

/// A directed parent-child linkage between two generated tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub parent_table: String,
    pub child_table: String,
    /// The `parent_*` columns carried by the child table's rows.
    pub foreign_key_columns: Vec<String>,
}

/// The output of one generation pass: tables keyed by name plus the
/// relationships between them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Shredded {
    pub tables: IndexMap<String, Table>,
    pub relationships: Vec<Relationship>,
}

impl Shredded {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}
