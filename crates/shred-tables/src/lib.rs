//! # shred-tables
//!
//! Shredding of nested configuration documents into flat, named tables,
//! plus the machinery to reconcile two table sets: a heuristic primary-key
//! detector, a name-based table matcher, and a row- and field-level data
//! comparer.
//!
//! The pipeline is `document -> TableGenerator -> Shredded` for one side,
//! then `DataComparer::compare_datasets` across two `Shredded` values for a
//! full diff. [`StructureAnalyzer`] is a standalone diagnostic that
//! enumerates a document's repeating groups without generating anything.
//!
//! All components are synchronous, own per-call accumulators only, and take
//! their tuning (flatten depth, similarity threshold) as explicit
//! parameters.

mod analyzer;
mod comparer;
mod error;
mod generator;
mod keys;
mod matcher;
mod table;

pub use analyzer::{
    SequenceInfo, SequenceKind, StructureAnalyzer, StructureReport, TableCandidate,
};
pub use comparer::{
    ComparisonMode, DataComparer, DatasetComparison, DatasetSummary, FieldDifference,
    MatchedComparison, TableComparison,
};
pub use error::{Result, ShredError};
pub use generator::{FlattenDepth, GeneratorOptions, TableGenerator};
pub use keys::{KeyDetection, PrimaryKeyDetector};
pub use matcher::{MatchKind, MatchOutcome, TableMatch, TableMatcher};
pub use table::{Cell, Relationship, Row, Shredded, Table};
