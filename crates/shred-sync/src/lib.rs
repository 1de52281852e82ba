//! # shred-sync
//!
//! Schema-signature validation, tree diffing, and directional merging of
//! whole documents.
//!
//! Unlike the table-level comparison in `shred-tables`, everything here
//! operates on raw document trees. Two documents must share an identical
//! structural signature before they can be diffed or merged; documents
//! with differing shapes are rejected with [`SyncError::SchemaMismatch`]
//! and belong in the looser table-level workflow instead.
//!
//! ## Example
//!
//! ```rust,no_run
//! use shred_sync::{SyncEngine, SyncOptions};
//!
//! let outcome = SyncEngine::new()
//!     .sync(
//!         "staging.yaml".as_ref(),
//!         "production.yaml".as_ref(),
//!         &SyncOptions::default(),
//!     )
//!     .unwrap();
//! for discrepancy in &outcome.discrepancies {
//!     println!("{}: {:?}", discrepancy.path, discrepancy.kind);
//! }
//! ```

mod diff;
mod engine;
mod error;
mod merge;
mod signature;

pub use diff::{Discrepancy, DiscrepancyKind, diff_values};
pub use engine::{MergeSide, MergedOutput, SyncEngine, SyncOptions, SyncOutcome};
pub use error::{Result, SyncError};
pub use merge::{MergeDirection, merge_values};
pub use signature::{Signature, same_shape};
