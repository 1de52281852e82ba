//! Error types for table generation.

use thiserror::Error;

/// Result type alias for shred-tables operations.
pub type Result<T> = std::result::Result<T, ShredError>;

/// Structural errors raised while shredding a document.
///
/// These abort the whole generation pass; callers must not assume any
/// partial table output is usable after one.
#[derive(Debug, Clone, Error)]
pub enum ShredError {
    /// The document root (the only place a map is required up front) is not one.
    #[error("table generation expects a map at the document root, found {found}")]
    NotAMap {
        /// Runtime type name actually found
        found: String,
    },

    /// A sequence mixes maps with scalars or nested sequences.
    ///
    /// Sequences must be uniform: a repeating group (all maps) or a scalar
    /// list (all scalars). Anything else is rejected rather than guessed at
    /// from the first element.
    #[error("sequence at {path} mixes maps with other value kinds")]
    MixedSequence {
        /// Document path of the offending sequence
        path: String,
    },
}
