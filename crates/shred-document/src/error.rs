//! Error types for document loading.

use crate::loader::DocumentFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shred-document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Errors that can occur while loading or writing a document.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// The source file is missing, unreadable, empty, or of an unsupported kind.
    #[error("file error for {path}: {message}")]
    File {
        /// Path that failed
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// The serialized text is malformed for its format.
    #[error("failed to parse {format} document: {message}")]
    Parse {
        /// Serialization format being parsed
        format: DocumentFormat,
        /// Underlying parser message
        message: String,
    },

    /// A location required to be a map holds something else.
    #[error("expected a map at {location}, found {found}")]
    StructuralType {
        /// Where the requirement was violated
        location: String,
        /// Runtime type name actually found
        found: String,
    },
}
