use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised by signature validation and the sync engine.
///
/// A schema mismatch is fatal to the call: merging structurally
/// incompatible documents is unsupported, not auto-coerced.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("left and right must be different files: {path}")]
    SamePath { path: PathBuf },

    #[error(
        "documents do not share the same structural signature; \
         use the table-level comparison to inspect the differences"
    )]
    SchemaMismatch,

    #[error(transparent)]
    Document(#[from] shred_document::DocumentError),
}
