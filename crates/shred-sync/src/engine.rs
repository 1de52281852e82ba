//! File-level orchestration: validate, diff, and optionally merge two
//! documents.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use shred_document::{load_document, write_document, Document, DocumentFormat};

use crate::diff::{diff_values, Discrepancy};
use crate::error::{Result, SyncError};
use crate::merge::{merge_values, MergeDirection};
use crate::signature::same_shape;

/// Per-call settings for [`SyncEngine::sync`].
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// When set, merge in this direction after diffing. `None` is
    /// report-only.
    pub merge: Option<MergeDirection>,
    /// Where to write the merged left document; defaults to the left
    /// input path.
    pub left_output: Option<PathBuf>,
    /// Where to write the merged right document; defaults to the right
    /// input path.
    pub right_output: Option<PathBuf>,
}

/// Which input a merged output replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeSide {
    Left,
    Right,
}

/// A file rewritten by the merge step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedOutput {
    pub side: MergeSide,
    pub path: PathBuf,
}

/// What one sync call produced.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub discrepancies: Vec<Discrepancy>,
    pub merged_outputs: Vec<MergedOutput>,
}

/// Validates two documents share a structural signature, diffs them, and
/// optionally merges one into the other.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncEngine;

impl SyncEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run the full sync flow over two document files.
    ///
    /// # Errors
    ///
    /// Fails when both paths resolve to the same file, when either
    /// document cannot be loaded, or when the two documents do not share
    /// the same structural signature. Merging incompatible shapes is
    /// unsupported; no partial output is produced on any error.
    pub fn sync(
        &self,
        left_path: &Path,
        right_path: &Path,
        options: &SyncOptions,
    ) -> Result<SyncOutcome> {
        if resolve(left_path) == resolve(right_path) {
            return Err(SyncError::SamePath {
                path: left_path.to_path_buf(),
            });
        }

        let left = load_document(left_path)?;
        let right = load_document(right_path)?;

        if !same_shape(&left.root, &right.root) {
            return Err(SyncError::SchemaMismatch);
        }

        let discrepancies = diff_values(&left.root, &right.root);
        tracing::info!(
            left = %left_path.display(),
            right = %right_path.display(),
            discrepancies = discrepancies.len(),
            "tree diff complete"
        );

        let mut merged_outputs = Vec::new();
        if let Some(direction) = options.merge {
            tracing::info!(%direction, "merging");

            if matches!(direction, MergeDirection::LeftToRight | MergeDirection::Both) {
                let merged = merge_values(&left.root, &right.root);
                let target = options.right_output.as_deref().unwrap_or(right_path);
                write_merged(target, &merged, &right)?;
                merged_outputs.push(MergedOutput {
                    side: MergeSide::Right,
                    path: target.to_path_buf(),
                });
            }
            if matches!(direction, MergeDirection::RightToLeft | MergeDirection::Both) {
                let merged = merge_values(&right.root, &left.root);
                let target = options.left_output.as_deref().unwrap_or(left_path);
                write_merged(target, &merged, &left)?;
                merged_outputs.push(MergedOutput {
                    side: MergeSide::Left,
                    path: target.to_path_buf(),
                });
            }
        }

        Ok(SyncOutcome {
            discrepancies,
            merged_outputs,
        })
    }
}

/// Serialize in the format the target location implies, falling back to
/// the source document's format when the extension is unrecognized.
fn write_merged(
    target: &Path,
    merged: &shred_document::Value,
    source: &Document,
) -> Result<()> {
    let format = DocumentFormat::from_path(target).unwrap_or(source.format);
    write_document(target, merged, format)?;
    Ok(())
}

fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiscrepancyKind;
    use shred_document::Scalar;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_same_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.yaml", "x: 1\n");

        let err = SyncEngine::new()
            .sync(&path, &path, &SyncOptions::default())
            .unwrap_err();
        assert!(matches!(err, SyncError::SamePath { .. }));
    }

    #[test]
    fn test_schema_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let left = write(dir.path(), "left.yaml", "app:\n  name: a\n");
        let right = write(dir.path(), "right.yaml", "app:\n  name: b\n  extra: 1\n");

        let err = SyncEngine::new()
            .sync(&left, &right, &SyncOptions::default())
            .unwrap_err();
        assert!(matches!(err, SyncError::SchemaMismatch));
    }

    #[test]
    fn test_report_only_sync() {
        let dir = tempfile::tempdir().unwrap();
        let left = write(
            dir.path(),
            "left.yaml",
            "root:\n  app:\n    name: a\n    replicas: 2\n",
        );
        let right = write(
            dir.path(),
            "right.yaml",
            "root:\n  app:\n    name: b\n    replicas: 1\n",
        );

        let outcome = SyncEngine::new()
            .sync(&left, &right, &SyncOptions::default())
            .unwrap();

        assert!(outcome.merged_outputs.is_empty());
        assert_eq!(outcome.discrepancies.len(), 2);
        assert_eq!(outcome.discrepancies[0].path, "$.root.app.name");
        assert_eq!(outcome.discrepancies[0].kind, DiscrepancyKind::DifferentValue);
        assert_eq!(outcome.discrepancies[1].path, "$.root.app.replicas");
    }

    #[test]
    fn test_left_to_right_merge_updates_right() {
        let dir = tempfile::tempdir().unwrap();
        let left = write(
            dir.path(),
            "left.yaml",
            "root:\n  app:\n    name: a\n    replicas: 2\n",
        );
        let right = write(
            dir.path(),
            "right.yaml",
            "root:\n  app:\n    name: b\n    replicas: 1\n",
        );

        let outcome = SyncEngine::new()
            .sync(
                &left,
                &right,
                &SyncOptions {
                    merge: Some(MergeDirection::LeftToRight),
                    ..SyncOptions::default()
                },
            )
            .unwrap();

        assert_eq!(outcome.merged_outputs.len(), 1);
        assert_eq!(outcome.merged_outputs[0].side, MergeSide::Right);

        let updated = load_document(&right).unwrap();
        let app = updated.root.get("root").unwrap().get("app").unwrap();
        assert_eq!(app.get("name").unwrap().as_scalar(), Some(&Scalar::from("a")));
        assert_eq!(app.get("replicas").unwrap().as_scalar(), Some(&Scalar::Int(2)));
    }

    #[test]
    fn test_right_to_left_merge_updates_left() {
        let dir = tempfile::tempdir().unwrap();
        let left = write(dir.path(), "left.yaml", "app:\n  name: a\n");
        let right = write(dir.path(), "right.yaml", "app:\n  name: b\n");

        let outcome = SyncEngine::new()
            .sync(
                &left,
                &right,
                &SyncOptions {
                    merge: Some(MergeDirection::RightToLeft),
                    ..SyncOptions::default()
                },
            )
            .unwrap();

        assert_eq!(outcome.merged_outputs[0].side, MergeSide::Left);
        let updated = load_document(&left).unwrap();
        let name = updated.root.get("app").unwrap().get("name").unwrap();
        assert_eq!(name.as_scalar(), Some(&Scalar::from("b")));
    }

    #[test]
    fn test_both_direction_rewrites_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let left = write(dir.path(), "left.yaml", "a: 1\nb: left\n");
        let right = write(dir.path(), "right.yaml", "a: 2\nb: right\n");

        let outcome = SyncEngine::new()
            .sync(
                &left,
                &right,
                &SyncOptions {
                    merge: Some(MergeDirection::Both),
                    ..SyncOptions::default()
                },
            )
            .unwrap();

        assert_eq!(outcome.merged_outputs.len(), 2);
        // Right is written first from the originally loaded documents, so
        // each side ends up with the other's values.
        let new_right = load_document(&right).unwrap();
        assert_eq!(new_right.root.get("a").unwrap().as_scalar(), Some(&Scalar::Int(1)));
        let new_left = load_document(&left).unwrap();
        assert_eq!(new_left.root.get("a").unwrap().as_scalar(), Some(&Scalar::Int(2)));
    }

    #[test]
    fn test_alternate_output_preserves_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let left = write(dir.path(), "left.yaml", "a: 1\n");
        let right = write(dir.path(), "right.yaml", "a: 2\n");
        let out = dir.path().join("merged.json");

        let outcome = SyncEngine::new()
            .sync(
                &left,
                &right,
                &SyncOptions {
                    merge: Some(MergeDirection::LeftToRight),
                    right_output: Some(out.clone()),
                    ..SyncOptions::default()
                },
            )
            .unwrap();

        assert_eq!(outcome.merged_outputs[0].path, out);
        // Output format follows the target extension.
        let merged = load_document(&out).unwrap();
        assert_eq!(merged.format, DocumentFormat::Json);
        assert_eq!(merged.root.get("a").unwrap().as_scalar(), Some(&Scalar::Int(1)));
        // The right input is untouched.
        let right_doc = load_document(&right).unwrap();
        assert_eq!(right_doc.root.get("a").unwrap().as_scalar(), Some(&Scalar::Int(2)));
    }
}
