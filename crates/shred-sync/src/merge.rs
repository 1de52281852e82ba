//! Directional, source-wins merging of shape-compatible documents.

use std::fmt;

use serde::Serialize;
use shred_document::Value;

/// Which side's values win the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeDirection {
    LeftToRight,
    RightToLeft,
    /// Both files are rewritten, each taking the other side's values.
    Both,
}

impl fmt::Display for MergeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeDirection::LeftToRight => write!(f, "left-to-right"),
            MergeDirection::RightToLeft => write!(f, "right-to-left"),
            MergeDirection::Both => write!(f, "both"),
        }
    }
}

/// Merge `source` into `target`, producing a new tree; neither input is
/// modified.
///
/// For two maps, keys unique to the target are preserved, shared keys
/// recurse, and keys unique to the source are appended as-is. Sequences
/// and scalars are replaced wholesale by the source's value; there is no
/// element-wise list merging.
pub fn merge_values(source: &Value, target: &Value) -> Value {
    match (source, target) {
        (Value::Map(source_map), Value::Map(target_map)) => {
            let mut merged = target_map.clone();
            for (key, source_value) in source_map {
                match merged.get_mut(key) {
                    Some(existing) => *existing = merge_values(source_value, existing),
                    None => {
                        merged.insert(key.clone(), source_value.clone());
                    }
                }
            }
            Value::Map(merged)
        }
        (source, _) => source.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shred_document::{parse_document, DocumentFormat, Scalar};

    fn doc(yaml: &str) -> Value {
        parse_document(yaml, DocumentFormat::Yaml).unwrap()
    }

    #[test]
    fn test_source_wins_shared_keys() {
        let source = doc("app:\n  name: a\n  replicas: 2\n");
        let target = doc("app:\n  name: b\n  replicas: 1\n");

        let merged = merge_values(&source, &target);
        let app = merged.get("app").unwrap();
        assert_eq!(app.get("name").unwrap().as_scalar(), Some(&Scalar::from("a")));
        assert_eq!(app.get("replicas").unwrap().as_scalar(), Some(&Scalar::Int(2)));
    }

    #[test]
    fn test_target_only_keys_survive() {
        let source = doc("shared: new\n");
        let target = doc("shared: old\nkept: here\n");

        let merged = merge_values(&source, &target);
        assert_eq!(merged.get("kept").unwrap().as_scalar(), Some(&Scalar::from("here")));
        assert_eq!(merged.get("shared").unwrap().as_scalar(), Some(&Scalar::from("new")));
    }

    #[test]
    fn test_source_only_keys_appended() {
        let source = doc("a: 1\nadded: yes_\n");
        let target = doc("a: 1\n");

        let merged = merge_values(&source, &target);
        let keys: Vec<_> = merged.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "added"]);
    }

    #[test]
    fn test_sequences_replaced_wholesale() {
        let source = doc("items:\n  - 1\n");
        let target = doc("items:\n  - 1\n  - 2\n  - 3\n");

        let merged = merge_values(&source, &target);
        let items = merged.get("items").unwrap().as_sequence().unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_inputs_are_untouched() {
        let source = doc("a: new\n");
        let target = doc("a: old\nb: 2\n");
        let source_before = source.clone();
        let target_before = target.clone();

        let _ = merge_values(&source, &target);
        assert_eq!(source, source_before);
        assert_eq!(target, target_before);
    }
}
