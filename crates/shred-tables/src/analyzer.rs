//! Diagnostic walk over a document that enumerates its repeating groups.
//!
//! The analyzer feeds no other component. It exists so a caller can see,
//! before shredding, which sequences a document contains, how uniform
//! their key shapes are, and which of them would become tables.

use indexmap::IndexMap;
use serde::Serialize;
use shred_document::Value;

/// Classification of one sequence found during the walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SequenceKind {
    Empty,
    /// Every element is a map. The key-shape statistics distinguish common
    /// keys (present in every element) from optional ones.
    Objects {
        common_keys: Vec<String>,
        optional_keys: Vec<String>,
        all_keys: Vec<String>,
        /// Every element carries exactly the same key set.
        homogeneous: bool,
    },
    /// Every element is a scalar.
    Scalars { element_types: Vec<String> },
    /// Elements mix maps, sequences, and scalars.
    Mixed { element_types: Vec<String> },
}

/// One sequence encountered during analysis, at a dotted document path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceInfo {
    pub path: String,
    pub length: usize,
    #[serde(flatten)]
    pub kind: SequenceKind,
}

impl SequenceInfo {
    pub fn is_object_array(&self) -> bool {
        matches!(self.kind, SequenceKind::Objects { .. })
    }
}

/// An object array that would shred cleanly into a flat table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCandidate {
    pub path: String,
    pub table_name: String,
    pub row_count: usize,
    pub columns: Vec<String>,
    /// Columns every row would populate.
    pub required_columns: Vec<String>,
    pub optional_columns: Vec<String>,
}

/// Everything `StructureAnalyzer::analyze` learned about one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructureReport {
    /// Every non-root sequence, in discovery (depth-first) order.
    pub sequences: Vec<SequenceInfo>,
    /// Sorted common-key signature (comma-joined) -> paths of the object
    /// arrays sharing it. Two arrays with the same signature likely model
    /// the same entity at different places.
    pub patterns: IndexMap<String, Vec<String>>,
}

impl StructureReport {
    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// The object arrays reshaped as table suggestions.
    pub fn table_candidates(&self) -> Vec<TableCandidate> {
        self.sequences
            .iter()
            .filter_map(|info| {
                let SequenceKind::Objects {
                    common_keys,
                    optional_keys,
                    all_keys,
                    ..
                } = &info.kind
                else {
                    return None;
                };
                Some(TableCandidate {
                    path: info.path.clone(),
                    table_name: path_to_table_name(&info.path),
                    row_count: info.length,
                    columns: all_keys.clone(),
                    required_columns: common_keys.clone(),
                    optional_columns: optional_keys.clone(),
                })
            })
            .collect()
    }
}

/// Walks a document and reports every sequence with its key-shape
/// statistics. Stateless; each call produces a fresh report.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureAnalyzer;

impl StructureAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, value: &Value) -> StructureReport {
        let mut report = StructureReport::default();
        traverse(value, "", &mut report);
        tracing::debug!(
            sequences = report.sequences.len(),
            patterns = report.patterns.len(),
            "structure analysis complete"
        );
        report
    }
}

fn traverse(value: &Value, path: &str, report: &mut StructureReport) {
    match value {
        Value::Map(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                traverse(child, &child_path, report);
            }
        }
        Value::Sequence(items) => {
            let info = classify_sequence(items, path);
            if let SequenceKind::Objects { common_keys, .. } = &info.kind {
                report
                    .patterns
                    .entry(common_keys.join(","))
                    .or_default()
                    .push(path.to_string());
            }
            report.sequences.push(info);

            for (index, item) in items.iter().enumerate() {
                traverse(item, &format!("{path}[{index}]"), report);
            }
        }
        Value::Scalar(_) => {}
    }
}

fn classify_sequence(items: &[Value], path: &str) -> SequenceInfo {
    if items.is_empty() {
        return SequenceInfo {
            path: path.to_string(),
            length: 0,
            kind: SequenceKind::Empty,
        };
    }

    let kind = if items.iter().all(Value::is_map) {
        classify_object_array(items)
    } else {
        let element_types = unique_type_names(items);
        if items.iter().all(Value::is_scalar) {
            SequenceKind::Scalars { element_types }
        } else {
            SequenceKind::Mixed { element_types }
        }
    };

    SequenceInfo {
        path: path.to_string(),
        length: items.len(),
        kind,
    }
}

fn classify_object_array(items: &[Value]) -> SequenceKind {
    let key_sets: Vec<Vec<&String>> = items
        .iter()
        .filter_map(Value::as_map)
        .map(|map| map.keys().collect())
        .collect();

    let mut all_keys: Vec<String> = Vec::new();
    for keys in &key_sets {
        for key in keys {
            if !all_keys.contains(key) {
                all_keys.push((*key).clone());
            }
        }
    }
    all_keys.sort();

    let common_keys: Vec<String> = all_keys
        .iter()
        .filter(|key| key_sets.iter().all(|keys| keys.contains(key)))
        .cloned()
        .collect();
    let optional_keys: Vec<String> = all_keys
        .iter()
        .filter(|key| !common_keys.contains(*key))
        .cloned()
        .collect();

    let homogeneous = key_sets
        .windows(2)
        .all(|pair| sorted(&pair[0]) == sorted(&pair[1]));

    SequenceKind::Objects {
        common_keys,
        optional_keys,
        all_keys,
        homogeneous,
    }
}

fn sorted<'a>(keys: &[&'a String]) -> Vec<&'a String> {
    let mut keys = keys.to_vec();
    keys.sort();
    keys
}

/// Unique element type names, in first-seen order.
fn unique_type_names(items: &[Value]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for item in items {
        let name = item.type_name().to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Dotted path (possibly with `[i]` segments) to an uppercase table name.
fn path_to_table_name(path: &str) -> String {
    let normalized = path.replace('[', ".").replace(']', "");
    let parts: Vec<&str> = normalized
        .split('.')
        .filter(|p| !p.is_empty() && !p.chars().all(|c| c.is_ascii_digit()))
        .collect();
    if parts.is_empty() {
        return "UNKNOWN_TABLE".to_string();
    }
    parts.join("_").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shred_document::{parse_str, DocumentFormat};

    fn doc(yaml: &str) -> Value {
        parse_str(yaml, DocumentFormat::Yaml).unwrap()
    }

    #[test]
    fn test_object_array_key_shapes() {
        let value = doc(
            "users:\n\
             \x20 - id: 1\n\
             \x20   name: a\n\
             \x20 - id: 2\n\
             \x20   name: b\n\
             \x20   email: b@example.com\n",
        );

        let report = StructureAnalyzer::new().analyze(&value);
        assert_eq!(report.sequence_count(), 1);

        let info = &report.sequences[0];
        assert_eq!(info.path, "users");
        assert_eq!(info.length, 2);
        let SequenceKind::Objects {
            common_keys,
            optional_keys,
            all_keys,
            homogeneous,
        } = &info.kind
        else {
            panic!("expected object array, got {:?}", info.kind);
        };
        assert_eq!(common_keys, &["id", "name"]);
        assert_eq!(optional_keys, &["email"]);
        assert_eq!(all_keys, &["email", "id", "name"]);
        assert!(!homogeneous);
    }

    #[test]
    fn test_scalar_and_mixed_arrays() {
        let value = doc(
            "tags: [a, b, c]\n\
             odd: [1, {k: v}]\n",
        );

        let report = StructureAnalyzer::new().analyze(&value);
        assert_eq!(report.sequence_count(), 2);

        assert_eq!(
            report.sequences[0].kind,
            SequenceKind::Scalars {
                element_types: vec!["string".to_string()],
            }
        );
        assert_eq!(
            report.sequences[1].kind,
            SequenceKind::Mixed {
                element_types: vec!["int".to_string(), "map".to_string()],
            }
        );
    }

    #[test]
    fn test_nested_sequences_are_found() {
        let value = doc(
            "teams:\n\
             \x20 - name: core\n\
             \x20   members:\n\
             \x20     - id: 1\n\
             \x20     - id: 2\n",
        );

        let report = StructureAnalyzer::new().analyze(&value);
        let paths: Vec<&str> = report.sequences.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["teams", "teams[0].members"]);
    }

    #[test]
    fn test_pattern_index_groups_same_signature() {
        let value = doc(
            "staging:\n\
             \x20 hosts:\n\
             \x20   - {name: a, port: 1}\n\
             production:\n\
             \x20 hosts:\n\
             \x20   - {name: b, port: 2}\n",
        );

        let report = StructureAnalyzer::new().analyze(&value);
        let paths = report.patterns.get("name,port").unwrap();
        assert_eq!(paths, &["staging.hosts", "production.hosts"]);
    }

    #[test]
    fn test_table_candidates() {
        let value = doc(
            "communities:\n\
             \x20 - id: 1\n\
             \x20   name: a\n\
             tags: [x, y]\n",
        );

        let report = StructureAnalyzer::new().analyze(&value);
        let candidates = report.table_candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].table_name, "COMMUNITIES");
        assert_eq!(candidates[0].row_count, 1);
        assert_eq!(candidates[0].columns, vec!["id", "name"]);
    }

    #[test]
    fn test_index_segments_dropped_from_table_name() {
        assert_eq!(path_to_table_name("teams[0].members"), "TEAMS_MEMBERS");
        assert_eq!(path_to_table_name(""), "UNKNOWN_TABLE");
    }
}
