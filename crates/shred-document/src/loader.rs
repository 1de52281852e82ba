//! One-shot loading and writing of YAML/JSON documents.
//!
//! The loader is the gatekeeper for everything downstream: it rejects
//! missing, empty, and malformed sources and guarantees the root of every
//! loaded document is a map before any core component sees it.

use crate::error::{DocumentError, Result};
use crate::value::{Scalar, Value};
use indexmap::IndexMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use yaml_rust2::yaml::Hash;
use yaml_rust2::{Yaml, YamlEmitter, YamlLoader};

/// Serialization format of a document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Derive the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            Some("json") => Ok(DocumentFormat::Json),
            other => Err(DocumentError::File {
                path: path.to_path_buf(),
                message: format!(
                    "unsupported extension {:?}; expected .yaml, .yml, or .json",
                    other.unwrap_or("")
                ),
            }),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Yaml => write!(f, "YAML"),
            DocumentFormat::Json => write!(f, "JSON"),
        }
    }
}

/// A loaded document: its map-rooted value tree plus where it came from.
#[derive(Debug, Clone)]
pub struct Document {
    /// The root value; guaranteed to be a `Value::Map`.
    pub root: Value,
    /// Serialization format of the source.
    pub format: DocumentFormat,
    /// Source path.
    pub path: PathBuf,
}

/// Load a document from a file, deriving the format from its extension.
///
/// # Errors
///
/// Returns `DocumentError::File` for missing, unreadable, or empty files
/// and unsupported extensions; `DocumentError::Parse` for malformed text;
/// `DocumentError::StructuralType` when the root is not a map.
pub fn load_document(path: &Path) -> Result<Document> {
    let format = DocumentFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|e| DocumentError::File {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if content.trim().is_empty() {
        return Err(DocumentError::File {
            path: path.to_path_buf(),
            message: "file is empty".to_string(),
        });
    }

    let root = parse_document(&content, format)?;
    Ok(Document {
        root,
        format,
        path: path.to_path_buf(),
    })
}

/// Parse serialized text into a value tree, requiring a map root.
pub fn parse_document(content: &str, format: DocumentFormat) -> Result<Value> {
    let root = parse_str(content, format)?;
    if !root.is_map() {
        return Err(DocumentError::StructuralType {
            location: "document root".to_string(),
            found: root.type_name().to_string(),
        });
    }
    Ok(root)
}

/// Parse serialized text into a value tree without shape requirements.
///
/// If a YAML source holds multiple documents, only the first is parsed.
pub fn parse_str(content: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Yaml => {
            let docs = YamlLoader::load_from_str(content).map_err(|e| DocumentError::Parse {
                format,
                message: e.to_string(),
            })?;
            let doc = docs.into_iter().next().ok_or_else(|| DocumentError::Parse {
                format,
                message: "document contains no data".to_string(),
            })?;
            value_from_yaml(&doc)
        }
        DocumentFormat::Json => {
            let json: serde_json::Value =
                serde_json::from_str(content).map_err(|e| DocumentError::Parse {
                    format,
                    message: e.to_string(),
                })?;
            Ok(value_from_json(&json))
        }
    }
}

/// Write a value tree to a file in the given serialization format.
///
/// This is a one-shot whole-file write; the handle is released on every
/// exit path.
pub fn write_document(path: &Path, value: &Value, format: DocumentFormat) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| DocumentError::File {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    }

    let text = match format {
        DocumentFormat::Yaml => {
            let yaml = value_to_yaml(value);
            let mut out = String::new();
            let mut emitter = YamlEmitter::new(&mut out);
            emitter.dump(&yaml).map_err(|e| DocumentError::File {
                path: path.to_path_buf(),
                message: format!("YAML emit failed: {}", e),
            })?;
            out.push('\n');
            out
        }
        DocumentFormat::Json => {
            let mut out = serde_json::to_string_pretty(&value.to_json()).map_err(|e| {
                DocumentError::File {
                    path: path.to_path_buf(),
                    message: format!("JSON emit failed: {}", e),
                }
            })?;
            out.push('\n');
            out
        }
    };

    fs::write(path, text).map_err(|e| DocumentError::File {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn value_from_yaml(yaml: &Yaml) -> Result<Value> {
    match yaml {
        Yaml::Null => Ok(Value::Scalar(Scalar::Null)),
        Yaml::Boolean(b) => Ok(Value::Scalar(Scalar::Bool(*b))),
        Yaml::Integer(i) => Ok(Value::Scalar(Scalar::Int(*i))),
        Yaml::Real(raw) => {
            let parsed = raw.parse::<f64>().map_err(|_| DocumentError::Parse {
                format: DocumentFormat::Yaml,
                message: format!("invalid float literal: {}", raw),
            })?;
            Ok(Value::Scalar(Scalar::Float(parsed)))
        }
        Yaml::String(s) => Ok(Value::Scalar(Scalar::String(s.clone()))),
        Yaml::Array(items) => {
            let converted = items.iter().map(value_from_yaml).collect::<Result<_>>()?;
            Ok(Value::Sequence(converted))
        }
        Yaml::Hash(entries) => {
            let mut map = IndexMap::with_capacity(entries.len());
            for (key, value) in entries {
                let key = yaml_key_to_string(key)?;
                map.insert(key, value_from_yaml(value)?);
            }
            Ok(Value::Map(map))
        }
        Yaml::Alias(_) | Yaml::BadValue => Err(DocumentError::Parse {
            format: DocumentFormat::Yaml,
            message: "unsupported YAML node (alias or invalid value)".to_string(),
        }),
    }
}

/// Mapping keys must be scalars; they are rendered canonically as strings.
fn yaml_key_to_string(key: &Yaml) -> Result<String> {
    match key {
        Yaml::String(s) => Ok(s.clone()),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(raw) => Ok(raw.clone()),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(DocumentError::Parse {
            format: DocumentFormat::Yaml,
            message: format!("unsupported mapping key of type {:?}", other),
        }),
    }
}

fn value_from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Scalar(Scalar::Null),
        serde_json::Value::Bool(b) => Value::Scalar(Scalar::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Scalar(Scalar::Int(i))
            } else {
                Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        serde_json::Value::String(s) => Value::Scalar(Scalar::String(s.clone())),
        serde_json::Value::Array(items) => {
            Value::Sequence(items.iter().map(value_from_json).collect())
        }
        serde_json::Value::Object(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_from_json(v)))
                .collect(),
        ),
    }
}

fn value_to_yaml(value: &Value) -> Yaml {
    match value {
        Value::Scalar(Scalar::Null) => Yaml::Null,
        Value::Scalar(Scalar::Bool(b)) => Yaml::Boolean(*b),
        Value::Scalar(Scalar::Int(i)) => Yaml::Integer(*i),
        Value::Scalar(Scalar::Float(x)) => Yaml::Real(float_literal(*x)),
        Value::Scalar(Scalar::String(s)) => Yaml::String(s.clone()),
        Value::Sequence(items) => Yaml::Array(items.iter().map(value_to_yaml).collect()),
        Value::Map(entries) => {
            let mut hash = Hash::new();
            for (key, value) in entries {
                hash.insert(Yaml::String(key.clone()), value_to_yaml(value));
            }
            Yaml::Hash(hash)
        }
    }
}

/// Render a float so it re-parses as a float, not an integer.
fn float_literal(x: f64) -> String {
    let rendered = format!("{}", x);
    if rendered.contains('.') || rendered.contains('e') || rendered.contains("inf") {
        rendered
    } else {
        format!("{}.0", rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_map_root() {
        let root = parse_document("app:\n  name: demo\n  replicas: 2\n", DocumentFormat::Yaml)
            .unwrap();
        let app = root.get("app").unwrap();
        assert_eq!(app.get("name").unwrap().as_scalar(), Some(&Scalar::from("demo")));
        assert_eq!(app.get("replicas").unwrap().as_scalar(), Some(&Scalar::Int(2)));
    }

    #[test]
    fn test_parse_preserves_key_order() {
        let root = parse_document("b: 1\na: 2\nc: 3\n", DocumentFormat::Yaml).unwrap();
        let keys: Vec<_> = root.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_reject_sequence_root() {
        let err = parse_document("- 1\n- 2\n", DocumentFormat::Yaml).unwrap_err();
        assert!(matches!(err, DocumentError::StructuralType { .. }));
    }

    #[test]
    fn test_reject_scalar_root() {
        let err = parse_document("42", DocumentFormat::Json).unwrap_err();
        assert!(matches!(err, DocumentError::StructuralType { .. }));
    }

    #[test]
    fn test_reject_malformed_json() {
        let err = parse_document("{not json", DocumentFormat::Json).unwrap_err();
        assert!(matches!(err, DocumentError::Parse { .. }));
    }

    #[test]
    fn test_json_numbers() {
        let root = parse_document(r#"{"a": 1, "b": 2.5}"#, DocumentFormat::Json).unwrap();
        assert_eq!(root.get("a").unwrap().type_name(), "int");
        assert_eq!(root.get("b").unwrap().type_name(), "float");
    }

    #[test]
    fn test_load_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, DocumentError::File { .. }));
    }

    #[test]
    fn test_load_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, DocumentError::File { .. }));
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.toml");
        std::fs::write(&path, "a = 1\n").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, DocumentError::File { .. }));
    }

    #[test]
    fn test_yaml_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yaml");

        let original =
            parse_document("app:\n  name: demo\n  ratio: 2.0\n  tags:\n    - a\n    - b\n",
                DocumentFormat::Yaml)
            .unwrap();
        write_document(&path, &original, DocumentFormat::Yaml).unwrap();

        let reloaded = load_document(&path).unwrap();
        assert_eq!(reloaded.root, original);
    }

    #[test]
    fn test_json_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let original = parse_document(
            r#"{"app": {"name": "demo", "replicas": 3, "flags": [true, false]}}"#,
            DocumentFormat::Json,
        )
        .unwrap();
        write_document(&path, &original, DocumentFormat::Json).unwrap();

        let reloaded = load_document(&path).unwrap();
        assert_eq!(reloaded.root, original);
    }
}
