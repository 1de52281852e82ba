//! Lock-step tree diff over two shape-compatible documents.
//!
//! The walk is deterministic: map keys are visited in sorted order per
//! node (missing-in-right first, then missing-in-left, then shared) and
//! sequences by position. Paths are root-anchored, with dotted map keys
//! and bracketed sequence indices, e.g. `$.root.app.replicas` or
//! `$.items[2].name`.

use serde::Serialize;
use shred_document::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// Present on the right only.
    MissingInLeft,
    /// Present on the left only.
    MissingInRight,
    /// Present on both sides with unequal values (or diverging shapes).
    DifferentValue,
}

/// One point where the two documents disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    pub path: String,
    pub kind: DiscrepancyKind,
    pub left: Option<Value>,
    pub right: Option<Value>,
    /// Runtime type name of each side, when that side is present.
    pub left_type: Option<&'static str>,
    pub right_type: Option<&'static str>,
}

impl Discrepancy {
    fn missing_in_left(path: String, right: &Value) -> Self {
        Self {
            path,
            kind: DiscrepancyKind::MissingInLeft,
            left: None,
            right: Some(right.clone()),
            left_type: None,
            right_type: Some(right.type_name()),
        }
    }

    fn missing_in_right(path: String, left: &Value) -> Self {
        Self {
            path,
            kind: DiscrepancyKind::MissingInRight,
            left: Some(left.clone()),
            right: None,
            left_type: Some(left.type_name()),
            right_type: None,
        }
    }

    fn different_value(path: String, left: &Value, right: &Value) -> Self {
        Self {
            path,
            kind: DiscrepancyKind::DifferentValue,
            left: Some(left.clone()),
            right: Some(right.clone()),
            left_type: Some(left.type_name()),
            right_type: Some(right.type_name()),
        }
    }
}

/// Walk both documents in lock-step and collect every discrepancy.
pub fn diff_values(left: &Value, right: &Value) -> Vec<Discrepancy> {
    let mut discrepancies = Vec::new();
    walk(left, right, "$", &mut discrepancies);
    discrepancies
}

fn walk(left: &Value, right: &Value, path: &str, out: &mut Vec<Discrepancy>) {
    match (left, right) {
        (Value::Map(left_map), Value::Map(right_map)) => {
            let mut left_keys: Vec<&String> = left_map.keys().collect();
            left_keys.sort();
            let mut right_keys: Vec<&String> = right_map.keys().collect();
            right_keys.sort();

            for key in &left_keys {
                if !right_map.contains_key(*key) {
                    out.push(Discrepancy::missing_in_right(
                        format!("{path}.{key}"),
                        &left_map[*key],
                    ));
                }
            }
            for key in &right_keys {
                if !left_map.contains_key(*key) {
                    out.push(Discrepancy::missing_in_left(
                        format!("{path}.{key}"),
                        &right_map[*key],
                    ));
                }
            }
            for key in &left_keys {
                if let Some(right_child) = right_map.get(*key) {
                    walk(&left_map[*key], right_child, &format!("{path}.{key}"), out);
                }
            }
        }
        (Value::Sequence(left_items), Value::Sequence(right_items)) => {
            let longer = left_items.len().max(right_items.len());
            for index in 0..longer {
                let item_path = format!("{path}[{index}]");
                match (left_items.get(index), right_items.get(index)) {
                    (Some(left_item), Some(right_item)) => {
                        walk(left_item, right_item, &item_path, out);
                    }
                    (Some(left_item), None) => {
                        out.push(Discrepancy::missing_in_right(item_path, left_item));
                    }
                    (None, Some(right_item)) => {
                        out.push(Discrepancy::missing_in_left(item_path, right_item));
                    }
                    (None, None) => unreachable!(),
                }
            }
        }
        // Scalar leaves, and any point where the two shapes diverge.
        (left, right) => {
            if left != right {
                out.push(Discrepancy::different_value(path.to_string(), left, right));
            }
        }
    }
}
