//! Structural signatures: the shape of a document with its data erased.
//!
//! Two documents are sync-eligible only when their signatures are equal.
//! A sequence signs as the sorted, deduplicated set of its element
//! signatures, so reordering elements or inserting another equal-shaped
//! element never changes the signature.

use std::collections::{BTreeMap, BTreeSet};

use shred_document::Value;

/// The recursive shape of a value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Signature {
    /// A scalar leaf, identified by its primitive type name.
    Scalar(&'static str),
    /// A map signs as its sorted key set with each key's signature.
    Map(BTreeMap<String, Signature>),
    /// A sequence signs as the set of distinct element signatures.
    Sequence(BTreeSet<Signature>),
}

impl Signature {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Scalar(scalar) => Signature::Scalar(scalar.type_name()),
            Value::Map(entries) => Signature::Map(
                entries
                    .iter()
                    .map(|(key, child)| (key.clone(), Signature::of(child)))
                    .collect(),
            ),
            Value::Sequence(items) => {
                Signature::Sequence(items.iter().map(Signature::of).collect())
            }
        }
    }
}

/// True when both documents share the same structural shape.
pub fn same_shape(left: &Value, right: &Value) -> bool {
    Signature::of(left) == Signature::of(right)
}
