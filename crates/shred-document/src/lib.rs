//! # shred-document
//!
//! Document value model and YAML/JSON loading for shred.
//!
//! This crate provides [`Value`], a closed three-variant tagged union over
//! the shapes a configuration document can take (map, sequence, scalar),
//! plus the loader that parses YAML/JSON files into it and writes values
//! back out in their original serialization format.
//!
//! ## Design
//!
//! Uses the **owned data approach**: documents are fully materialized,
//! immutable-by-convention trees. Every transform downstream (shredding,
//! diffing, merging) produces new values rather than mutating in place, so
//! input and output documents never alias.
//!
//! ## Example
//!
//! ```rust,no_run
//! use shred_document::load_document;
//!
//! let doc = load_document("config.yaml".as_ref()).unwrap();
//! if let Some(app) = doc.root.get("app") {
//!     println!("app is a {}", app.type_name());
//! }
//! ```

mod error;
mod loader;
mod value;

pub use error::{DocumentError, Result};
pub use loader::{
    Document, DocumentFormat, load_document, parse_document, parse_str, write_document,
};
pub use value::{Scalar, Value};
