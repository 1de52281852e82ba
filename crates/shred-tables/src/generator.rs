//! Table generation: shredding one document into flat tables.
//!
//! The generator converts a map-rooted document into `{table name ->
//! rectangular dataset}` plus a relationship list:
//!
//! - root-level scalars land in a single-row descriptor table;
//! - each root-level nested map becomes a one-row table of its own;
//! - every sequence of maps, at any nesting depth, becomes a child table
//!   (the flatten depth never inlines a repeating group);
//! - nested map fields are inlined into underscore-joined columns until the
//!   flatten depth is exhausted, after which the remainder is serialized
//!   into a single canonical-JSON blob column;
//! - sequences of scalars are joined into one delimited string column.
//!
//! Child rows carry `parent_<key>` columns copied from the identifying
//! fields of their enclosing maps plus a positional `_row_index`. Groups at
//! the same document path (e.g. under sibling parent rows) accumulate into
//! one table; rows are deduplicated by full-row equality (index excluded)
//! before the index is assigned. Same document, same options: same tables,
//! same column order, same row order.

use crate::error::{Result, ShredError};
use crate::table::{Cell, Relationship, Row, ROW_INDEX_COLUMN, Shredded, Table};
use indexmap::IndexMap;
use shred_document::{Scalar, Value};
use std::collections::HashSet;

/// Identifying fields considered for parent linkage, in priority order.
const PARENT_KEY_PRIORITY: [&str; 3] = ["id", "name", "code"];

/// Delimiter used when a sequence of scalars is joined into one column.
const SCALAR_LIST_DELIMITER: &str = ", ";

/// How many nested-map levels are inlined into underscore-joined column
/// names before the remainder becomes an opaque blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlattenDepth {
    /// Inline nested maps without limit.
    #[default]
    Unlimited,
    /// Inline this many levels; `Limit(0)` blobs the first nested map.
    Limit(usize),
}

impl FlattenDepth {
    fn allows_inlining(self, depth: usize) -> bool {
        match self {
            FlattenDepth::Unlimited => true,
            FlattenDepth::Limit(limit) => depth < limit,
        }
    }
}

/// Explicit generator configuration; there are no module-level defaults.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    pub flatten_depth: FlattenDepth,
}

/// Converts one document into tables and relationships.
#[derive(Debug, Clone, Default)]
pub struct TableGenerator {
    options: GeneratorOptions,
}

impl TableGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    /// Shred `document` into tables, naming the descriptor table `root_name`.
    ///
    /// # Errors
    ///
    /// `ShredError::NotAMap` if the document root is not a map;
    /// `ShredError::MixedSequence` if any sequence mixes maps with other
    /// value kinds. Either error aborts the pass with no partial output.
    pub fn generate(&self, document: &Value, root_name: &str) -> Result<Shredded> {
        let root = document.as_map().ok_or_else(|| ShredError::NotAMap {
            found: document.type_name().to_string(),
        })?;

        let mut pass = GenerationPass {
            options: &self.options,
            map_tables: IndexMap::new(),
            group_rows: IndexMap::new(),
            group_names: IndexMap::new(),
            relationships: Vec::new(),
            linked_children: HashSet::new(),
        };
        pass.run(root, root_name)?;
        let out = pass.finish();

        tracing::debug!(
            tables = out.tables.len(),
            relationships = out.relationships.len(),
            root = root_name,
            "generated tables"
        );
        Ok(out)
    }
}

/// Sequence classification used while shredding; sequences must be uniform.
enum SequenceShape<'a> {
    Maps(Vec<&'a IndexMap<String, Value>>),
    Scalars(Vec<&'a Scalar>),
    Mixed,
}

fn classify_sequence(items: &[Value]) -> SequenceShape<'_> {
    if items.iter().all(Value::is_map) {
        SequenceShape::Maps(items.iter().filter_map(Value::as_map).collect())
    } else if items.iter().all(Value::is_scalar) {
        SequenceShape::Scalars(items.iter().filter_map(Value::as_scalar).collect())
    } else {
        SequenceShape::Mixed
    }
}

/// Per-call accumulator for one generation pass.
///
/// Group rows are gathered here first because sibling parent rows feed the
/// same child table; dedup and index assignment happen once all rows of a
/// table are known.
struct GenerationPass<'a> {
    options: &'a GeneratorOptions,
    /// Descriptor and root-map tables, already final.
    map_tables: IndexMap<String, Table>,
    /// Raw rows per group table, pre-dedup.
    group_rows: IndexMap<String, Vec<Row>>,
    /// Assigned table name per group path. Sibling parents reuse the
    /// entry; a distinct path whose derived name is taken gets a suffix.
    group_names: IndexMap<Vec<String>, String>,
    relationships: Vec<Relationship>,
    /// Child tables with a relationship already recorded (first wins).
    linked_children: HashSet<String>,
}

impl GenerationPass<'_> {
    fn run(&mut self, root: &IndexMap<String, Value>, root_name: &str) -> Result<()> {
        // Root-level identifying fields link top-level repeating groups.
        let root_keys = extend_parent_keys(&IndexMap::new(), root);

        // Descriptor table: root scalars plus joined root scalar lists.
        let mut descriptor = Row::new();
        for (key, value) in root {
            match value {
                Value::Scalar(s) => {
                    descriptor.insert(key.clone(), Cell::Scalar(s.clone()));
                }
                Value::Sequence(items) if !items.is_empty() => match classify_sequence(items) {
                    SequenceShape::Scalars(scalars) => {
                        descriptor.insert(key.clone(), joined_scalars(&scalars));
                    }
                    SequenceShape::Maps(_) => {} // becomes a child table below
                    SequenceShape::Mixed => {
                        return Err(ShredError::MixedSequence { path: key.clone() });
                    }
                },
                _ => {}
            }
        }
        if !descriptor.is_empty() {
            let mut table = Table::new(root_name);
            table.push_row(descriptor);
            self.map_tables.insert(root_name.to_string(), table);
        }

        // Root-level nested maps each become a one-row table; repeating
        // groups found inside them link back to that table.
        for (key, value) in root {
            let path = vec![key.clone()];
            match value {
                Value::Map(nested) => {
                    let table_name = self.add_map_table(nested, &path)?;
                    self.collect_groups(nested, &path, &table_name, &root_keys)?;
                }
                Value::Sequence(items) if !items.is_empty() => {
                    if let SequenceShape::Maps(elements) = classify_sequence(items) {
                        self.add_group(&elements, &path, root_name, &root_keys)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Shredded {
        let mut out = Shredded {
            tables: self.map_tables,
            relationships: self.relationships,
        };
        for (name, rows) in self.group_rows.drain(..) {
            let mut table = Table::new(name.clone());
            for row in dedup_and_index(rows) {
                table.push_row(row);
            }
            out.tables.insert(name, table);
        }
        out
    }

    /// One-row table for a root-level nested map.
    fn add_map_table(&mut self, map: &IndexMap<String, Value>, path: &[String]) -> Result<String> {
        let name = self.unique_table_name(&path_to_table_name(path));
        let mut row = Row::new();
        self.flatten_into(map, "", 0, path, &mut row)?;

        let mut table = Table::new(name.clone());
        table.push_row(row);
        self.map_tables.insert(name.clone(), table);
        Ok(name)
    }

    /// Add a repeating group's rows and recurse into its elements for
    /// further groups. Elements from sibling parents share one table.
    fn add_group(
        &mut self,
        elements: &[&IndexMap<String, Value>],
        path: &[String],
        parent_table: &str,
        parent_keys: &IndexMap<String, Scalar>,
    ) -> Result<()> {
        let name = self.group_table_name(path);

        for element in elements {
            let mut row = Row::new();
            self.flatten_into(element, "", 0, path, &mut row)?;
            for (key, value) in parent_keys {
                row.insert(format!("parent_{}", key), Cell::Scalar(value.clone()));
            }
            self.group_rows.entry(name.clone()).or_default().push(row);
        }

        // A relationship is emitted only when parent-linking columns exist.
        if !parent_keys.is_empty() && self.linked_children.insert(name.clone()) {
            self.relationships.push(Relationship {
                parent_table: parent_table.to_string(),
                child_table: name.clone(),
                foreign_key_columns: parent_keys
                    .keys()
                    .map(|k| format!("parent_{}", k))
                    .collect(),
            });
        }

        for element in elements {
            self.collect_groups(element, path, &name, parent_keys)?;
        }
        Ok(())
    }

    /// Find every repeating group nested under `map`, at any depth.
    ///
    /// Depth limits never apply here: a sequence of maps always becomes a
    /// child table, even inside a region the flattener turned into a blob.
    fn collect_groups(
        &mut self,
        map: &IndexMap<String, Value>,
        path: &[String],
        parent_table: &str,
        inherited_keys: &IndexMap<String, Scalar>,
    ) -> Result<()> {
        let keys = extend_parent_keys(inherited_keys, map);

        for (key, value) in map {
            let mut child_path = path.to_vec();
            child_path.push(key.clone());

            match value {
                Value::Map(nested) => {
                    self.collect_groups(nested, &child_path, parent_table, &keys)?;
                }
                Value::Sequence(items) if !items.is_empty() => match classify_sequence(items) {
                    SequenceShape::Maps(elements) => {
                        self.add_group(&elements, &child_path, parent_table, &keys)?;
                    }
                    SequenceShape::Scalars(_) => {} // joined during flattening
                    SequenceShape::Mixed => {
                        return Err(ShredError::MixedSequence {
                            path: child_path.join("."),
                        });
                    }
                },
                _ => {}
            }
        }
        Ok(())
    }

    /// Flatten a map into row columns, inlining nested maps while the depth
    /// allows and blobbing the remainder as canonical JSON.
    fn flatten_into(
        &self,
        map: &IndexMap<String, Value>,
        prefix: &str,
        depth: usize,
        path: &[String],
        row: &mut Row,
    ) -> Result<()> {
        for (key, value) in map {
            let column = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}_{}", prefix, key)
            };

            match value {
                Value::Scalar(s) => {
                    row.insert(column, Cell::Scalar(s.clone()));
                }
                Value::Map(nested) => {
                    if self.options.flatten_depth.allows_inlining(depth) {
                        self.flatten_into(nested, &column, depth + 1, path, row)?;
                    } else {
                        row.insert(column, Cell::Blob(value.to_json().to_string()));
                    }
                }
                Value::Sequence(items) => {
                    if items.is_empty() {
                        continue;
                    }
                    match classify_sequence(items) {
                        SequenceShape::Scalars(scalars) => {
                            row.insert(column, joined_scalars(&scalars));
                        }
                        SequenceShape::Maps(_) => {} // extracted as a child table
                        SequenceShape::Mixed => {
                            let mut seq_path = path.to_vec();
                            seq_path.push(key.clone());
                            return Err(ShredError::MixedSequence {
                                path: seq_path.join("."),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Assigned name for the group at `path`, allocating one on first use.
    /// One path, one name: repeated calls for the same path return the
    /// same table, which is how sibling parents accumulate rows together.
    fn group_table_name(&mut self, path: &[String]) -> String {
        if let Some(name) = self.group_names.get(path) {
            return name.clone();
        }
        let name = self.unique_table_name(&path_to_table_name(path));
        self.group_names.insert(path.to_vec(), name.clone());
        name
    }

    /// Table names must not collide with the descriptor or each other;
    /// a colliding derived name gets a numeric suffix in discovery order.
    fn unique_table_name(&self, base: &str) -> String {
        if !self.name_taken(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !self.name_taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn name_taken(&self, name: &str) -> bool {
        self.map_tables.contains_key(name) || self.group_names.values().any(|taken| taken == name)
    }
}

/// First-present identifying field of `map`, appended to the inherited
/// chain. A later map with the same identifying key shadows the earlier one.
fn extend_parent_keys(
    inherited: &IndexMap<String, Scalar>,
    map: &IndexMap<String, Value>,
) -> IndexMap<String, Scalar> {
    let mut keys = inherited.clone();
    for candidate in PARENT_KEY_PRIORITY {
        if let Some(Value::Scalar(s)) = map.get(candidate) {
            keys.insert(candidate.to_string(), s.clone());
            break;
        }
    }
    keys
}

fn joined_scalars(scalars: &[&Scalar]) -> Cell {
    let joined = scalars
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(SCALAR_LIST_DELIMITER);
    Cell::Scalar(Scalar::String(joined))
}

/// Dedup rows by full equality (keep-first), then assign `_row_index`.
fn dedup_and_index(rows: Vec<Row>) -> Vec<Row> {
    let mut seen: HashSet<Vec<(String, Cell)>> = HashSet::with_capacity(rows.len());
    let mut kept = Vec::with_capacity(rows.len());

    for row in rows {
        let fingerprint: Vec<(String, Cell)> =
            row.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        if seen.insert(fingerprint) {
            kept.push(row);
        }
    }

    for (index, row) in kept.iter_mut().enumerate() {
        row.insert(
            ROW_INDEX_COLUMN.to_string(),
            Cell::Scalar(Scalar::Int(index as i64)),
        );
    }
    kept
}

/// Deterministic table name from a document path: segments joined with
/// underscores, uppercased.
fn path_to_table_name(path: &[String]) -> String {
    path.join("_").to_uppercase()
}
