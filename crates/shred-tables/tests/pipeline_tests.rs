//! End-to-end coverage of the shred-and-compare pipeline: two document
//! revisions are shredded independently, their tables matched, and the
//! matched pairs compared.

use shred_document::{parse_document, DocumentFormat, Scalar};
use shred_tables::{
    Cell, ComparisonMode, DataComparer, FlattenDepth, GeneratorOptions, KeyDetection,
    PrimaryKeyDetector, Shredded, StructureAnalyzer, TableGenerator,
};

fn shred(yaml: &str) -> Shredded {
    let document = parse_document(yaml, DocumentFormat::Yaml).unwrap();
    TableGenerator::new(GeneratorOptions {
        flatten_depth: FlattenDepth::Unlimited,
    })
    .generate(&document, "root")
    .unwrap()
}

const BASELINE: &str = "\
environment: staging
app:
  name: demo
  replicas: 2
users:
  - id: 1
    login: alice
    role: admin
  - id: 2
    login: bob
    role: viewer
";

const REVISED: &str = "\
environment: staging
app:
  name: demo
  replicas: 3
users:
  - id: 1
    login: alice
    role: owner
  - id: 3
    login: carol
    role: viewer
";

#[test]
fn test_revision_diff_across_whole_pipeline() {
    let first = shred(BASELINE);
    let second = shred(REVISED);

    let result = DataComparer::new().compare_datasets(&first.tables, &second.tables, None);

    assert_eq!(result.summary.tables_matched, 3);
    assert_eq!(result.summary.tables_only_in_first, 0);
    assert_eq!(result.summary.tables_only_in_second, 0);
    assert_eq!(result.summary.tables_with_differences, 2);

    let users = result
        .comparisons
        .iter()
        .find(|m| m.comparison.table_name == "USERS")
        .unwrap();
    assert_eq!(users.comparison.mode, ComparisonMode::Keyed);
    assert_eq!(
        users.comparison.primary_key,
        KeyDetection::Detected(vec!["id".to_string()])
    );
    // id 2 dropped, id 3 added, id 1 changed role.
    assert_eq!(users.comparison.rows_only_in_first, 1);
    assert_eq!(users.comparison.rows_only_in_second, 1);
    assert_eq!(users.comparison.rows_modified, 1);
    assert_eq!(users.comparison.field_differences.len(), 1);

    let diff = &users.comparison.field_differences[0];
    assert_eq!(diff.field, "role");
    assert_eq!(diff.old_value, Cell::Scalar(Scalar::from("admin")));
    assert_eq!(diff.new_value, Cell::Scalar(Scalar::from("owner")));

    let app = result
        .comparisons
        .iter()
        .find(|m| m.comparison.table_name == "APP")
        .unwrap();
    assert_eq!(app.comparison.field_differences.len(), 1);
    assert_eq!(app.comparison.field_differences[0].field, "replicas");
}

#[test]
fn test_singular_and_plural_table_names_still_match() {
    let first = shred("community:\n  - id: 1\n    name: a\n");
    let second = shred("communities:\n  - id: 1\n    name: b\n");

    let result = DataComparer::new().compare_datasets(&first.tables, &second.tables, None);
    assert_eq!(result.summary.tables_matched, 1);

    let matched = &result.comparisons[0];
    assert_eq!(matched.match_info.first, "COMMUNITY");
    assert_eq!(matched.match_info.second, "COMMUNITIES");
    assert_eq!(matched.comparison.rows_modified, 1);
}

#[test]
fn test_no_unique_column_degrades_comparison() {
    let yaml = "\
events:
  - type: a
    status: active
  - type: a
    status: inactive
  - type: b
    status: active
";
    let shredded = shred(yaml);
    let events = shredded.table("EVENTS").unwrap();

    // No single column nor identifying composite groups these rows.
    assert_eq!(
        PrimaryKeyDetector::new().detect(events),
        KeyDetection::NotDetected
    );

    let result = DataComparer::new().compare_tables(events, events, None, "EVENTS");
    assert_eq!(result.mode, ComparisonMode::SetBased);
    assert_eq!(result.rows_only_in_first, 0);
    assert_eq!(result.rows_only_in_second, 0);
}

#[test]
fn test_analyzer_candidates_align_with_generated_tables() {
    let document = parse_document(BASELINE, DocumentFormat::Yaml).unwrap();

    let report = StructureAnalyzer::new().analyze(&document);
    let candidates = report.table_candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].table_name, "USERS");
    assert_eq!(candidates[0].row_count, 2);

    let shredded = shred(BASELINE);
    let users = shredded.table("USERS").unwrap();
    assert_eq!(users.row_count(), candidates[0].row_count);
    for column in &candidates[0].required_columns {
        assert!(users.has_column(column), "missing column {column}");
    }
}
