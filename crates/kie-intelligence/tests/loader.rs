// crates/kie-intelligence/tests/loader.rs
// ============================================================================
// Module: Data Loader Tests
// Description: Validate CSV/JSON reading, type inference, and EDA profiling.
// ============================================================================
//! ## Overview
//! Ensures extension-based format detection, deterministic type inference
//! (numeric, datetime, categorical, boolean, identifier), and the boundary
//! behaviors: an empty dataset profiles with shape `(0, n)` and a warning,
//! and single-row datasets warn about variance.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use kie_intelligence::ColumnType;
use kie_intelligence::DataFormat;
use kie_intelligence::detect_format;
use kie_intelligence::eda::ProfileThresholds;
use kie_intelligence::eda::build_profile;
use kie_intelligence::load_table;

/// Default thresholds used across the tests.
const THRESHOLDS: ProfileThresholds = ProfileThresholds {
    null_ratio_warn: 0.5,
    constant_warn: true,
    high_cardinality_ratio: 0.9,
};

/// Writes a fixture file and returns its path.
fn fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn formats_are_detected_by_extension() {
    assert_eq!(detect_format(Path::new("a.csv")), Some(DataFormat::Csv));
    assert_eq!(detect_format(Path::new("a.xlsx")), Some(DataFormat::Excel));
    assert_eq!(detect_format(Path::new("a.parquet")), Some(DataFormat::Parquet));
    assert_eq!(detect_format(Path::new("a.json")), Some(DataFormat::Json));
    assert_eq!(detect_format(Path::new("a.txt")), None);
}

#[test]
fn csv_types_are_inferred() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = fixture(
        dir.path(),
        "sales.csv",
        "order_id,order_date,region,revenue,active\n\
         1,2024-01-05,North,1234.50,true\n\
         2,2024-01-06,South,980.00,false\n\
         3,2024-01-07,North,1410.25,true\n",
    );
    let table = load_table(&path, 10_000).expect("load");
    assert_eq!(table.row_count, 3);

    let types: Vec<ColumnType> =
        table.columns.iter().map(|column| column.column_type).collect();
    assert_eq!(
        types,
        vec![
            ColumnType::Identifier,
            ColumnType::Datetime,
            ColumnType::Categorical,
            ColumnType::Numeric,
            ColumnType::Boolean,
        ]
    );
}

#[test]
fn currency_formatting_does_not_defeat_numeric_inference() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = fixture(
        dir.path(),
        "revenue.csv",
        "region,revenue\nNorth,\"$1,200\"\nSouth,\"$900\"\nWest,\"$2,400\"\n",
    );
    let table = load_table(&path, 10_000).expect("load");
    let revenue = table.column("revenue").expect("revenue column");
    assert_eq!(revenue.column_type, ColumnType::Numeric);
    assert_eq!(revenue.numeric_values(), vec![1200.0, 900.0, 2400.0]);
}

#[test]
fn json_arrays_of_objects_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = fixture(
        dir.path(),
        "rows.json",
        r#"[{"region":"North","revenue":120},{"region":"South","revenue":95}]"#,
    );
    let table = load_table(&path, 10_000).expect("load");
    assert_eq!(table.row_count, 2);
    assert_eq!(table.column_names(), vec!["region".to_string(), "revenue".to_string()]);
}

#[test]
fn empty_dataset_profiles_with_warning() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = fixture(dir.path(), "empty.csv", "region,revenue\n");
    let table = load_table(&path, 10_000).expect("load");
    let profile = build_profile("data/empty.csv", &table, THRESHOLDS);
    assert_eq!(profile.shape, [0, 2]);
    assert!(profile.warnings.iter().any(|warning| warning.contains("no rows")));
}

#[test]
fn single_row_dataset_warns_about_variance() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = fixture(dir.path(), "one.csv", "region,revenue\nNorth,120\n");
    let table = load_table(&path, 10_000).expect("load");
    let profile = build_profile("data/one.csv", &table, THRESHOLDS);
    assert_eq!(profile.shape, [1, 2]);
    assert!(profile.warnings.iter().any(|warning| warning.contains("single-row")));
}

#[test]
fn null_heavy_and_constant_columns_warn() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = fixture(
        dir.path(),
        "quality.csv",
        "region,mostly_null,always_one\nNorth,,1\nSouth,,1\nWest,5,1\nEast,,1\n",
    );
    let table = load_table(&path, 10_000).expect("load");
    let profile = build_profile("data/quality.csv", &table, THRESHOLDS);
    assert!(profile.warnings.iter().any(|warning| warning.contains("mostly_null")));
    assert!(profile.warnings.iter().any(|warning| warning.contains("always_one")));
}

#[test]
fn row_cap_is_honored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut contents = String::from("value\n");
    for index in 0..50 {
        contents.push_str(&format!("{index}\n"));
    }
    let path = fixture(dir.path(), "capped.csv", &contents);
    let table = load_table(&path, 10).expect("load");
    assert_eq!(table.row_count, 10);
}

#[test]
fn suggested_analyses_follow_the_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = fixture(
        dir.path(),
        "schema.csv",
        "order_date,region,revenue,cost\n\
         2024-01-05,North,120,80\n\
         2024-01-06,South,95,60\n\
         2024-01-07,North,140,90\n",
    );
    let table = load_table(&path, 10_000).expect("load");
    let profile = build_profile("data/schema.csv", &table, THRESHOLDS);
    assert!(
        profile
            .suggested_analyses
            .iter()
            .any(|suggestion| suggestion.contains("trend"))
    );
    assert!(
        profile
            .suggested_analyses
            .iter()
            .any(|suggestion| suggestion.contains("correlation"))
    );
}
