//! Integration test: Parquet dataset -> cohort tables
//!
//! Tests the complete analysis pipeline:
//! 1. Write a publication dataset to Parquet
//! 2. Load and explode multi-author rows
//! 3. Filter by discipline group, build the cohort matrix
//! 4. Export tidy Arrow tables for plotting

use arrow::array::{Array, BooleanArray, Float64Array, Int32Array, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use pubcohort::cohort::{assign_cohorts, CohortBuilder, Metric};
use pubcohort::config::AnalysisConfig;
use pubcohort::discipline::DisciplineGroup;
use pubcohort::features::{cohort_feature_means, feature_counts, means_to_record_batch};
use pubcohort::storage::{ColumnMapping, RecordTable};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Create a small publication dataset in Parquet format
fn create_test_parquet<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let schema = Schema::new(vec![
        Field::new("authorids", DataType::Utf8, true),
        Field::new("pubyear", DataType::Int32, false),
        Field::new("pubtype", DataType::Utf8, false),
        Field::new("History", DataType::Boolean, false),
        Field::new("Sociology", DataType::Boolean, false),
    ]);

    let batch = RecordBatch::try_new(
        Arc::new(schema.clone()),
        vec![
            Arc::new(StringArray::from(vec![
                Some("a1;a2"),
                Some("a1"),
                Some("a2;a3"),
                None,
                Some("a3"),
                Some("a4"),
            ])),
            Arc::new(Int32Array::from(vec![2000, 2001, 2001, 2001, 2002, 2002])),
            Arc::new(StringArray::from(vec![
                "article", "book", "article", "article", "chapter", "article",
            ])),
            Arc::new(BooleanArray::from(vec![true, true, false, false, false, true])),
            Arc::new(BooleanArray::from(vec![false, false, true, true, true, false])),
        ],
    )?;

    let file = File::create(path.as_ref())?;
    let props = WriterProperties::builder()
        .set_max_row_group_size(4) // 2 row groups
        .build();
    let mut writer = ArrowWriter::try_new(file, Arc::new(schema), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

fn mapping() -> ColumnMapping {
    ColumnMapping {
        feature: Some("pubtype".to_string()),
        ..ColumnMapping::default()
    }
}

#[test]
fn test_load_parquet_explodes_authors() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("publications.parquet");
    create_test_parquet(&path).expect("Failed to create test Parquet file");

    let table = RecordTable::load_parquet(&path, &mapping()).expect("Failed to load Parquet file");

    // 2 + 1 + 2 + 0 + 1 + 1 author-publication pairs
    assert_eq!(table.len(), 7);
    let assignment = assign_cohorts(table.records());
    assert_eq!(assignment.cohort_of("a1"), Some(2000));
    assert_eq!(assignment.cohort_of("a2"), Some(2000));
    assert_eq!(assignment.cohort_of("a3"), Some(2001));
    assert_eq!(assignment.cohort_of("a4"), Some(2002));
}

#[test]
fn test_full_pipeline_to_record_batch() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("publications.parquet");
    create_test_parquet(&path).expect("Failed to create test Parquet file");

    let config = AnalysisConfig::from_json_str(
        r#"{ "metric": { "kind": "distinct_entities", "normalized": true }, "fill_gaps": true }"#,
    )
    .expect("Failed to parse config");
    let records = RecordTable::load_parquet(&path, &config.columns)
        .expect("Failed to load Parquet file")
        .into_records();

    let matrix = config.run(&records).expect("Failed to build matrix");

    // cohort 2000: a1, a2 -> 2001: a1, a2 -> 2002: nobody
    assert_eq!(matrix.value(2000, 0), Some(1.0));
    assert_eq!(matrix.value(2000, 1), Some(1.0));
    assert_eq!(matrix.value(2000, 2), Some(0.0));
    // cohort 2001: a3 -> 2002: a3
    assert_eq!(matrix.value(2001, 1), Some(1.0));

    let batch = matrix.to_record_batch().expect("Failed to export matrix");
    assert_eq!(batch.num_rows(), matrix.len());
    let relative = batch
        .column(1)
        .as_any()
        .downcast_ref::<UInt32Array>()
        .expect("relative_period should be UInt32");
    assert_eq!(relative.value(0), 0);
    let values = batch
        .column(2)
        .as_any()
        .downcast_ref::<Float64Array>()
        .expect("value should be Float64");
    assert_eq!(values.null_count(), 0);
}

#[test]
fn test_discipline_rows_and_feature_means() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("publications.parquet");
    create_test_parquet(&path).expect("Failed to create test Parquet file");

    let records = RecordTable::load_parquet(&path, &mapping())
        .expect("Failed to load Parquet file")
        .into_records();

    let humanities = DisciplineGroup::Humanities.filter(&records);
    let social = DisciplineGroup::SocialSciences.filter(&records);
    assert_eq!(humanities.len(), 4);
    assert_eq!(social.len(), 3);

    let matrix = CohortBuilder::new(Metric::publications())
        .build(&humanities)
        .expect("Failed to build matrix");
    assert_eq!(matrix.value(2000, 0), Some(2.0));
    assert_eq!(matrix.value(2000, 1), Some(1.0));

    let means = cohort_feature_means(&feature_counts(&records, Default::default()));
    let batch = means_to_record_batch(&means).expect("Failed to export means");
    assert_eq!(batch.num_rows(), means.len());
    assert!(means.iter().all(|m| (0.0..=1.0).contains(&m.mean)));
}
