//! Record loading from Arrow/Parquet
//!
//! The source dataset holds one row per publication. The entity column lists
//! every author ID of the publication joined by a separator (`"a1;a2;a3"`);
//! loading explodes each row into one [`PublicationRecord`] per author.
//! Rows with an empty or null author list contribute nothing.
//!
//! Malformed input fails fast here: missing columns, unsupported column
//! types, null periods and null or non-finite weights are
//! `Error::StorageError`.

use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray, RecordBatch};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, UInt16Type, UInt32Type,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::discipline::all_disciplines;
use crate::record::PublicationRecord;
use crate::{Error, Result};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Names of the source columns the loader reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    /// Separator-joined entity IDs (Utf8), or a single integer ID
    pub entity_ids: String,
    /// Publication period: Int16/Int32/Int64/UInt16/UInt32 year, or Date32
    pub period: String,
    /// Optional numeric weight column
    pub weight: Option<String>,
    /// Optional categorical feature column (Utf8)
    pub feature: Option<String>,
    /// Boolean or numeric discipline indicator columns; missing ones are skipped
    pub disciplines: Vec<String>,
    /// Separator between entity IDs
    pub entity_separator: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            entity_ids: "authorids".to_string(),
            period: "pubyear".to_string(),
            weight: None,
            feature: None,
            disciplines: all_disciplines().map(str::to_string).collect(),
            entity_separator: ";".to_string(),
        }
    }
}

/// Publication records loaded from columnar storage.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    records: Vec<PublicationRecord>,
}

impl RecordTable {
    /// Wrap already materialized records.
    #[must_use]
    pub fn new(records: Vec<PublicationRecord>) -> Self {
        Self { records }
    }

    /// Load records from Arrow record batches.
    ///
    /// # Errors
    ///
    /// Returns `Error::StorageError` if a mapped column is missing, has an
    /// unsupported type, or holds a null period or a null or non-finite
    /// weight.
    pub fn from_batches(batches: &[RecordBatch], mapping: &ColumnMapping) -> Result<Self> {
        if mapping.entity_separator.is_empty() {
            return Err(Error::InvalidInput("entity separator must not be empty".to_string()));
        }

        let mut records = Vec::new();
        for batch in batches {
            Self::explode_batch(batch, mapping, &mut records)?;
        }

        info!(
            batches = batches.len(),
            rows = batches.iter().map(RecordBatch::num_rows).sum::<usize>(),
            records = records.len(),
            "loaded publication records"
        );
        Ok(Self { records })
    }

    /// Load records from a Parquet file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or if the column
    /// mapping does not fit its schema.
    pub fn load_parquet<P: AsRef<Path>>(path: P, mapping: &ColumnMapping) -> Result<Self> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
        use std::fs::File;

        let file = File::open(path.as_ref()).map_err(|e| {
            Error::StorageError(format!("Failed to open Parquet file: {e}"))
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            Error::StorageError(format!("Failed to parse Parquet file: {e}"))
        })?;

        let reader = builder.build().map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet reader: {e}"))
        })?;

        let mut batches = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| {
                Error::StorageError(format!("Failed to read record batch: {e}"))
            })?;
            batches.push(batch);
        }

        Self::from_batches(&batches, mapping)
    }

    /// Loaded records.
    #[must_use]
    pub fn records(&self) -> &[PublicationRecord] {
        &self.records
    }

    /// Take ownership of the loaded records.
    #[must_use]
    pub fn into_records(self) -> Vec<PublicationRecord> {
        self.records
    }

    /// Number of records (after author explosion).
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn explode_batch(
        batch: &RecordBatch,
        mapping: &ColumnMapping,
        out: &mut Vec<PublicationRecord>,
    ) -> Result<()> {
        let ids = id_column(column(batch, &mapping.entity_ids)?, &mapping.entity_ids)?;
        let periods = period_column(column(batch, &mapping.period)?, &mapping.period)?;
        let weights = match &mapping.weight {
            Some(name) => Some(weight_column(column(batch, name)?, name)?),
            None => None,
        };
        let features = match &mapping.feature {
            Some(name) => Some(utf8_column(column(batch, name)?, name)?),
            None => None,
        };

        let mut disciplines = Vec::new();
        for name in &mapping.disciplines {
            match batch.column_by_name(name) {
                Some(col) => disciplines.push((name.as_str(), flag_column(col, name)?)),
                None => debug!(column = %name, "discipline column not present; skipped"),
            }
        }

        for row in 0..batch.num_rows() {
            let Some(id_list) = &ids[row] else {
                continue;
            };
            let period = periods[row].ok_or_else(|| {
                Error::StorageError(format!(
                    "Null value in period column '{}' at row {row}",
                    mapping.period
                ))
            })?;
            let weight = match &weights {
                Some(w) => Some(finite_weight(w[row], row)?),
                None => None,
            };

            for entity_id in id_list
                .split(mapping.entity_separator.as_str())
                .map(str::trim)
                .filter(|id| !id.is_empty())
            {
                let mut builder = PublicationRecord::builder(entity_id, period);
                if let Some(w) = weight {
                    builder = builder.weight(w);
                }
                if let Some(Some(feature)) = features.as_ref().map(|f| &f[row]) {
                    builder = builder.feature(feature.clone());
                }
                for (name, flags) in &disciplines {
                    if flags[row] {
                        builder = builder.discipline(*name);
                    }
                }
                out.push(builder.build());
            }
        }

        Ok(())
    }
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::StorageError(format!("Column not found: {name}")))
}

fn unsupported(name: &str, data_type: &DataType) -> Error {
    Error::StorageError(format!("Unsupported type {data_type} for column '{name}'"))
}

fn utf8_column(col: &ArrayRef, name: &str) -> Result<Vec<Option<String>>> {
    match col.data_type() {
        DataType::Utf8 => Ok(col
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect()),
        DataType::LargeUtf8 => Ok(col
            .as_string::<i64>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect()),
        other => Err(unsupported(name, other)),
    }
}

fn id_column(col: &ArrayRef, name: &str) -> Result<Vec<Option<String>>> {
    match col.data_type() {
        DataType::Int32 => Ok(col
            .as_primitive::<Int32Type>()
            .iter()
            .map(|v| v.map(|id| id.to_string()))
            .collect()),
        DataType::Int64 => Ok(col
            .as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.map(|id| id.to_string()))
            .collect()),
        _ => utf8_column(col, name),
    }
}

fn period_column(col: &ArrayRef, name: &str) -> Result<Vec<Option<i32>>> {
    let narrow = |v: i64| {
        i32::try_from(v).map_err(|_| {
            Error::StorageError(format!("Period {v} out of range in column '{name}'"))
        })
    };

    match col.data_type() {
        DataType::Int16 => Ok(col
            .as_primitive::<Int16Type>()
            .iter()
            .map(|v| v.map(i32::from))
            .collect()),
        DataType::UInt16 => Ok(col
            .as_primitive::<UInt16Type>()
            .iter()
            .map(|v| v.map(i32::from))
            .collect()),
        DataType::Int32 => Ok(col.as_primitive::<Int32Type>().iter().collect()),
        DataType::UInt32 => col
            .as_primitive::<UInt32Type>()
            .iter()
            .map(|v| v.map(|p| narrow(i64::from(p))).transpose())
            .collect(),
        DataType::Int64 => col
            .as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.map(narrow).transpose())
            .collect(),
        DataType::Date32 => col
            .as_primitive::<arrow::datatypes::Date32Type>()
            .iter()
            .map(|v| v.map(|days| date32_year(days, name)).transpose())
            .collect(),
        other => Err(unsupported(name, other)),
    }
}

fn date32_year(days: i32, name: &str) -> Result<i32> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .map(|date| date.year())
        .ok_or_else(|| {
            Error::StorageError(format!("Date out of range in column '{name}': {days} days"))
        })
}

#[allow(clippy::cast_precision_loss)]
fn weight_column(col: &ArrayRef, name: &str) -> Result<Vec<Option<f64>>> {
    match col.data_type() {
        DataType::Float64 => Ok(col.as_primitive::<Float64Type>().iter().collect()),
        DataType::Float32 => Ok(col
            .as_primitive::<Float32Type>()
            .iter()
            .map(|v| v.map(f64::from))
            .collect()),
        DataType::Int32 => Ok(col
            .as_primitive::<Int32Type>()
            .iter()
            .map(|v| v.map(f64::from))
            .collect()),
        DataType::Int64 => Ok(col
            .as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.map(|w| w as f64))
            .collect()),
        other => Err(unsupported(name, other)),
    }
}

fn finite_weight(weight: Option<f64>, row: usize) -> Result<f64> {
    match weight {
        None => Err(Error::StorageError(format!("Null weight at row {row}"))),
        Some(w) if !w.is_finite() => Err(Error::StorageError(format!(
            "Non-finite weight {w} at row {row}"
        ))),
        Some(w) => Ok(w),
    }
}

fn flag_column(col: &ArrayRef, name: &str) -> Result<Vec<bool>> {
    let flags = match col.data_type() {
        DataType::Boolean => col.as_boolean().iter().map(|v| v.unwrap_or(false)).collect(),
        DataType::Int32 => col
            .as_primitive::<Int32Type>()
            .iter()
            .map(|v| v.is_some_and(|x| x > 0))
            .collect(),
        DataType::Int64 => col
            .as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.is_some_and(|x| x > 0))
            .collect(),
        DataType::Float64 => col
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.is_some_and(|x| x > 0.0))
            .collect(),
        other => return Err(unsupported(name, other)),
    };
    Ok(flags)
}
