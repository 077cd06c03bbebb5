//! Per-entity feature breakdowns
//!
//! Breaks each entity's yearly output down by a categorical publication
//! feature (publication type, language, peer-review status …) and averages
//! the breakdown per cohort, which is what cohort line charts display.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arrow::array::{Float64Array, Int32Array, RecordBatch, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cohort::CohortScheme;
use crate::record::PublicationRecord;
use crate::{Error, Result};

/// Absolute counts or within-period shares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountKind {
    /// Share of the entity's publications in that period (0..=1)
    #[default]
    Relative,
    /// Number of publications
    Absolute,
}

impl CountKind {
    /// Axis label for charts of this kind.
    #[must_use]
    pub const fn axis_label(self) -> &'static str {
        match self {
            Self::Relative => "Mean percentage",
            Self::Absolute => "Mean of n",
        }
    }
}

/// One row of the tidy per-entity breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCount {
    /// Entity the row describes
    pub entity_id: String,
    /// Publication period
    pub period: i32,
    /// Feature value
    pub feature: String,
    /// Count or share, depending on [`CountKind`]
    pub n: f64,
    /// Cohort period of the entity
    pub cohort: i32,
}

/// Mean of `n` over the entities of one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMean {
    /// Cohort period
    pub cohort: i32,
    /// Publication period
    pub period: i32,
    /// Feature value
    pub feature: String,
    /// Mean count or share across active entities of the cohort
    pub mean: f64,
    /// Number of entities averaged
    pub entities: u32,
}

/// Build the tidy per-entity, per-period feature table.
///
/// Every observed `(entity, period)` pair gets one row per feature value seen
/// anywhere in the input, zero-filled. Records without a feature are
/// ignored, and cohorts are taken over the remaining records. Rows are
/// ordered by entity, period and feature.
///
/// # Example
///
/// ```rust
/// use pubcohort::features::{feature_counts, CountKind};
/// use pubcohort::PublicationRecord;
///
/// let records = vec![
///     PublicationRecord::builder("A", 2000).feature("article").build(),
///     PublicationRecord::builder("A", 2000).feature("book").build(),
///     PublicationRecord::builder("A", 2000).feature("article").build(),
/// ];
/// let rows = feature_counts(&records, CountKind::Absolute);
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0].feature, "article");
/// assert_eq!(rows[0].n, 2.0);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn feature_counts(records: &[PublicationRecord], kind: CountKind) -> Vec<FeatureCount> {
    let mut features: BTreeSet<&str> = BTreeSet::new();
    let mut counts: BTreeMap<(&str, i32), BTreeMap<&str, usize>> = BTreeMap::new();
    let mut cohorts: BTreeMap<&str, i32> = BTreeMap::new();

    for record in records {
        let Some(feature) = record.feature() else {
            continue;
        };
        features.insert(feature);
        *counts
            .entry((record.entity_id(), record.period()))
            .or_default()
            .entry(feature)
            .or_insert(0) += 1;
        cohorts
            .entry(record.entity_id())
            .and_modify(|c| *c = (*c).min(record.period()))
            .or_insert(record.period());
    }

    let mut rows = Vec::with_capacity(counts.len() * features.len());
    for ((entity_id, period), per_feature) in &counts {
        let total: usize = per_feature.values().sum();
        let cohort = cohorts[entity_id];
        for feature in &features {
            let n = per_feature.get(feature).copied().unwrap_or(0) as f64;
            let n = match kind {
                CountKind::Absolute => n,
                CountKind::Relative => n / total as f64,
            };
            rows.push(FeatureCount {
                entity_id: (*entity_id).to_string(),
                period: *period,
                feature: (*feature).to_string(),
                n,
                cohort,
            });
        }
    }

    debug!(
        rows = rows.len(),
        features = features.len(),
        entities = cohorts.len(),
        "built feature counts"
    );
    rows
}

/// Move every row to the multi-year cohort of `scheme` holding its cohort.
///
/// The `cohort` field becomes the first year of that scheme cohort, so
/// [`cohort_feature_means`] then averages over whole scheme cohorts.
///
/// # Errors
///
/// Returns `Error::InvalidCohort` if a row's cohort lies outside the scheme.
pub fn regroup_feature_counts(
    rows: &[FeatureCount],
    scheme: &CohortScheme,
) -> Result<Vec<FeatureCount>> {
    rows.iter()
        .map(|row| {
            let label = scheme
                .label_for(row.cohort)
                .ok_or_else(|| Error::InvalidCohort {
                    entity_id: row.entity_id.clone(),
                    period: row.cohort,
                    cohort_period: None,
                })?;
            Ok(FeatureCount {
                cohort: label.first(),
                ..row.clone()
            })
        })
        .collect()
}

/// Average `n` per `(cohort, period, feature)`.
///
/// Sums are taken in sorted order, so the result does not depend on the
/// order of `rows`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cohort_feature_means(rows: &[FeatureCount]) -> Vec<FeatureMean> {
    let mut groups: BTreeMap<(i32, i32, &str), Vec<f64>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.cohort, row.period, row.feature.as_str()))
            .or_default()
            .push(row.n);
    }

    groups
        .into_iter()
        .map(|((cohort, period, feature), mut values)| {
            values.sort_by(f64::total_cmp);
            let sum: f64 = values.iter().sum();
            FeatureMean {
                cohort,
                period,
                feature: feature.to_string(),
                mean: sum / values.len() as f64,
                entities: u32::try_from(values.len()).unwrap_or(u32::MAX),
            }
        })
        .collect()
}

/// Export cohort feature means as a tidy Arrow table.
///
/// Columns: `cohort` (Int32), `period` (Int32), `feature` (Utf8),
/// `mean` (Float64) and `entities` (UInt32).
///
/// # Errors
///
/// Returns error if the record batch cannot be assembled.
pub fn means_to_record_batch(means: &[FeatureMean]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("cohort", DataType::Int32, false),
        Field::new("period", DataType::Int32, false),
        Field::new("feature", DataType::Utf8, false),
        Field::new("mean", DataType::Float64, false),
        Field::new("entities", DataType::UInt32, false),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int32Array::from_iter_values(means.iter().map(|m| m.cohort))),
            Arc::new(Int32Array::from_iter_values(means.iter().map(|m| m.period))),
            Arc::new(StringArray::from_iter_values(
                means.iter().map(|m| m.feature.as_str()),
            )),
            Arc::new(Float64Array::from_iter_values(means.iter().map(|m| m.mean))),
            Arc::new(UInt32Array::from_iter_values(means.iter().map(|m| m.entities))),
        ],
    )
    .map_err(Error::from)
}
