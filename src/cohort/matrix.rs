//! Cohort matrix construction
//!
//! A single grouping pass over the records keyed by
//! `(cohort_period, relative_period)`. Every aggregate is order-independent:
//! distinct counts use sets, record counts are integers, and weight sums are
//! taken over the cell's weights in sorted order so the floating-point result
//! does not depend on input order.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{Float64Array, Int32Array, RecordBatch, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use super::{CohortAssignment, Metric, MetricKind};
use crate::record::PublicationRecord;
use crate::{Error, Result};

/// Value of one matrix cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    /// Computed aggregate (or ratio, when normalized)
    Value(f64),
    /// Retention ratio against a zero base-period value
    Undefined,
}

impl CellValue {
    /// Numeric value, or `None` when undefined.
    #[must_use]
    pub const fn as_f64(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Undefined => None,
        }
    }

    /// Check for the undefined marker.
    #[must_use]
    pub const fn is_undefined(self) -> bool {
        matches!(self, Self::Undefined)
    }
}

/// Table from `(cohort_period, relative_period)` to an aggregate.
///
/// Relative periods are unsigned: a cohort is only ever evaluated forward
/// from its entry period.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortMatrix {
    metric: Metric,
    cells: BTreeMap<(i32, u32), CellValue>,
}

impl CohortMatrix {
    /// Metric the matrix was built with.
    #[must_use]
    pub const fn metric(&self) -> Metric {
        self.metric
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the matrix has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Raw cell lookup.
    #[must_use]
    pub fn get(&self, cohort: i32, relative_period: u32) -> Option<CellValue> {
        self.cells.get(&(cohort, relative_period)).copied()
    }

    /// Numeric cell value; `None` for absent and undefined cells alike.
    #[must_use]
    pub fn value(&self, cohort: i32, relative_period: u32) -> Option<f64> {
        self.get(cohort, relative_period).and_then(CellValue::as_f64)
    }

    /// Checked cell lookup.
    ///
    /// Returns `Ok(None)` for an absent cell.
    ///
    /// # Errors
    ///
    /// Returns `Error::DivisionByZero` when the cell belongs to a cohort whose
    /// retention ratio is undefined.
    pub fn try_value(&self, cohort: i32, relative_period: u32) -> Result<Option<f64>> {
        match self.get(cohort, relative_period) {
            None => Ok(None),
            Some(CellValue::Value(v)) => Ok(Some(v)),
            Some(CellValue::Undefined) => Err(Error::DivisionByZero { cohort }),
        }
    }

    /// Iterate over `((cohort, relative_period), value)` in key order.
    pub fn cells(&self) -> impl Iterator<Item = ((i32, u32), CellValue)> + '_ {
        self.cells.iter().map(|(k, v)| (*k, *v))
    }

    /// Distinct cohort periods, ascending.
    #[must_use]
    pub fn cohorts(&self) -> Vec<i32> {
        let mut cohorts: Vec<i32> = self.cells.keys().map(|(c, _)| *c).collect();
        cohorts.dedup();
        cohorts
    }

    /// All cells of one cohort, ordered by relative period.
    #[must_use]
    pub fn row(&self, cohort: i32) -> Vec<(u32, CellValue)> {
        self.cells
            .range((cohort, 0)..=(cohort, u32::MAX))
            .map(|((_, rel), v)| (*rel, *v))
            .collect()
    }

    /// Cohorts whose cells are undefined (zero base under normalization).
    #[must_use]
    pub fn undefined_cohorts(&self) -> Vec<i32> {
        let mut cohorts: Vec<i32> = self
            .cells
            .iter()
            .filter(|(_, v)| v.is_undefined())
            .map(|((c, _), _)| *c)
            .collect();
        cohorts.dedup();
        cohorts
    }

    /// Insert zero cells for every relative period a cohort could have been
    /// observed in up to `last_period`, but was not.
    ///
    /// Undefined cohorts are left as they are.
    pub fn fill_gaps(&mut self, last_period: i32) {
        let undefined = self.undefined_cohorts();
        let mut inserted = 0usize;

        for cohort in self.cohorts() {
            if undefined.contains(&cohort) {
                continue;
            }
            let Ok(horizon) = u32::try_from(i64::from(last_period) - i64::from(cohort)) else {
                continue;
            };
            for rel in 0..=horizon {
                self.cells.entry((cohort, rel)).or_insert_with(|| {
                    inserted += 1;
                    CellValue::Value(0.0)
                });
            }
        }

        debug!(inserted, last_period, "filled cohort matrix gaps");
    }

    /// Export as a tidy Arrow table for plotting.
    ///
    /// Columns: `cohort` (Int32), `relative_period` (UInt32) and `value`
    /// (Float64, null where undefined).
    ///
    /// # Errors
    ///
    /// Returns error if the record batch cannot be assembled.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("cohort", DataType::Int32, false),
            Field::new("relative_period", DataType::UInt32, false),
            Field::new("value", DataType::Float64, true),
        ]));

        let cohorts = Int32Array::from_iter_values(self.cells.keys().map(|(c, _)| *c));
        let relative = UInt32Array::from_iter_values(self.cells.keys().map(|(_, r)| *r));
        let values: Float64Array = self.cells.values().map(|v| v.as_f64()).collect();

        Ok(RecordBatch::try_new(
            schema,
            vec![Arc::new(cohorts), Arc::new(relative), Arc::new(values)],
        )?)
    }
}

#[derive(Default)]
struct CellAccumulator<'a> {
    entities: FxHashSet<&'a str>,
    records: usize,
    weights: Vec<f64>,
}

impl CellAccumulator<'_> {
    fn weight_sum(&mut self) -> f64 {
        self.weights.sort_by(f64::total_cmp);
        self.weights.iter().sum()
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(mut self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::DistinctEntities => self.entities.len() as f64,
            MetricKind::Publications => self.records as f64,
            MetricKind::WeightSum => self.weight_sum(),
            MetricKind::MeanWeightPerEntity => {
                let entities = self.entities.len() as f64;
                self.weight_sum() / entities
            }
        }
    }
}

/// Relative period of a record within its entity's cohort.
fn relative_period(
    record: &PublicationRecord,
    assignment: &CohortAssignment,
) -> Result<(i32, u32)> {
    let cohort = assignment
        .cohort_of(record.entity_id())
        .ok_or_else(|| Error::InvalidCohort {
            entity_id: record.entity_id().to_string(),
            period: record.period(),
            cohort_period: None,
        })?;

    let relative = u32::try_from(i64::from(record.period()) - i64::from(cohort)).map_err(|_| {
        Error::InvalidCohort {
            entity_id: record.entity_id().to_string(),
            period: record.period(),
            cohort_period: Some(cohort),
        }
    })?;

    Ok((cohort, relative))
}

/// Build the cohort matrix for `records` under `assignment`.
///
/// # Errors
///
/// Returns `Error::InvalidCohort` if a record's entity is missing from the
/// assignment or the record predates the entity's cohort period.
///
/// A zero base-period value under normalization is not an error: that
/// cohort's cells are reported as [`CellValue::Undefined`].
///
/// # Example
///
/// ```rust
/// use pubcohort::cohort::{assign_cohorts, build_cohort_matrix, Metric};
/// use pubcohort::PublicationRecord;
///
/// # fn main() -> pubcohort::Result<()> {
/// let records = vec![
///     PublicationRecord::new("A", 2000),
///     PublicationRecord::new("A", 2001),
///     PublicationRecord::new("B", 2001),
/// ];
/// let assignment = assign_cohorts(&records);
/// let matrix = build_cohort_matrix(&records, &assignment, Metric::distinct_entities())?;
///
/// assert_eq!(matrix.value(2000, 1), Some(1.0));
/// assert_eq!(matrix.value(2001, 0), Some(1.0));
/// # Ok(())
/// # }
/// ```
pub fn build_cohort_matrix(
    records: &[PublicationRecord],
    assignment: &CohortAssignment,
    metric: Metric,
) -> Result<CohortMatrix> {
    let mut groups: FxHashMap<(i32, u32), CellAccumulator<'_>> = FxHashMap::default();

    for record in records {
        let key = relative_period(record, assignment)?;
        let cell = groups.entry(key).or_default();
        cell.entities.insert(record.entity_id());
        cell.records += 1;
        cell.weights.push(record.weight());
    }

    let raw: BTreeMap<(i32, u32), f64> = groups
        .into_iter()
        .map(|(key, cell)| (key, cell.finish(metric.kind)))
        .collect();

    let cells = if metric.normalized {
        normalize(&raw)
    } else {
        raw.into_iter().map(|(k, v)| (k, CellValue::Value(v))).collect()
    };

    let matrix = CohortMatrix { metric, cells };
    info!(
        metric = %metric,
        cells = matrix.len(),
        cohorts = matrix.cohorts().len(),
        "built cohort matrix"
    );
    Ok(matrix)
}

/// Divide every cell by its cohort's relative-period-0 value.
///
/// A zero or non-finite base leaves the whole cohort undefined.
#[allow(clippy::float_cmp)]
fn normalize(raw: &BTreeMap<(i32, u32), f64>) -> BTreeMap<(i32, u32), CellValue> {
    let mut cells = BTreeMap::new();

    for (&(cohort, rel), &value) in raw {
        let base = raw.get(&(cohort, 0)).copied().unwrap_or(0.0);
        let cell = if base == 0.0 || !base.is_finite() {
            if rel == 0 {
                warn!(cohort, "zero base-period value; retention undefined for cohort");
            }
            CellValue::Undefined
        } else {
            CellValue::Value(value / base)
        };
        cells.insert((cohort, rel), cell);
    }

    cells
}
