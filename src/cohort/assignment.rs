//! Cohort assignment: entity -> period of first observed publication

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::scheme::{CohortLabel, CohortScheme};
use crate::record::PublicationRecord;
use crate::{Error, Result};

/// Mapping from entity ID to cohort period.
///
/// Backed by a `BTreeMap` so that iteration order is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortAssignment {
    cohorts: BTreeMap<String, i32>,
}

impl CohortAssignment {
    /// Create an empty assignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entity's cohort period.
    ///
    /// Intended for externally supplied assignments; [`assign_cohorts`]
    /// is the normal way to build one.
    pub fn insert(&mut self, entity_id: impl Into<String>, cohort_period: i32) {
        self.cohorts.insert(entity_id.into(), cohort_period);
    }

    /// Get the cohort period of an entity.
    #[must_use]
    pub fn cohort_of(&self, entity_id: &str) -> Option<i32> {
        self.cohorts.get(entity_id).copied()
    }

    /// Number of assigned entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cohorts.len()
    }

    /// Check if no entity is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }

    /// Iterate over `(entity_id, cohort_period)` in entity order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.cohorts.iter().map(|(id, c)| (id.as_str(), *c))
    }

    /// Distinct cohort periods, ascending.
    #[must_use]
    pub fn cohort_periods(&self) -> Vec<i32> {
        let mut periods: Vec<i32> = self.cohorts.values().copied().collect();
        periods.sort_unstable();
        periods.dedup();
        periods
    }

    /// Number of entities per cohort period.
    #[must_use]
    pub fn cohort_sizes(&self) -> BTreeMap<i32, usize> {
        let mut sizes = BTreeMap::new();
        for cohort in self.cohorts.values() {
            *sizes.entry(*cohort).or_insert(0) += 1;
        }
        sizes
    }

    /// Map every entity to the multi-year cohort containing its cohort period.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCohort` if an entity's cohort period lies
    /// outside the scheme's year range.
    pub fn bucket(&self, scheme: &CohortScheme) -> Result<BTreeMap<String, CohortLabel>> {
        self.cohorts
            .iter()
            .map(|(id, &cohort)| {
                scheme
                    .label_for(cohort)
                    .map(|label| (id.clone(), label))
                    .ok_or_else(|| Error::InvalidCohort {
                        entity_id: id.clone(),
                        period: cohort,
                        cohort_period: None,
                    })
            })
            .collect()
    }

    /// Coarsen the assignment to a multi-year scheme.
    ///
    /// Every entity is moved to the first year of the scheme cohort holding
    /// its cohort period, so matrices, survivors and feature means built on
    /// the result are grouped per scheme cohort. Relative periods then count
    /// from the start of that cohort.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCohort` if an entity's cohort period lies
    /// outside the scheme's year range.
    pub fn regroup(&self, scheme: &CohortScheme) -> Result<Self> {
        let regrouped: Self = self
            .bucket(scheme)?
            .into_iter()
            .map(|(id, label)| (id, label.first()))
            .collect();

        debug!(
            entities = regrouped.len(),
            cohorts = scheme.labels().len(),
            "regrouped cohorts under scheme"
        );
        Ok(regrouped)
    }
}

impl FromIterator<(String, i32)> for CohortAssignment {
    fn from_iter<T: IntoIterator<Item = (String, i32)>>(iter: T) -> Self {
        Self {
            cohorts: iter.into_iter().collect(),
        }
    }
}

/// Assign every entity to the period of its first observed record.
///
/// Entities without records do not appear in the result.
///
/// # Example
///
/// ```rust
/// use pubcohort::cohort::assign_cohorts;
/// use pubcohort::PublicationRecord;
///
/// let records = vec![
///     PublicationRecord::new("A", 2003),
///     PublicationRecord::new("A", 2001),
///     PublicationRecord::new("A", 2005),
/// ];
/// let assignment = assign_cohorts(&records);
/// assert_eq!(assignment.cohort_of("A"), Some(2001));
/// ```
#[must_use]
pub fn assign_cohorts(records: &[PublicationRecord]) -> CohortAssignment {
    let mut first_seen: FxHashMap<&str, i32> = FxHashMap::default();
    for record in records {
        first_seen
            .entry(record.entity_id())
            .and_modify(|p| *p = (*p).min(record.period()))
            .or_insert(record.period());
    }

    debug!(
        records = records.len(),
        entities = first_seen.len(),
        "assigned cohorts"
    );

    first_seen
        .into_iter()
        .map(|(id, period)| (id.to_string(), period))
        .collect()
}
