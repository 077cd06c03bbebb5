//! Survivor selection
//!
//! A survivor is an entity that publishes in every period in which its
//! cohort is active at all. Restricting the analysis to survivors removes
//! composition effects from cohort curves.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::CohortAssignment;
use crate::record::PublicationRecord;
use crate::{Error, Result};

/// Entities present in every active period of their cohort.
///
/// # Errors
///
/// Returns `Error::InvalidCohort` if a record's entity has no assignment.
pub fn survivors(
    records: &[PublicationRecord],
    assignment: &CohortAssignment,
) -> Result<BTreeSet<String>> {
    // cohort -> period -> entities active in that period
    let mut activity: BTreeMap<i32, BTreeMap<i32, BTreeSet<&str>>> = BTreeMap::new();

    for record in records {
        let cohort = assignment
            .cohort_of(record.entity_id())
            .ok_or_else(|| Error::InvalidCohort {
                entity_id: record.entity_id().to_string(),
                period: record.period(),
                cohort_period: None,
            })?;
        activity
            .entry(cohort)
            .or_default()
            .entry(record.period())
            .or_default()
            .insert(record.entity_id());
    }

    let mut result = BTreeSet::new();
    for (cohort, periods) in &activity {
        let mut alive: Option<BTreeSet<&str>> = None;
        for active in periods.values() {
            alive = Some(match alive {
                None => active.clone(),
                Some(current) => current.intersection(active).copied().collect(),
            });
        }
        let alive = alive.unwrap_or_default();
        debug!(cohort, survivors = alive.len(), "selected cohort survivors");
        result.extend(alive.into_iter().map(str::to_string));
    }

    Ok(result)
}

/// Keep only the records of survivors.
///
/// # Errors
///
/// Returns `Error::InvalidCohort` if a record's entity has no assignment.
pub fn retain_survivors(
    records: &[PublicationRecord],
    assignment: &CohortAssignment,
) -> Result<Vec<PublicationRecord>> {
    let keep = survivors(records, assignment)?;
    Ok(records
        .iter()
        .filter(|r| keep.contains(r.entity_id()))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::assign_cohorts;

    #[test]
    fn test_survivors_per_cohort() {
        let records = vec![
            // cohort 2000: A publishes every active year, B drops out in 2002
            PublicationRecord::new("A", 2000),
            PublicationRecord::new("A", 2001),
            PublicationRecord::new("A", 2002),
            PublicationRecord::new("B", 2000),
            PublicationRecord::new("B", 2001),
            // cohort 2001: C alone, always present
            PublicationRecord::new("C", 2001),
            PublicationRecord::new("C", 2003),
        ];
        let assignment = assign_cohorts(&records);

        let alive = survivors(&records, &assignment).unwrap();
        assert!(alive.contains("A"));
        assert!(!alive.contains("B"));
        assert!(alive.contains("C"));
    }

    #[test]
    fn test_retain_survivors_filters_records() {
        let records = vec![
            PublicationRecord::new("A", 2000),
            PublicationRecord::new("A", 2001),
            PublicationRecord::new("B", 2000),
        ];
        let assignment = assign_cohorts(&records);

        let kept = retain_survivors(&records, &assignment).unwrap();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.entity_id() == "A"));
    }

    #[test]
    fn test_survivors_empty() {
        let alive = survivors(&[], &CohortAssignment::new()).unwrap();
        assert!(alive.is_empty());
    }
}
