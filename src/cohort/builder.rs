//! One-call cohort matrix construction

use tracing::debug;

use super::{assign_cohorts, build_cohort_matrix, CohortMatrix, CohortScheme, Metric};
use crate::record::PublicationRecord;
use crate::Result;

/// Converts raw publication records into a cohort matrix.
///
/// Runs [`assign_cohorts`] followed by [`build_cohort_matrix`], optionally
/// regrouping entities into multi-year cohorts first and zero-filling
/// unobserved relative periods up to the last period in the data.
#[derive(Debug, Clone, Default)]
pub struct CohortBuilder {
    metric: Metric,
    fill_gaps: bool,
    scheme: Option<CohortScheme>,
}

impl CohortBuilder {
    /// Create a builder for the given metric.
    #[must_use]
    pub const fn new(metric: Metric) -> Self {
        Self {
            metric,
            fill_gaps: false,
            scheme: None,
        }
    }

    /// Zero-fill relative periods without records.
    #[must_use]
    pub fn fill_gaps(mut self, fill_gaps: bool) -> Self {
        self.fill_gaps = fill_gaps;
        self
    }

    /// Group entities into the cohorts of `scheme` instead of single periods.
    ///
    /// Matrix rows are then keyed by the first year of each scheme cohort.
    #[must_use]
    pub fn scheme(mut self, scheme: CohortScheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Metric used for the matrix.
    #[must_use]
    pub const fn metric(&self) -> Metric {
        self.metric
    }

    /// Multi-year scheme, if any.
    #[must_use]
    pub const fn cohort_scheme(&self) -> Option<&CohortScheme> {
        self.scheme.as_ref()
    }

    /// Build the matrix.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`build_cohort_matrix`]; with an assignment
    /// derived from the same records none are expected. With a scheme,
    /// returns `Error::InvalidCohort` for entities whose cohort period lies
    /// outside the scheme.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pubcohort::cohort::{CohortBuilder, Metric};
    /// use pubcohort::PublicationRecord;
    ///
    /// # fn main() -> pubcohort::Result<()> {
    /// let records = vec![
    ///     PublicationRecord::new("A", 2000),
    ///     PublicationRecord::new("A", 2002),
    /// ];
    /// let matrix = CohortBuilder::new(Metric::distinct_entities())
    ///     .fill_gaps(true)
    ///     .build(&records)?;
    ///
    /// assert_eq!(matrix.value(2000, 1), Some(0.0));
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(&self, records: &[PublicationRecord]) -> Result<CohortMatrix> {
        let mut assignment = assign_cohorts(records);
        if let Some(scheme) = &self.scheme {
            assignment = assignment.regroup(scheme)?;
        }
        let mut matrix = build_cohort_matrix(records, &assignment, self.metric)?;

        if self.fill_gaps {
            if let Some(last) = records.iter().map(PublicationRecord::period).max() {
                matrix.fill_gaps(last);
            }
        } else {
            debug!("gap filling disabled");
        }

        Ok(matrix)
    }
}
