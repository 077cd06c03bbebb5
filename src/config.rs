//! Analysis configuration
//!
//! One JSON document describes a complete cohort analysis run: where the
//! columns are, which metric to compute, and how to slice the data.
//! [`AnalysisConfig::run`] applies all of it to a set of records.
//!
//! ```json
//! {
//!   "columns": { "entity_ids": "authorids", "period": "pubyear", "feature": "pubtype" },
//!   "metric": { "kind": "distinct_entities", "normalized": true },
//!   "fill_gaps": true,
//!   "scheme": { "first": 2000, "last": 2015, "length": 4 },
//!   "discipline_group": "humanities",
//!   "survivors_only": false
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cohort::{
    assign_cohorts, retain_survivors, CohortAssignment, CohortBuilder, CohortMatrix,
    CohortScheme, Metric,
};
use crate::discipline::DisciplineGroup;
use crate::features::{
    cohort_feature_means, feature_counts, regroup_feature_counts, CountKind, FeatureMean,
};
use crate::record::PublicationRecord;
use crate::storage::ColumnMapping;
use crate::{Error, Result};

/// Multi-year cohort scheme parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemeConfig {
    /// First year
    pub first: i32,
    /// Last year (inclusive)
    pub last: i32,
    /// Years per cohort
    pub length: u32,
    /// Range-style names ("2000-05") instead of indices
    #[serde(default = "default_fancy_names")]
    pub fancy_names: bool,
}

const fn default_fancy_names() -> bool {
    true
}

impl SchemeConfig {
    /// Build the scheme.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an invalid cohort length.
    pub fn build(&self) -> Result<CohortScheme> {
        CohortScheme::with_names(self.first, self.last, self.length, self.fancy_names)
    }
}

/// Complete configuration of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Source column names
    pub columns: ColumnMapping,
    /// Cohort matrix metric
    pub metric: Metric,
    /// Zero-fill unobserved relative periods
    pub fill_gaps: bool,
    /// Optional multi-year cohort scheme; entities are grouped into its
    /// cohorts instead of single periods
    pub scheme: Option<SchemeConfig>,
    /// Discipline subset to analyse
    pub discipline_group: DisciplineGroup,
    /// Restrict to entities active in every period of their cohort
    pub survivors_only: bool,
    /// Count kind for feature breakdowns
    pub count_kind: CountKind,
}

impl AnalysisConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` for malformed JSON or unknown fields, and
    /// `Error::Config` if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, otherwise as
    /// [`AnalysisConfig::from_json_str`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading analysis config");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.columns.entity_ids.trim().is_empty() || self.columns.period.trim().is_empty() {
            return Err(Error::Config(
                "columns.entity_ids and columns.period must name source columns".to_string(),
            ));
        }
        if self.columns.entity_separator.is_empty() {
            return Err(Error::Config(
                "columns.entity_separator must not be empty".to_string(),
            ));
        }
        if let Some(scheme) = &self.scheme {
            scheme
                .build()
                .map_err(|e| Error::Config(format!("invalid scheme: {e}")))?;
        }
        Ok(())
    }

    /// Multi-year scheme of this run, if configured.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an invalid cohort length.
    pub fn cohort_scheme(&self) -> Result<Option<CohortScheme>> {
        self.scheme.as_ref().map(SchemeConfig::build).transpose()
    }

    /// Cohort builder configured with this run's metric, gap filling and
    /// cohort scheme.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an invalid cohort scheme.
    pub fn builder(&self) -> Result<CohortBuilder> {
        let builder = CohortBuilder::new(self.metric).fill_gaps(self.fill_gaps);
        Ok(match self.cohort_scheme()? {
            Some(scheme) => builder.scheme(scheme),
            None => builder,
        })
    }

    /// Cohort assignment of `records`, regrouped under the scheme if one is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCohort` for entities outside the scheme.
    pub fn assign(&self, records: &[PublicationRecord]) -> Result<CohortAssignment> {
        let assignment = assign_cohorts(records);
        match self.cohort_scheme()? {
            Some(scheme) => assignment.regroup(&scheme),
            None => Ok(assignment),
        }
    }

    /// Records this run analyses: the configured discipline group, reduced
    /// to survivors when `survivors_only` is set.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCohort` for entities outside the scheme.
    pub fn select(&self, records: &[PublicationRecord]) -> Result<Vec<PublicationRecord>> {
        let subset = self.discipline_group.filter(records);
        if !self.survivors_only {
            return Ok(subset);
        }

        let assignment = self.assign(&subset)?;
        let survivors = retain_survivors(&subset, &assignment)?;
        debug!(
            group = self.discipline_group.label(),
            kept = survivors.len(),
            "restricted run to survivors"
        );
        Ok(survivors)
    }

    /// Run the configured analysis on `records`.
    ///
    /// # Errors
    ///
    /// Propagates selection and matrix construction errors.
    pub fn run(&self, records: &[PublicationRecord]) -> Result<CohortMatrix> {
        let subset = self.select(records)?;
        self.builder()?.build(&subset)
    }

    /// Per-cohort feature means of the selected records, using this run's
    /// count kind and cohort scheme.
    ///
    /// # Errors
    ///
    /// Propagates selection errors and `Error::InvalidCohort` for cohorts
    /// outside the scheme.
    pub fn feature_means(&self, records: &[PublicationRecord]) -> Result<Vec<FeatureMean>> {
        let subset = self.select(records)?;
        let mut rows = feature_counts(&subset, self.count_kind);
        if let Some(scheme) = self.cohort_scheme()? {
            rows = regroup_feature_counts(&rows, &scheme)?;
        }
        Ok(cohort_feature_means(&rows))
    }
}
