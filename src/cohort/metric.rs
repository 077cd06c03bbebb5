//! Metric selector for cohort matrix cells

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Aggregate computed for each `(cohort, relative period)` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Number of distinct entities with at least one record in the cell
    DistinctEntities,
    /// Number of records in the cell
    Publications,
    /// Sum of record weights in the cell
    WeightSum,
    /// Weight sum divided by the number of distinct entities in the cell
    #[serde(rename = "mean_weight")]
    MeanWeightPerEntity,
}

impl MetricKind {
    /// Stable snake_case name, as used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DistinctEntities => "distinct_entities",
            Self::Publications => "publications",
            Self::WeightSum => "weight_sum",
            Self::MeanWeightPerEntity => "mean_weight",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distinct_entities" => Ok(Self::DistinctEntities),
            "publications" => Ok(Self::Publications),
            "weight_sum" => Ok(Self::WeightSum),
            "mean_weight" => Ok(Self::MeanWeightPerEntity),
            other => Err(Error::InvalidInput(format!(
                "unknown metric '{other}' (expected distinct_entities, publications, weight_sum or mean_weight)"
            ))),
        }
    }
}

/// Metric selector: which aggregate to compute, and whether to express each
/// cell as a ratio to the cohort's relative-period-0 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metric {
    /// Aggregate applied to each cell
    pub kind: MetricKind,
    /// Express cells as retention ratios
    #[serde(default)]
    pub normalized: bool,
}

impl Metric {
    /// Raw (unnormalized) metric of the given kind.
    #[must_use]
    pub const fn new(kind: MetricKind) -> Self {
        Self {
            kind,
            normalized: false,
        }
    }

    /// Distinct active entities per cell.
    #[must_use]
    pub const fn distinct_entities() -> Self {
        Self::new(MetricKind::DistinctEntities)
    }

    /// Record count per cell.
    #[must_use]
    pub const fn publications() -> Self {
        Self::new(MetricKind::Publications)
    }

    /// Weight sum per cell.
    #[must_use]
    pub const fn weight_sum() -> Self {
        Self::new(MetricKind::WeightSum)
    }

    /// Mean weight per active entity.
    #[must_use]
    pub const fn mean_weight() -> Self {
        Self::new(MetricKind::MeanWeightPerEntity)
    }

    /// Same aggregate, expressed as a retention ratio.
    #[must_use]
    pub const fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }
}

impl Default for Metric {
    fn default() -> Self {
        Self::distinct_entities()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.normalized {
            write!(f, "{} (retention)", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}
