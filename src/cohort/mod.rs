//! Cohort construction and aggregation
//!
//! Entities (authors) are assigned to the cohort of their first observed
//! publication period; records are then aggregated per
//! `(cohort_period, relative_period)` where
//! `relative_period = period - cohort_period`.
//!
//! ## Pipeline
//!
//! ```text
//! [PublicationRecord] ──assign_cohorts──> CohortAssignment
//!          │                                     │
//!          └──────────build_cohort_matrix────────┘──> CohortMatrix ──> RecordBatch
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use pubcohort::cohort::{assign_cohorts, build_cohort_matrix, Metric};
//! use pubcohort::PublicationRecord;
//!
//! # fn main() -> pubcohort::Result<()> {
//! let records = vec![
//!     PublicationRecord::new("A", 2000),
//!     PublicationRecord::new("A", 2001),
//!     PublicationRecord::new("B", 2001),
//!     PublicationRecord::new("B", 2002),
//! ];
//!
//! let assignment = assign_cohorts(&records);
//! let retention = build_cohort_matrix(
//!     &records,
//!     &assignment,
//!     Metric::distinct_entities().normalized(),
//! )?;
//! assert_eq!(retention.value(2001, 1), Some(1.0));
//! # Ok(())
//! # }
//! ```

mod assignment;
mod builder;
mod matrix;
mod metric;
mod scheme;
mod survivors;

pub use assignment::{assign_cohorts, CohortAssignment};
pub use builder::CohortBuilder;
pub use matrix::{build_cohort_matrix, CellValue, CohortMatrix};
pub use metric::{Metric, MetricKind};
pub use scheme::{format_year_range, CohortLabel, CohortScheme};
pub use survivors::{retain_survivors, survivors};
