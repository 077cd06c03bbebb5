//! Error types for pubcohort
//!
//! Every error names the entity, cohort or column involved so the researcher
//! can locate the offending rows in the source dataset.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// pubcohort error types
#[derive(Error, Debug)]
pub enum Error {
    /// A record cannot be placed in its entity's cohort.
    ///
    /// Raised when the relative period would be negative, or when the entity
    /// is missing from the supplied assignment (`cohort_period` is `None`).
    #[error(
        "Invalid cohort for entity '{entity_id}' at period {period}: {}\nThe cohort assignment is inconsistent with the records; rebuild it with assign_cohorts()",
        describe_cohort(.cohort_period)
    )]
    InvalidCohort {
        /// Entity whose record failed
        entity_id: String,
        /// Period of the failing record
        period: i32,
        /// Cohort period found in the assignment, if any
        cohort_period: Option<i32>,
    },

    /// Retention ratio requested for a cohort whose base-period value is zero
    #[error("Division by zero: cohort {cohort} has a zero base-period value\nRetention ratios are undefined for this cohort")]
    DivisionByZero {
        /// Cohort period with the zero base
        cohort: i32,
    },

    /// Invalid parameter supplied by the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage error (Parquet/Arrow column mapping)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[allow(clippy::ref_option)]
fn describe_cohort(cohort_period: &Option<i32>) -> String {
    match cohort_period {
        Some(c) => format!("cohort period {c} lies after the record"),
        None => "entity has no cohort assignment".to_string(),
    }
}
