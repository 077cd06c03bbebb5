//! # pubcohort: Cohort Analysis of Publication Records
//!
//! Turns publication records into cohort-structured descriptive statistics:
//! every author is assigned to the cohort of their first publication, and
//! output is aggregated per cohort and per period elapsed since entry.
//!
//! ## Design Principles
//!
//! - **Order independence**: shuffling the input never changes a result bit
//! - **Explicit undefined values**: zero-base retention ratios are marked,
//!   not silently zeroed or dropped
//! - **Fail fast at the boundary**: malformed columns are rejected at load time
//!
//! ## Example Usage
//!
//! ```rust
//! use pubcohort::cohort::{CohortBuilder, Metric};
//! use pubcohort::PublicationRecord;
//!
//! let records = vec![
//!     PublicationRecord::new("A", 2000),
//!     PublicationRecord::new("A", 2001),
//!     PublicationRecord::new("B", 2001),
//!     PublicationRecord::new("B", 2002),
//! ];
//!
//! let matrix = CohortBuilder::new(Metric::distinct_entities()).build(&records)?;
//! assert_eq!(matrix.value(2000, 0), Some(1.0));
//! assert_eq!(matrix.value(2001, 1), Some(1.0));
//!
//! // Hand off to a plotting layer as a tidy Arrow table
//! let table = matrix.to_record_batch()?;
//! assert_eq!(table.num_rows(), 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod cohort;
pub mod config;
pub mod discipline;
pub mod error;
pub mod features;
pub mod record;
pub mod storage;

pub use error::{Error, Result};
pub use record::{PublicationRecord, PublicationRecordBuilder};
