//! Multi-year cohort schemes
//!
//! Yearly cohorts are often too thin to plot. A [`CohortScheme`] groups the
//! years `first..=last` into consecutive blocks of `length` years; when the
//! range does not divide evenly, the final block is truncated.

use std::fmt;

use crate::{Error, Result};

/// Format a year range, abbreviating the end year when both share a century.
///
/// ```rust
/// use pubcohort::cohort::format_year_range;
///
/// assert_eq!(format_year_range(2000, 2005), "2000-05");
/// assert_eq!(format_year_range(1998, 2002), "1998-2002");
/// ```
#[must_use]
pub fn format_year_range(start: i32, end: i32) -> String {
    let start = start.to_string();
    let end = end.to_string();

    match (start.get(..2), end.get(..2), end.get(2..)) {
        (Some(a), Some(b), Some(tail)) if a == b => format!("{start}-{tail}"),
        _ => format!("{start}-{end}"),
    }
}

/// One multi-year cohort of a [`CohortScheme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CohortLabel {
    index: u32,
    first: i32,
    last: i32,
    fancy: bool,
}

impl CohortLabel {
    /// 1-based position of the cohort in its scheme.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// First year covered by the cohort.
    #[must_use]
    pub const fn first(&self) -> i32 {
        self.first
    }

    /// Last year covered by the cohort (inclusive).
    #[must_use]
    pub const fn last(&self) -> i32 {
        self.last
    }

    /// Check whether `year` falls inside the cohort.
    #[must_use]
    pub const fn contains(&self, year: i32) -> bool {
        year >= self.first && year <= self.last
    }
}

impl fmt::Display for CohortLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fancy {
            f.write_str(&format_year_range(self.first, self.last))
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// Partition of a year range into consecutive fixed-length cohorts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortScheme {
    first: i32,
    last: i32,
    labels: Vec<CohortLabel>,
}

impl CohortScheme {
    /// Create a scheme with range-style names ("2000-05").
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `length < 1` or `length` exceeds
    /// `last - first`.
    pub fn new(first: i32, last: i32, length: u32) -> Result<Self> {
        Self::with_names(first, last, length, true)
    }

    /// Create a scheme, choosing between range-style names and plain
    /// 1-based indices.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `length < 1` or `length` exceeds
    /// `last - first`.
    pub fn with_names(first: i32, last: i32, length: u32, fancy_names: bool) -> Result<Self> {
        let span = i64::from(last) - i64::from(first);
        if length < 1 || i64::from(length) > span {
            return Err(Error::InvalidInput(format!(
                "cohort length {length} must be between 1 and {span} for years {first}..={last}"
            )));
        }

        let step = i32::try_from(length - 1).unwrap_or(i32::MAX);
        let mut labels = Vec::new();
        let mut start = first;
        let mut index = 1;
        while start <= last {
            let end = start.saturating_add(step).min(last);
            labels.push(CohortLabel {
                index,
                first: start,
                last: end,
                fancy: fancy_names,
            });
            index += 1;
            if end == last {
                break;
            }
            start = end + 1;
        }

        Ok(Self { first, last, labels })
    }

    /// First year of the scheme.
    #[must_use]
    pub const fn first(&self) -> i32 {
        self.first
    }

    /// Last year of the scheme (inclusive).
    #[must_use]
    pub const fn last(&self) -> i32 {
        self.last
    }

    /// All cohorts in chronological order.
    #[must_use]
    pub fn labels(&self) -> &[CohortLabel] {
        &self.labels
    }

    /// Cohort containing `year`, or `None` outside the scheme's range.
    #[must_use]
    pub fn label_for(&self, year: i32) -> Option<CohortLabel> {
        self.labels.iter().copied().find(|label| label.contains(year))
    }

    /// Legend entries of the form `"A (2000-05)"`, in chronological order.
    ///
    /// Letters run from A to Z; later cohorts fall back to their index.
    #[must_use]
    pub fn legend(&self) -> Vec<String> {
        self.labels.iter().map(legend_entry).collect()
    }

    /// Legend entry of the cohort containing `year`.
    ///
    /// Matrices built on a regrouped assignment key each cohort by its first
    /// year, which this resolves back to `"A (2000-05)"`.
    #[must_use]
    pub fn legend_for(&self, year: i32) -> Option<String> {
        self.label_for(year).as_ref().map(legend_entry)
    }
}

fn legend_entry(label: &CohortLabel) -> String {
    let letter = u8::try_from(label.index - 1)
        .ok()
        .filter(|offset| *offset < 26)
        .map_or_else(
            || label.index.to_string(),
            |offset| char::from(b'A' + offset).to_string(),
        );
    format!("{letter} ({label})")
}
