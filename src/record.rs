//! Publication Record - one observed publication event for one entity

use serde::{Deserialize, Serialize};

/// A single publication event attributed to one entity (usually an author).
///
/// Multi-author publications are represented by one record per author; the
/// loader in [`crate::storage`] performs that explosion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicationRecord {
    entity_id: String,
    period: i32,
    weight: f64,
    feature: Option<String>,
    disciplines: Vec<String>,
}

impl PublicationRecord {
    /// Create a new record with unit weight, no feature and no disciplines.
    ///
    /// # Arguments
    ///
    /// * `entity_id` - Author (or other unit) being cohorted
    /// * `period` - Discrete time unit of the publication, usually a year
    #[must_use]
    pub fn new(entity_id: impl Into<String>, period: i32) -> Self {
        Self {
            entity_id: entity_id.into(),
            period,
            weight: 1.0,
            feature: None,
            disciplines: Vec::new(),
        }
    }

    /// Create a builder for constructing a record with optional fields.
    #[must_use]
    pub fn builder(entity_id: impl Into<String>, period: i32) -> PublicationRecordBuilder {
        PublicationRecordBuilder::new(entity_id, period)
    }

    /// Get the entity ID.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Get the publication period.
    #[must_use]
    pub const fn period(&self) -> i32 {
        self.period
    }

    /// Get the record weight (1.0 unless set explicitly).
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Get the categorical feature value, if any.
    #[must_use]
    pub fn feature(&self) -> Option<&str> {
        self.feature.as_deref()
    }

    /// Get the disciplines the publication is classified in.
    #[must_use]
    pub fn disciplines(&self) -> &[String] {
        &self.disciplines
    }

    /// Check whether the publication is classified in `discipline`.
    #[must_use]
    pub fn has_discipline(&self, discipline: &str) -> bool {
        self.disciplines.iter().any(|d| d == discipline)
    }
}

/// Builder for `PublicationRecord`.
#[derive(Debug)]
pub struct PublicationRecordBuilder {
    entity_id: String,
    period: i32,
    weight: f64,
    feature: Option<String>,
    disciplines: Vec<String>,
}

impl PublicationRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(entity_id: impl Into<String>, period: i32) -> Self {
        Self {
            entity_id: entity_id.into(),
            period,
            weight: 1.0,
            feature: None,
            disciplines: Vec::new(),
        }
    }

    /// Set the record weight.
    #[must_use]
    pub const fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Set the categorical feature value.
    #[must_use]
    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    /// Add a discipline classification.
    #[must_use]
    pub fn discipline(mut self, discipline: impl Into<String>) -> Self {
        self.disciplines.push(discipline.into());
        self
    }

    /// Build the `PublicationRecord`.
    #[must_use]
    pub fn build(self) -> PublicationRecord {
        PublicationRecord {
            entity_id: self.entity_id,
            period: self.period,
            weight: self.weight,
            feature: self.feature,
            disciplines: self.disciplines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_new_defaults() {
        let record = PublicationRecord::new("A", 2001);
        assert_eq!(record.entity_id(), "A");
        assert_eq!(record.period(), 2001);
        assert!((record.weight() - 1.0).abs() < f64::EPSILON);
        assert!(record.feature().is_none());
        assert!(record.disciplines().is_empty());
    }

    #[test]
    fn test_record_builder() {
        let record = PublicationRecord::builder("B", 2005)
            .weight(0.5)
            .feature("journal")
            .discipline("History")
            .discipline("Law")
            .build();

        assert!((record.weight() - 0.5).abs() < f64::EPSILON);
        assert_eq!(record.feature(), Some("journal"));
        assert!(record.has_discipline("Law"));
        assert!(!record.has_discipline("Psychology"));
    }
}
