//! Discipline groups of the social sciences and humanities (SSH)

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::PublicationRecord;

/// Social science disciplines.
pub const SOCIAL_SCIENCES: [&str; 8] = [
    "Psychology",
    "Educational sciences",
    "Criminology",
    "Economics & business",
    "Political sciences",
    "Sociology",
    "Social sciences general",
    "Social health sciences",
];

/// Humanities disciplines.
pub const HUMANITIES: [&str; 10] = [
    "Communication studies",
    "Law",
    "Philosophy",
    "Theology",
    "Linguistics",
    "Literature",
    "History of arts",
    "Archaeology",
    "History",
    "Humanities general",
];

/// Subset of the SSH publications to analyse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisciplineGroup {
    /// Every publication, regardless of classification
    #[default]
    All,
    /// Publications in at least one social science discipline
    SocialSciences,
    /// Publications in at least one humanities discipline
    Humanities,
}

impl DisciplineGroup {
    /// Row label used in multi-row charts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "SSH",
            Self::SocialSciences => "Soc. sciences",
            Self::Humanities => "Humanities",
        }
    }

    /// Disciplines that make up the group; empty for [`DisciplineGroup::All`].
    #[must_use]
    pub const fn disciplines(self) -> &'static [&'static str] {
        match self {
            Self::All => &[],
            Self::SocialSciences => &SOCIAL_SCIENCES,
            Self::Humanities => &HUMANITIES,
        }
    }

    /// Check whether a record belongs to the group.
    #[must_use]
    pub fn matches(self, record: &PublicationRecord) -> bool {
        match self {
            Self::All => true,
            group => group.disciplines().iter().any(|d| record.has_discipline(d)),
        }
    }

    /// Keep only the records that belong to the group.
    #[must_use]
    pub fn filter(self, records: &[PublicationRecord]) -> Vec<PublicationRecord> {
        let kept: Vec<PublicationRecord> = records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        debug!(
            group = self.label(),
            kept = kept.len(),
            total = records.len(),
            "filtered records by discipline"
        );
        kept
    }
}

/// All SSH discipline names, social sciences first.
pub fn all_disciplines() -> impl Iterator<Item = &'static str> {
    SOCIAL_SCIENCES.iter().chain(HUMANITIES.iter()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PublicationRecord> {
        vec![
            PublicationRecord::builder("A", 2000).discipline("Law").build(),
            PublicationRecord::builder("B", 2000).discipline("Sociology").build(),
            PublicationRecord::builder("C", 2000)
                .discipline("History")
                .discipline("Psychology")
                .build(),
            PublicationRecord::new("D", 2000),
        ]
    }

    #[test]
    fn test_filter_humanities() {
        let kept = DisciplineGroup::Humanities.filter(&sample());
        let ids: Vec<&str> = kept.iter().map(PublicationRecord::entity_id).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn test_filter_social_sciences() {
        let kept = DisciplineGroup::SocialSciences.filter(&sample());
        let ids: Vec<&str> = kept.iter().map(PublicationRecord::entity_id).collect();
        assert_eq!(ids, vec!["B", "C"]);
    }

    #[test]
    fn test_all_keeps_unclassified() {
        assert_eq!(DisciplineGroup::All.filter(&sample()).len(), 4);
    }

    #[test]
    fn test_labels_and_lists() {
        assert_eq!(DisciplineGroup::All.label(), "SSH");
        assert_eq!(all_disciplines().count(), 18);
    }
}
