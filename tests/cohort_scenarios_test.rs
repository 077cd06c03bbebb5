//! Worked cohort scenarios
//!
//! End-to-end checks of the documented examples: cohort assignment,
//! distinct-entity matrices, retention ratios and the single-record boundary.

use pubcohort::cohort::{
    assign_cohorts, build_cohort_matrix, retain_survivors, CellValue, CohortAssignment,
    CohortBuilder, CohortScheme, Metric,
};
use pubcohort::discipline::DisciplineGroup;
use pubcohort::{Error, PublicationRecord};

fn records(rows: &[(&str, i32)]) -> Vec<PublicationRecord> {
    rows.iter().map(|(id, p)| PublicationRecord::new(*id, *p)).collect()
}

#[test]
fn test_cohort_of_entity_is_first_period() {
    let data = records(&[("A", 2003), ("A", 2001), ("A", 2005)]);
    let assignment = assign_cohorts(&data);
    assert_eq!(assignment.cohort_of("A"), Some(2001));
}

#[test]
fn test_two_entity_scenario() {
    let data = records(&[("A", 2000), ("A", 2001), ("B", 2001), ("B", 2002)]);
    let assignment = assign_cohorts(&data);
    assert_eq!(assignment.cohort_of("A"), Some(2000));
    assert_eq!(assignment.cohort_of("B"), Some(2001));

    let matrix = build_cohort_matrix(&data, &assignment, Metric::distinct_entities()).unwrap();
    let cells: Vec<((i32, u32), CellValue)> = matrix.cells().collect();
    assert_eq!(
        cells,
        vec![
            ((2000, 0), CellValue::Value(1.0)),
            ((2000, 1), CellValue::Value(1.0)),
            ((2001, 0), CellValue::Value(1.0)),
            ((2001, 1), CellValue::Value(1.0)),
        ]
    );
    assert_eq!(matrix.cohorts(), vec![2000, 2001]);
}

#[test]
fn test_single_record_boundary() {
    let data = records(&[("solo", 1999)]);
    for metric in [
        Metric::distinct_entities(),
        Metric::publications(),
        Metric::weight_sum(),
        Metric::mean_weight(),
    ] {
        let matrix = CohortBuilder::new(metric).build(&data).unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.value(1999, 0), Some(1.0));
    }
}

#[test]
fn test_retention_curve() {
    let data = records(&[
        ("A", 2000),
        ("B", 2000),
        ("C", 2000),
        ("D", 2000),
        ("A", 2001),
        ("B", 2001),
        ("A", 2002),
    ]);
    let matrix = CohortBuilder::new(Metric::distinct_entities().normalized())
        .build(&data)
        .unwrap();

    let curve: Vec<f64> = matrix
        .row(2000)
        .into_iter()
        .filter_map(|(_, v)| v.as_f64())
        .collect();
    assert_eq!(curve, vec![1.0, 0.5, 0.25]);
}

#[test]
fn test_zero_base_cohort_reported_undefined() {
    let data = vec![
        PublicationRecord::builder("A", 2000).weight(0.0).build(),
        PublicationRecord::builder("A", 2002).weight(3.0).build(),
        PublicationRecord::builder("B", 2000).weight(0.0).build(),
        PublicationRecord::builder("C", 2001).weight(2.0).build(),
        PublicationRecord::builder("C", 2002).weight(1.0).build(),
    ];
    let matrix = CohortBuilder::new(Metric::weight_sum().normalized())
        .fill_gaps(true)
        .build(&data)
        .unwrap();

    // row kept, every cell undefined, no zero filling
    assert_eq!(
        matrix.row(2000),
        vec![(0, CellValue::Undefined), (2, CellValue::Undefined)]
    );
    assert!(matches!(
        matrix.try_value(2000, 2),
        Err(Error::DivisionByZero { cohort: 2000 })
    ));

    // healthy cohort unaffected
    assert_eq!(matrix.value(2001, 0), Some(1.0));
    assert_eq!(matrix.value(2001, 1), Some(0.5));
}

#[test]
fn test_external_assignment_inconsistent_with_records() {
    let data = records(&[("A", 2000), ("A", 2004)]);
    let mut assignment = CohortAssignment::new();
    assignment.insert("A", 2002);

    let err = build_cohort_matrix(&data, &assignment, Metric::publications()).unwrap_err();
    match err {
        Error::InvalidCohort {
            entity_id,
            period,
            cohort_period,
        } => {
            assert_eq!(entity_id, "A");
            assert_eq!(period, 2000);
            assert_eq!(cohort_period, Some(2002));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_discipline_survivor_pipeline() {
    let data = vec![
        PublicationRecord::builder("A", 2000).discipline("History").build(),
        PublicationRecord::builder("A", 2001).discipline("History").build(),
        PublicationRecord::builder("B", 2000).discipline("Philosophy").build(),
        PublicationRecord::builder("C", 2000).discipline("Sociology").build(),
        PublicationRecord::builder("C", 2001).discipline("Sociology").build(),
    ];

    let humanities = DisciplineGroup::Humanities.filter(&data);
    let assignment = assign_cohorts(&humanities);
    let survivors = retain_survivors(&humanities, &assignment).unwrap();

    let matrix = CohortBuilder::new(Metric::publications()).build(&survivors).unwrap();
    assert_eq!(matrix.value(2000, 0), Some(1.0));
    assert_eq!(matrix.value(2000, 1), Some(1.0));
}

#[test]
fn test_scheme_labels_for_assignment() {
    let data = records(&[("A", 2001), ("B", 2007), ("C", 2011)]);
    let scheme = CohortScheme::new(2000, 2011, 6).unwrap();
    let buckets = assign_cohorts(&data).bucket(&scheme).unwrap();

    assert_eq!(buckets["A"].to_string(), "2000-05");
    assert_eq!(buckets["B"].to_string(), "2006-11");
    assert_eq!(buckets["C"], buckets["B"]);
    assert_eq!(scheme.legend()[1], "B (2006-11)");
}

#[test]
fn test_scheme_groups_matrix_and_survivors() {
    let data = records(&[
        ("A", 2000),
        ("A", 2001),
        ("A", 2002),
        ("A", 2003),
        ("B", 2001),
        ("B", 2002),
        ("C", 2003),
        ("C", 2004),
    ]);
    let scheme = CohortScheme::new(2000, 2005, 3).unwrap();
    let assignment = assign_cohorts(&data).regroup(&scheme).unwrap();

    // A and B form cohort 2000-02, counted from 2000
    let matrix = build_cohort_matrix(&data, &assignment, Metric::distinct_entities()).unwrap();
    let row: Vec<f64> = matrix
        .row(2000)
        .into_iter()
        .filter_map(|(_, v)| v.as_f64())
        .collect();
    assert_eq!(row, vec![1.0, 2.0, 2.0, 1.0]);
    assert_eq!(matrix.row(2003).len(), 2);

    let names: Vec<String> = matrix
        .cohorts()
        .into_iter()
        .filter_map(|c| scheme.legend_for(c))
        .collect();
    assert_eq!(names, vec!["A (2000-02)", "B (2003-05)"]);

    // B misses 2000 and 2003, both active years of its scheme cohort
    let survivors = retain_survivors(&data, &assignment).unwrap();
    assert!(survivors.iter().all(|r| r.entity_id() != "B"));
    assert_eq!(survivors.len(), 6);
}
