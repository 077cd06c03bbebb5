//! Cohort report: Parquet dataset → retention table and feature means
//!
//! This demo runs the analysis a configuration describes:
//! 1. Load publications (or synthesize a dataset when no path is given)
//! 2. Select the configured discipline group, optionally only survivors
//! 3. Build the cohort matrix, grouped by the cohort scheme if one is set
//! 4. Print per-cohort feature means
//!
//! Run with: cargo run --example cohort_report -- [config.json] [data.parquet]
//! Set `RUST_LOG=pubcohort=debug` to trace each step.

use anyhow::Context;
use pubcohort::cohort::{CellValue, CohortMatrix, CohortScheme};
use pubcohort::config::AnalysisConfig;
use pubcohort::discipline::{HUMANITIES, SOCIAL_SCIENCES};
use pubcohort::storage::RecordTable;
use pubcohort::PublicationRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => AnalysisConfig::from_path(&path)
            .with_context(|| format!("reading config {path}"))?,
        None => AnalysisConfig::default(),
    };
    let records = match args.next() {
        Some(path) => RecordTable::load_parquet(&path, &config.columns)
            .with_context(|| format!("loading {path}"))?
            .into_records(),
        None => synthetic_records(5_000),
    };
    let scheme = config.cohort_scheme()?;

    println!("=== pubcohort: cohort report ===\n");
    println!("Records: {}", records.len());
    println!("Metric:  {}", config.metric);
    println!("Group:   {}\n", config.discipline_group.label());

    let matrix = config.run(&records).context("building cohort matrix")?;
    print_matrix(&matrix, scheme.as_ref());

    let means = config.feature_means(&records)?;
    if !means.is_empty() {
        println!("--- {} by cohort ---", config.count_kind.axis_label());
        for mean in means.iter().filter(|m| m.cohort == m.period) {
            println!(
                "  {:<14} {:<12} {:>6.3} ({} authors)",
                cohort_name(mean.cohort, scheme.as_ref()),
                mean.feature,
                mean.mean,
                mean.entities
            );
        }
    }

    Ok(())
}

fn cohort_name(cohort: i32, scheme: Option<&CohortScheme>) -> String {
    scheme
        .and_then(|s| s.legend_for(cohort))
        .unwrap_or_else(|| cohort.to_string())
}

fn print_matrix(matrix: &CohortMatrix, scheme: Option<&CohortScheme>) {
    for cohort in matrix.cohorts() {
        let cells: Vec<String> = matrix
            .row(cohort)
            .into_iter()
            .map(|(_, value)| match value {
                CellValue::Value(v) => format!("{v:>6.2}"),
                CellValue::Undefined => format!("{:>6}", "n/a"),
            })
            .collect();
        println!("  {:<14} {}", cohort_name(cohort, scheme), cells.join(" "));
    }
    println!();
}

fn synthetic_records(authors: usize) -> Vec<PublicationRecord> {
    let mut rng = StdRng::seed_from_u64(7);
    let features = ["article", "book", "chapter"];
    let mut records = Vec::new();

    for author in 0..authors {
        let start = rng.gen_range(2000..2012);
        let end = rng.gen_range(start..2016);
        let discipline = if rng.gen_bool(0.5) {
            SOCIAL_SCIENCES[rng.gen_range(0..SOCIAL_SCIENCES.len())]
        } else {
            HUMANITIES[rng.gen_range(0..HUMANITIES.len())]
        };
        for year in start..=end {
            for _ in 0..rng.gen_range(0..3) {
                records.push(
                    PublicationRecord::builder(format!("author-{author}"), year)
                        .feature(features[rng.gen_range(0..features.len())])
                        .discipline(discipline)
                        .build(),
                );
            }
        }
    }

    records
}
