//! Aggregation stage entry point and its on-disk views.

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::types::{Aggregation, DailyMeasurement};
use crate::config::Config;
use crate::error::Result;
use crate::output::{read_store, write_table};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub const ROLLING_FILE: &str = "rolling.csv";
pub const ACCELERATION_FILE: &str = "acceleration.csv";
pub const WEEKLY_FILE: &str = "weekly_acceleration.csv";

/// Aggregation stage: loads the canonical store and derives rolling,
/// pivot, acceleration and weekly views from it.
///
/// Returns the loaded measurements alongside the aggregation so the report
/// stage does not have to read the store twice.
#[tracing::instrument(skip(config), fields(store = %store.display()))]
pub fn analyze(store: &Path, config: &Config) -> Result<(Vec<DailyMeasurement>, Aggregation)> {
    let measurements = read_store(store)?;
    let aggregation = aggregate(&measurements, &config.baseline, config.rolling)?;

    info!(
        days = measurements.len(),
        scenarios = aggregation.series.len(),
        acceleration_days = aggregation.acceleration.rows.len(),
        weeks = aggregation.weekly.len(),
        "Aggregation complete"
    );

    Ok((measurements, aggregation))
}

/// Writes the aggregated views as `;`-separated tables into `out_dir`.
pub fn write_views(out_dir: &Path, aggregation: &Aggregation) -> Result<()> {
    write_table(
        &out_dir.join(ROLLING_FILE),
        &["date", "scenario", "mean", "std", "min", "max"],
        &rolling_rows(aggregation),
    )?;
    write_table(
        &out_dir.join(ACCELERATION_FILE),
        &["date", "scenario", "ratio"],
        &aggregation.acceleration.samples(),
    )?;
    write_table(
        &out_dir.join(WEEKLY_FILE),
        &["week_ending", "scenario", "mean_ratio"],
        &weekly_rows(aggregation),
    )?;

    info!(out_dir = %out_dir.display(), "Aggregated views written");
    Ok(())
}

/// Undefined values are written as empty cells.
#[derive(Serialize)]
struct RollingRow<'a> {
    date: NaiveDate,
    scenario: &'a str,
    mean: Option<f64>,
    std: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
}

fn rolling_rows(aggregation: &Aggregation) -> Vec<RollingRow<'_>> {
    aggregation
        .rolling
        .iter()
        .map(|p| RollingRow {
            date: p.date,
            scenario: &p.scenario,
            mean: p.mean,
            std: p.std,
            min: p.min,
            max: p.max,
        })
        .collect()
}

#[derive(Serialize)]
struct WeeklyRow<'a> {
    week_ending: NaiveDate,
    scenario: &'a str,
    mean_ratio: Option<f64>,
}

fn weekly_rows(aggregation: &Aggregation) -> Vec<WeeklyRow<'_>> {
    aggregation
        .weekly
        .iter()
        .map(|w| WeeklyRow {
            week_ending: w.week_ending,
            scenario: &w.scenario,
            mean_ratio: w.mean_ratio,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::output::write_store;
    use std::fs;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    fn config() -> Config {
        Config {
            baseline: "base".into(),
            ..Config::default()
        }
    }

    #[test]
    fn test_analyze_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let err = analyze(&dir.path().join("store.csv"), &config()).unwrap_err();
        assert!(matches!(err, PipelineError::InputMissing(_)));
    }

    #[test]
    fn test_analyze_and_write_views() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("store.csv");
        write_store(
            &store,
            &[
                DailyMeasurement::new(d(6), "base", 100.0),
                DailyMeasurement::new(d(6), "alt", 50.0),
                DailyMeasurement::new(d(7), "base", 90.0),
                DailyMeasurement::new(d(7), "alt", 0.0),
            ],
        )
        .unwrap();

        let (rows, aggregation) = analyze(&store, &config()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(aggregation.acceleration.samples().len(), 1);
        assert_eq!(aggregation.weekly.len(), 1);
        assert_eq!(aggregation.weekly[0].mean_ratio, Some(2.0));

        let out = dir.path().join("out");
        write_views(&out, &aggregation).unwrap();

        let acc = fs::read_to_string(out.join(ACCELERATION_FILE)).unwrap();
        assert_eq!(acc, "date;scenario;ratio\n2025-10-06;alt;2.0\n");

        let weekly = fs::read_to_string(out.join(WEEKLY_FILE)).unwrap();
        assert_eq!(weekly, "week_ending;scenario;mean_ratio\n2025-10-12;alt;2.0\n");

        let rolling = fs::read_to_string(out.join(ROLLING_FILE)).unwrap();
        assert!(rolling.starts_with("date;scenario;mean;std;min;max\n"));
        assert_eq!(rolling.lines().count(), 5);
        assert!(rolling.contains("2025-10-06;base;;;;\n"));
    }

    #[test]
    fn test_empty_views_keep_headers() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("store.csv");
        write_store(
            &store,
            &[
                DailyMeasurement::new(d(6), "base", 100.0),
                DailyMeasurement::new(d(7), "alt", 50.0),
            ],
        )
        .unwrap();

        let (_, aggregation) = analyze(&store, &config()).unwrap();
        assert!(aggregation.acceleration.rows.is_empty());
        assert!(aggregation.weekly.is_empty());

        write_views(dir.path(), &aggregation).unwrap();
        let acc = fs::read_to_string(dir.path().join(ACCELERATION_FILE)).unwrap();
        assert_eq!(acc, "date;scenario;ratio\n");
    }

    #[test]
    fn test_analyze_without_baseline_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("store.csv");
        write_store(&store, &[DailyMeasurement::new(d(6), "alt", 50.0)]).unwrap();
        let err = analyze(&store, &config()).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
