//! Pivot, acceleration and weekly resampling over the daily store.

use crate::analyzers::rolling::{RollingWindow, rolling_all};
use crate::analyzers::types::{
    AccelerationTable, Aggregation, DailyMeasurement, PivotTable, TimeSeries, WeeklyAcceleration,
};
use crate::analyzers::utility::mean;
use crate::error::{PipelineError, Result};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// Runs every aggregation over the loaded measurements.
///
/// # Errors
///
/// Returns [`PipelineError::Configuration`] if `baseline` does not occur in the
/// data or no other scenario exists to compare it with.
pub fn aggregate(
    measurements: &[DailyMeasurement],
    baseline: &str,
    window: RollingWindow,
) -> Result<Aggregation> {
    let series = TimeSeries::split(measurements);
    let rolling = rolling_all(&series, window);
    let pivot = pivot(measurements, &series);
    let acceleration = acceleration(&pivot, baseline)?;
    let weekly = weekly_resample(&acceleration);

    debug!(
        scenarios = series.len(),
        pivot_rows = pivot.rows.len(),
        acceleration_rows = acceleration.rows.len(),
        weeks = weekly.len(),
        "Aggregation computed"
    );

    Ok(Aggregation {
        series,
        rolling,
        pivot,
        acceleration,
        weekly,
    })
}

/// Reshapes measurements into a date × scenario matrix.
///
/// Columns follow the order of `series`; duplicate (date, scenario) rows are
/// averaged.
pub fn pivot(measurements: &[DailyMeasurement], series: &[TimeSeries]) -> PivotTable {
    let scenarios: Vec<String> = series.iter().map(|s| s.scenario.clone()).collect();

    let mut cells: BTreeMap<NaiveDate, Vec<Vec<f64>>> = BTreeMap::new();
    for m in measurements {
        let Some(col) = scenarios.iter().position(|s| *s == m.scenario) else {
            continue;
        };
        cells
            .entry(m.date)
            .or_insert_with(|| vec![Vec::new(); scenarios.len()])[col]
            .push(m.minutes);
    }

    let rows = cells
        .into_iter()
        .map(|(date, row)| (date, row.iter().map(|vals| mean(vals)).collect()))
        .collect();

    PivotTable { scenarios, rows }
}

/// Baseline-to-scenario ratio for every non-baseline column of `pivot`.
///
/// A ratio is undefined when either operand is missing or the scenario value
/// is zero. Dates on which every ratio is undefined are dropped.
///
/// # Errors
///
/// Returns [`PipelineError::Configuration`] if the baseline column is absent or
/// it is the only column.
pub fn acceleration(pivot: &PivotTable, baseline: &str) -> Result<AccelerationTable> {
    let Some(base_col) = pivot.column(baseline) else {
        return Err(PipelineError::Configuration(format!(
            "baseline scenario '{}' is required in the data to compute acceleration",
            baseline
        )));
    };

    let others: Vec<usize> = (0..pivot.scenarios.len())
        .filter(|col| *col != base_col)
        .collect();
    if others.is_empty() {
        return Err(PipelineError::Configuration(format!(
            "no scenario to compare against baseline '{}'",
            baseline
        )));
    }

    let rows = pivot
        .rows
        .iter()
        .filter_map(|(date, row)| {
            let ratios: Vec<Option<f64>> = others
                .iter()
                .map(|col| ratio(row[base_col], row[*col]))
                .collect();
            ratios.iter().any(Option::is_some).then_some((*date, ratios))
        })
        .collect();

    Ok(AccelerationTable {
        baseline: baseline.to_string(),
        scenarios: others.iter().map(|col| pivot.scenarios[*col].clone()).collect(),
        rows,
    })
}

fn ratio(base: Option<f64>, scenario: Option<f64>) -> Option<f64> {
    let (base, scenario) = (base?, scenario?);
    if scenario == 0.0 {
        return None;
    }
    Some(base / scenario).filter(|r| r.is_finite())
}

/// Sunday closing the Monday–Sunday week that contains `date`.
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let offset = 6 - date.weekday().num_days_from_monday();
    date.checked_add_days(Days::new(offset as u64)).unwrap_or(date)
}

/// Mean acceleration per calendar week and scenario.
///
/// Weeks run from the first to the last week covered by `table`, without
/// gaps; a week with no defined ratio for a scenario stays undefined.
pub fn weekly_resample(table: &AccelerationTable) -> Vec<WeeklyAcceleration> {
    let (Some(first), Some(last)) = (table.rows.keys().next(), table.rows.keys().next_back())
    else {
        return Vec::new();
    };

    let mut buckets: BTreeMap<NaiveDate, Vec<Vec<f64>>> = BTreeMap::new();
    let mut week = week_ending(*first);
    let last_week = week_ending(*last);
    while week <= last_week {
        buckets.insert(week, vec![Vec::new(); table.scenarios.len()]);
        match week.checked_add_days(Days::new(7)) {
            Some(next) => week = next,
            None => break,
        }
    }

    for (date, row) in &table.rows {
        if let Some(bucket) = buckets.get_mut(&week_ending(*date)) {
            for (col, value) in row.iter().enumerate() {
                if let Some(v) = value {
                    bucket[col].push(*v);
                }
            }
        }
    }

    buckets
        .into_iter()
        .flat_map(|(week_ending, cols)| {
            cols.into_iter()
                .zip(&table.scenarios)
                .map(move |(values, scenario)| WeeklyAcceleration {
                    week_ending,
                    scenario: scenario.clone(),
                    mean_ratio: mean(&values),
                })
        })
        .collect()
}
