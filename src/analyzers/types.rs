//! Data types used by the aggregation pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Total processing minutes of one day, tagged with its scenario.
///
/// This is the row type of the canonical store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMeasurement {
    pub date: NaiveDate,
    pub scenario: String,
    pub minutes: f64,
}

impl DailyMeasurement {
    pub fn new(date: NaiveDate, scenario: &str, minutes: f64) -> Self {
        Self {
            date,
            scenario: scenario.to_string(),
            minutes,
        }
    }
}

/// Date-ordered measurements of a single scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub scenario: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl TimeSeries {
    /// Splits measurements into one series per scenario.
    ///
    /// Series are ordered by the first date each scenario appears on, points
    /// within a series by date.
    pub fn split(measurements: &[DailyMeasurement]) -> Vec<TimeSeries> {
        let mut by_scenario: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
        for m in measurements {
            by_scenario
                .entry(m.scenario.as_str())
                .or_default()
                .push((m.date, m.minutes));
        }

        let mut series: Vec<TimeSeries> = by_scenario
            .into_iter()
            .map(|(scenario, mut points)| {
                points.sort_by_key(|(date, _)| *date);
                TimeSeries {
                    scenario: scenario.to_string(),
                    points,
                }
            })
            .collect();
        series.sort_by_key(|s| s.first_date());
        series
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Trailing-window statistics of one scenario on one date.
///
/// Every statistic is `None` until the window holds enough observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub scenario: String,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Baseline-to-scenario duration ratio on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccelerationSample {
    pub date: NaiveDate,
    pub scenario: String,
    pub ratio: f64,
}

/// Mean acceleration of one scenario over one calendar week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyAcceleration {
    /// Sunday closing the Monday–Sunday week.
    pub week_ending: NaiveDate,
    pub scenario: String,
    pub mean_ratio: Option<f64>,
}

/// Date × scenario matrix of minutes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PivotTable {
    pub scenarios: Vec<String>,
    pub rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn column(&self, scenario: &str) -> Option<usize> {
        self.scenarios.iter().position(|s| s == scenario)
    }

    pub fn get(&self, date: NaiveDate, scenario: &str) -> Option<f64> {
        let col = self.column(scenario)?;
        self.rows.get(&date).and_then(|row| row[col])
    }
}

/// Acceleration per date for every non-baseline scenario.
///
/// Only dates with at least one defined ratio are kept.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccelerationTable {
    pub baseline: String,
    pub scenarios: Vec<String>,
    pub rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
}

impl AccelerationTable {
    /// Flattens the defined ratios into samples, ordered by date then column.
    pub fn samples(&self) -> Vec<AccelerationSample> {
        self.rows
            .iter()
            .flat_map(|(date, row)| {
                row.iter().zip(&self.scenarios).filter_map(|(ratio, scenario)| {
                    ratio.map(|ratio| AccelerationSample {
                        date: *date,
                        scenario: scenario.clone(),
                        ratio,
                    })
                })
            })
            .collect()
    }
}

/// Everything the aggregation stage derives from the canonical store.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub series: Vec<TimeSeries>,
    pub rolling: Vec<RollingPoint>,
    pub pivot: PivotTable,
    pub acceleration: AccelerationTable,
    pub weekly: Vec<WeeklyAcceleration>,
}

impl Aggregation {
    pub fn rolling_for<'a>(&'a self, scenario: &'a str) -> impl Iterator<Item = &'a RollingPoint> {
        self.rolling.iter().filter(move |p| p.scenario == scenario)
    }
}
