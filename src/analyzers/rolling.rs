//! Trailing-window statistics computed per scenario.

use serde::{Deserialize, Serialize};

use crate::analyzers::types::{RollingPoint, TimeSeries};
use crate::analyzers::utility::{mean, sample_stddev};

/// Trailing window size and the number of observations it needs before a
/// statistic is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingWindow {
    pub window: usize,
    /// Defaults to half the window, at least one.
    #[serde(default)]
    pub min_periods: Option<usize>,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self {
            window: 7,
            min_periods: None,
        }
    }
}

impl RollingWindow {
    pub fn new(window: usize, min_periods: usize) -> Self {
        Self {
            window,
            min_periods: Some(min_periods),
        }
    }

    /// Effective window, never below one observation.
    pub fn size(&self) -> usize {
        self.window.max(1)
    }

    /// Effective minimum, clamped into `1..=window`.
    pub fn min_periods(&self) -> usize {
        self.min_periods
            .unwrap_or(self.size() / 2)
            .clamp(1, self.size())
    }
}

/// Rolling mean, sample standard deviation, minimum and maximum over the last
/// `window` observations of `series`, one point per observation.
///
/// Windows are counted in observations, so a gap in the dates does not shrink
/// the window. Standard deviation additionally needs two observations.
pub fn rolling(series: &TimeSeries, window: RollingWindow) -> Vec<RollingPoint> {
    let size = window.size();
    let min_periods = window.min_periods();
    let values = series.values();

    series
        .points
        .iter()
        .enumerate()
        .map(|(i, (date, _))| {
            let start = (i + 1).saturating_sub(size);
            let slice = &values[start..=i];
            let enough = slice.len() >= min_periods;

            RollingPoint {
                date: *date,
                scenario: series.scenario.clone(),
                mean: mean(slice).filter(|_| enough),
                std: sample_stddev(slice).filter(|_| enough),
                min: slice.iter().copied().reduce(f64::min).filter(|_| enough),
                max: slice.iter().copied().reduce(f64::max).filter(|_| enough),
            }
        })
        .collect()
}

/// Applies [`rolling`] to every series independently.
pub fn rolling_all(series: &[TimeSeries], window: RollingWindow) -> Vec<RollingPoint> {
    series.iter().flat_map(|s| rolling(s, window)).collect()
}
