//! Per-scenario summary statistics.

use serde::Serialize;

use crate::analyzers::grade::{Verdict, grade};
use crate::analyzers::types::TimeSeries;
use crate::analyzers::utility::{mean, quantile_sorted, sample_stddev, sorted};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub scenario: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; undefined for a single day.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
    pub total: f64,
    /// `(baseline mean - mean) / baseline mean * 100`, non-baseline only.
    pub improvement_pct: Option<f64>,
    /// `(baseline mean - mean) * count`, non-baseline only.
    pub time_saved: Option<f64>,
    pub verdict: Option<Verdict>,
}

impl SummaryStatistics {
    /// Describes one series. Returns `None` for an empty series.
    pub fn from_series(series: &TimeSeries) -> Option<Self> {
        let values = series.values();
        let ordered = sorted(&values);

        Some(SummaryStatistics {
            scenario: series.scenario.clone(),
            count: values.len(),
            mean: mean(&values)?,
            median: quantile_sorted(&ordered, 0.5)?,
            std: sample_stddev(&values),
            min: *ordered.first()?,
            max: *ordered.last()?,
            q25: quantile_sorted(&ordered, 0.25)?,
            q75: quantile_sorted(&ordered, 0.75)?,
            total: values.iter().sum(),
            improvement_pct: None,
            time_saved: None,
            verdict: None,
        })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_compared(&self) -> bool {
        self.improvement_pct.is_some()
    }

    /// A zero baseline mean leaves the scenario uncompared.
    fn compare_with(&mut self, baseline_mean: f64) {
        if baseline_mean == 0.0 {
            return;
        }
        let saved = baseline_mean - self.mean;
        let pct = saved / baseline_mean * 100.0;
        self.time_saved = Some(saved * self.count as f64);
        self.improvement_pct = Some(pct);
        self.verdict = Some(grade(pct));
    }
}

/// Summary statistics for every series, in series order.
///
/// When `baseline` names one of the series, every other scenario also gets
/// its improvement percentage, time saved and verdict.
pub fn summarize(series: &[TimeSeries], baseline: Option<&str>) -> Vec<SummaryStatistics> {
    let mut stats: Vec<SummaryStatistics> =
        series.iter().filter_map(SummaryStatistics::from_series).collect();

    let baseline_mean = baseline.and_then(|base| {
        stats
            .iter()
            .find(|s| s.scenario == base)
            .map(|s| (base.to_string(), s.mean))
    });

    if let Some((base, base_mean)) = baseline_mean {
        for s in stats.iter_mut().filter(|s| s.scenario != base) {
            s.compare_with(base_mean);
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(name: &str, values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        TimeSeries {
            scenario: name.to_string(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + chrono::Days::new(i as u64), *v))
                .collect(),
        }
    }

    #[test]
    fn test_from_series() {
        let s = SummaryStatistics::from_series(&series("a", &[4.0, 1.0, 3.0, 2.0])).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.q25, 1.75);
        assert_eq!(s.q75, 3.25);
        assert_eq!(s.total, 10.0);
        assert_eq!(s.range(), 3.0);
        assert!(s.std.is_some());
        assert!(!s.is_compared());
    }

    #[test]
    fn test_single_day_has_no_std() {
        let s = SummaryStatistics::from_series(&series("a", &[5.0])).unwrap();
        assert_eq!(s.std, None);
        assert!(SummaryStatistics::from_series(&series("a", &[])).is_none());
    }

    #[test]
    fn test_improvement_against_baseline() {
        let stats = summarize(
            &[series("base", &[100.0, 100.0]), series("fast", &[40.0, 60.0, 50.0])],
            Some("base"),
        );
        assert_eq!(stats[0].improvement_pct, None);
        assert_eq!(stats[0].time_saved, None);
        assert_eq!(stats[1].improvement_pct, Some(50.0));
        assert_eq!(stats[1].time_saved, Some(150.0));
        assert_eq!(stats[1].verdict, Some(Verdict::Major));
    }

    #[test]
    fn test_no_baseline_means_no_comparison() {
        let input = [series("a", &[1.0]), series("b", &[2.0])];
        assert!(summarize(&input, None).iter().all(|s| !s.is_compared()));
        assert!(summarize(&input, Some("missing")).iter().all(|s| !s.is_compared()));
    }

    #[test]
    fn test_zero_baseline_mean_leaves_scenario_uncompared() {
        let stats = summarize(&[series("base", &[0.0]), series("b", &[2.0])], Some("base"));
        assert_eq!(stats[1].improvement_pct, None);
        assert_eq!(stats[1].time_saved, None);
        assert_eq!(stats[1].verdict, None);
        assert!(!stats[1].is_compared());
    }
}
