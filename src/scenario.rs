//! Date-range scenario classification.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// One entry of the configured boundary list.
///
/// `until` is the inclusive last day of the scenario; `None` marks the
/// open-ended final scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioBoundary {
    pub label: String,
    #[serde(default)]
    pub until: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ScenarioBoundary {
    pub fn bounded(label: &str, until: NaiveDate) -> Self {
        Self {
            label: label.to_string(),
            until: Some(until),
            description: None,
        }
    }

    pub fn open_ended(label: &str) -> Self {
        Self {
            label: label.to_string(),
            until: None,
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A validated partition of the date axis into named scenarios.
///
/// Every date maps to exactly one label: dates up to and including the first
/// bound get the first label, and so on, with everything after the last bound
/// going to the open-ended scenario.
#[derive(Debug, Clone)]
pub struct ScenarioBoundaries {
    bounded: Vec<(String, NaiveDate)>,
    open_ended: String,
}

impl ScenarioBoundaries {
    /// Validates an ordered boundary list.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] if the list is empty, labels
    /// repeat, bounds are not strictly increasing, or any entry other than the
    /// last is open-ended (or the last one is bounded).
    pub fn new(entries: &[ScenarioBoundary]) -> Result<Self> {
        let Some((last, rest)) = entries.split_last() else {
            return Err(PipelineError::Configuration(
                "at least one scenario boundary is required".into(),
            ));
        };

        if last.until.is_some() {
            return Err(PipelineError::Configuration(format!(
                "last scenario '{}' must be open-ended (no upper bound)",
                last.label
            )));
        }

        let mut bounded: Vec<(String, NaiveDate)> = Vec::with_capacity(rest.len());
        for entry in rest {
            let Some(until) = entry.until else {
                return Err(PipelineError::Configuration(format!(
                    "scenario '{}' needs an upper bound; only the last one may be open-ended",
                    entry.label
                )));
            };
            if let Some((prev_label, prev)) = bounded.last() {
                if until <= *prev {
                    return Err(PipelineError::Configuration(format!(
                        "bound of '{}' ({}) must come after bound of '{}' ({})",
                        entry.label, until, prev_label, prev
                    )));
                }
            }
            bounded.push((entry.label.clone(), until));
        }

        let mut labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        labels.sort_unstable();
        if let Some(dup) = labels.windows(2).find(|w| w[0] == w[1]) {
            return Err(PipelineError::Configuration(format!(
                "scenario label '{}' appears more than once",
                dup[0]
            )));
        }
        if labels.iter().any(|l| l.trim().is_empty()) {
            return Err(PipelineError::Configuration(
                "scenario labels must not be empty".into(),
            ));
        }

        Ok(Self {
            bounded,
            open_ended: last.label.clone(),
        })
    }

    /// Returns the scenario label for `date`.
    pub fn classify(&self, date: NaiveDate) -> &str {
        self.bounded
            .iter()
            .find(|(_, until)| date <= *until)
            .map(|(label, _)| label.as_str())
            .unwrap_or(&self.open_ended)
    }

    /// Labels in boundary order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.bounded
            .iter()
            .map(|(label, _)| label.as_str())
            .chain(std::iter::once(self.open_ended.as_str()))
    }

    /// Position of `label` in boundary order.
    pub fn rank(&self, label: &str) -> Option<usize> {
        self.labels().position(|l| l == label)
    }
}

/// The three scenarios the export was originally analysed with.
pub fn default_boundaries() -> Vec<ScenarioBoundary> {
    vec![
        ScenarioBoundary::bounded("Типовой", date(2025, 10, 8)).with_description(
            "Standard processing without optimisations; the baseline for comparison.",
        ),
        ScenarioBoundary::bounded("Без дублей обменов", date(2025, 10, 16)).with_description(
            "Data exchange deduplicated: repeated exchange operations are skipped.",
        ),
        ScenarioBoundary::open_ended("Без дублей обменов + Параллельные портфели")
            .with_description("Deduplicated exchanges plus parallel processing of portfolios."),
    ]
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}
