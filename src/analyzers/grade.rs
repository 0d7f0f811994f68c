//! Verdicts for improvement percentages.

use serde::Serialize;
use std::fmt;

/// Qualitative reading of a scenario's improvement over the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Major,
    Significant,
    Moderate,
    NoChange,
    Regression,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::Major => "major improvement",
            Verdict::Significant => "significant improvement",
            Verdict::Moderate => "moderate improvement",
            Verdict::NoChange => "no material change",
            Verdict::Regression => "regression",
        };
        f.write_str(text)
    }
}

/// Converts an improvement percentage into a [`Verdict`].
///
/// | Improvement | Verdict      |
/// |-------------|--------------|
/// | >= 50 %     | Major        |
/// | >= 20 %     | Significant  |
/// | >= 5 %      | Moderate     |
/// | > -5 %      | NoChange     |
/// | <= -5 %     | Regression   |
pub fn grade(improvement_pct: f64) -> Verdict {
    match improvement_pct {
        p if p >= 50.0 => Verdict::Major,
        p if p >= 20.0 => Verdict::Significant,
        p if p >= 5.0 => Verdict::Moderate,
        p if p > -5.0 => Verdict::NoChange,
        _ => Verdict::Regression,
    }
}
