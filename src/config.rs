//! Pipeline configuration.
//!
//! Stored as a JSON object on disk; every field is optional and falls back
//! to the setup the export was first analysed with:
//! ```json
//! {
//!   "scenarios": [
//!     { "label": "Типовой", "until": "2025-10-08" },
//!     { "label": "Без дублей обменов", "until": "2025-10-16" },
//!     { "label": "Без дублей обменов + Параллельные портфели" }
//!   ],
//!   "baseline": "Типовой",
//!   "rolling": { "window": 7, "min_periods": 3 },
//!   "paths": { "source": "input/export.htm", "output_dir": "report" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::analyzers::rolling::RollingWindow;
use crate::error::{PipelineError, Result};
use crate::scenario::{ScenarioBoundaries, ScenarioBoundary, default_boundaries};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ordered scenario boundaries; the last entry is open-ended.
    pub scenarios: Vec<ScenarioBoundary>,
    /// Scenario every other one is compared against.
    pub baseline: String,
    pub rolling: RollingWindow,
    pub paths: PathsConfig,
    pub extract: ExtractConfig,
    pub style: StyleConfig,
}

impl Default for Config {
    fn default() -> Self {
        let scenarios = default_boundaries();
        let baseline = scenarios
            .first()
            .map(|s| s.label.clone())
            .unwrap_or_default();
        Self {
            scenarios,
            baseline,
            rolling: RollingWindow::default(),
            paths: PathsConfig::default(),
            extract: ExtractConfig::default(),
            style: StyleConfig::default(),
        }
    }
}

impl Config {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::InputMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        debug!(path = %path.display(), scenarios = config.scenarios.len(), "Config loaded");
        Ok(config)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Validated scenario partition.
    pub fn boundaries(&self) -> Result<ScenarioBoundaries> {
        ScenarioBoundaries::new(&self.scenarios)
    }

    /// Configured description of `scenario`, if any.
    pub fn description(&self, scenario: &str) -> Option<&str> {
        self.scenarios
            .iter()
            .find(|s| s.label == scenario)
            .and_then(|s| s.description.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Raw export: a local path or an `http(s)` URL.
    pub source: String,
    pub store: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: "input/export.htm".to_string(),
            store: PathBuf::from("data/du_tasks_times.csv"),
            output_dir: PathBuf::from("report"),
        }
    }
}

/// Where the task fields live in the export table, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskColumns {
    pub start: usize,
    pub end: usize,
    pub has_errors: usize,
    pub reference: usize,
    pub duration: usize,
}

impl Default for TaskColumns {
    fn default() -> Self {
        Self {
            start: 0,
            end: 1,
            has_errors: 2,
            reference: 3,
            duration: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Rows whose duration cell contains one of these are header artifacts.
    pub header_markers: Vec<String>,
    /// Table to read; the table with the most task rows when unset.
    pub table_index: Option<usize>,
    /// `chrono` format of the start/end timestamps.
    pub timestamp_format: String,
    pub columns: TaskColumns,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            header_markers: vec!["Длительность".to_string(), "Duration".to_string()],
            table_index: None,
            timestamp_format: "%d.%m.%Y %H:%M:%S".to_string(),
            columns: TaskColumns::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub dpi: u32,
    /// Family name charts refer to; the font file is registered under it.
    pub font_family: String,
    /// TrueType/OpenType file to render text with. Common system locations
    /// are searched when unset.
    pub font_path: Option<PathBuf>,
    pub title_size: f64,
    pub label_size: f64,
    /// Scenario label → `#RRGGBB`.
    pub colors: BTreeMap<String, String>,
    /// Cycled through for scenarios without an explicit color.
    pub palette: Vec<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let colors = [
            ("Типовой", "#FF8C42"),
            ("Без дублей обменов", "#9B59B6"),
            ("Без дублей обменов + Параллельные портфели", "#16A085"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            dpi: 150,
            font_family: "sans-serif".to_string(),
            font_path: None,
            title_size: 14.0,
            label_size: 10.0,
            colors,
            palette: ["#3498DB", "#E74C3C", "#2ECC71", "#F1C40F", "#34495E", "#E67E22"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}
