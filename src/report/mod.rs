//! Reporting stage: chart catalog, summary statistics, the aggregated views
//! and the Markdown and Word documents.
//!
//! Everything is rendered into a staging directory first and moved into the
//! output directory only once every file has been produced. Files from a
//! previous run are set aside during the move and restored if it fails.

pub mod catalog;
pub mod charts;
pub mod document;
pub mod style;
pub mod surface;
pub mod word;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::analyzers::analyzer::{ACCELERATION_FILE, ROLLING_FILE, WEEKLY_FILE, write_views};
use crate::analyzers::types::Aggregation;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::stats::{SummaryStatistics, summarize};
use catalog::ChartKind;
use charts::ChartData;
use document::{Figure, ReportDocument, generate_markdown_report};
use style::ChartStyle;
use word::write_word_report;

pub use word::WORD_FILE;

pub const FIGURES_DIR: &str = "figures";
pub const REPORT_FILE: &str = "report.md";
pub const SUMMARY_FILE: &str = "summary.json";
const STAGING_DIR: &str = ".report-staging";
const PREVIOUS_DIR: &str = ".report-previous";

/// Everything one report run places in the output directory.
const PUBLISHED: [&str; 7] = [
    FIGURES_DIR,
    REPORT_FILE,
    WORD_FILE,
    SUMMARY_FILE,
    ROLLING_FILE,
    ACCELERATION_FILE,
    WEEKLY_FILE,
];

/// Files produced by one report run.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub document: PathBuf,
    pub word: PathBuf,
    pub summary: PathBuf,
    pub figures: Vec<PathBuf>,
    pub statistics: Vec<SummaryStatistics>,
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    generated: NaiveDateTime,
    baseline: &'a str,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    scenarios: &'a [SummaryStatistics],
}

/// Renders the full chart catalog, `report.md`, `report.docx`,
/// `summary.json` and the aggregated views into `out_dir`.
///
/// # Errors
///
/// Returns [`PipelineError::Rendering`] if a font, a chart or a document
/// cannot be produced. The previous contents of `out_dir` are left as they
/// were in that case.
#[tracing::instrument(skip_all, fields(out_dir = %out_dir.display()))]
pub fn generate_report(aggregation: &Aggregation, config: &Config, out_dir: &Path) -> Result<ReportOutput> {
    let style = ChartStyle::from_config(&config.style);
    style.register_fonts()?;

    let statistics = summarize(&aggregation.series, Some(&config.baseline));
    let figure_names = stage_and_publish(out_dir, &PUBLISHED, |staging| {
        render_into(staging, aggregation, config, &style, &statistics)
    })?;

    let output = ReportOutput {
        document: out_dir.join(REPORT_FILE),
        word: out_dir.join(WORD_FILE),
        summary: out_dir.join(SUMMARY_FILE),
        figures: figure_names
            .iter()
            .map(|name| out_dir.join(FIGURES_DIR).join(name))
            .collect(),
        statistics,
    };

    log_summary(&output.statistics, &config.baseline);
    info!(
        charts = output.figures.len(),
        document = %output.document.display(),
        word = %output.word.display(),
        "Report complete"
    );
    Ok(output)
}

/// Runs `render` against a fresh staging directory below `out_dir`, then
/// publishes the staged `names`. The staging directory is removed on every
/// path.
fn stage_and_publish<T, F>(out_dir: &Path, names: &[&str], render: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    let staging = out_dir.join(STAGING_DIR);
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;

    let outcome = render(&staging).and_then(|value| publish(&staging, out_dir, names).map(|()| value));

    if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
        warn!(error = %cleanup, "Failed to remove staging directory");
    }
    outcome
}

/// Renders every chart, the views and all documents below `staging`;
/// returns the figure file names.
fn render_into(
    staging: &Path,
    aggregation: &Aggregation,
    config: &Config,
    style: &ChartStyle,
    statistics: &[SummaryStatistics],
) -> Result<Vec<String>> {
    let figures_dir = staging.join(FIGURES_DIR);
    std::fs::create_dir_all(&figures_dir)?;

    let data = ChartData {
        aggregation,
        summary: statistics,
        baseline: &config.baseline,
    };

    let mut figures = Vec::with_capacity(ChartKind::ALL.len());
    for kind in ChartKind::ALL {
        kind.render(&figures_dir, style, &data)?;
        figures.push(Figure {
            kind,
            path: format!("{}/{}", FIGURES_DIR, kind.file_name()),
            title: kind.title(&config.baseline),
        });
    }

    let generated = Local::now().naive_local();
    let doc = ReportDocument {
        generated,
        baseline: &config.baseline,
        series: &aggregation.series,
        summary: statistics,
        acceleration: &aggregation.acceleration,
        descriptions: config
            .scenarios
            .iter()
            .filter_map(|s| Some((s.label.clone(), s.description.clone()?)))
            .collect(),
        figures,
    };
    let markdown = generate_markdown_report(&doc);
    std::fs::write(staging.join(REPORT_FILE), &markdown)
        .map_err(|e| PipelineError::rendering(REPORT_FILE, e))?;
    write_word_report(&markdown, staging, &staging.join(WORD_FILE))?;

    let summary = SummaryFile {
        generated,
        baseline: &config.baseline,
        first_date: aggregation.series.iter().filter_map(|s| s.first_date()).min(),
        last_date: aggregation.series.iter().filter_map(|s| s.last_date()).max(),
        scenarios: statistics,
    };
    let json = serde_json::to_string_pretty(&summary)?;
    std::fs::write(staging.join(SUMMARY_FILE), json)
        .map_err(|e| PipelineError::rendering(SUMMARY_FILE, e))?;

    write_views(staging, aggregation)?;
    Ok(doc.figures.iter().map(|f| f.kind.file_name()).collect())
}

/// Moves the staged `names` into `out_dir`.
///
/// Existing files of the same names are moved aside first. If any move
/// fails, the newly placed files are removed and the previous ones put back.
fn publish(staging: &Path, out_dir: &Path, names: &[&str]) -> Result<()> {
    let previous = out_dir.join(PREVIOUS_DIR);
    if previous.exists() {
        std::fs::remove_dir_all(&previous)?;
    }
    std::fs::create_dir_all(&previous)?;

    let mut set_aside = Vec::new();
    let mut placed = Vec::new();
    let swapped = swap_in(staging, out_dir, &previous, names, &mut set_aside, &mut placed);

    let restored = swapped.is_ok() || roll_back(out_dir, &previous, &set_aside, &placed);
    if restored {
        if let Err(cleanup) = std::fs::remove_dir_all(&previous) {
            warn!(error = %cleanup, "Failed to remove previous report directory");
        }
    } else {
        warn!(path = %previous.display(), "Previous report kept after a failed rollback");
    }
    swapped
}

fn swap_in<'n>(
    staging: &Path,
    out_dir: &Path,
    previous: &Path,
    names: &[&'n str],
    set_aside: &mut Vec<&'n str>,
    placed: &mut Vec<&'n str>,
) -> Result<()> {
    for &name in names {
        let target = out_dir.join(name);
        if target.exists() {
            std::fs::rename(&target, previous.join(name))?;
            set_aside.push(name);
        }
    }
    for &name in names {
        std::fs::rename(staging.join(name), out_dir.join(name))?;
        placed.push(name);
    }
    Ok(())
}

/// Returns whether every previous file was put back.
fn roll_back(out_dir: &Path, previous: &Path, set_aside: &[&str], placed: &[&str]) -> bool {
    for name in placed {
        let path = out_dir.join(name);
        let removed = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        if let Err(e) = removed {
            warn!(path = %path.display(), error = %e, "Failed to remove partially published file");
        }
    }

    let mut restored = true;
    for name in set_aside {
        if let Err(e) = std::fs::rename(previous.join(name), out_dir.join(name)) {
            warn!(name, error = %e, "Failed to restore previous report file");
            restored = false;
        }
    }
    restored
}

/// Console summary: one line per scenario. Comparison fields are left out
/// for scenarios that could not be compared.
fn log_summary(statistics: &[SummaryStatistics], baseline: &str) {
    for s in statistics {
        if s.scenario == baseline {
            info!(scenario = %s.scenario, days = s.count, mean = s.mean, "Baseline");
            continue;
        }
        info!(
            scenario = %s.scenario,
            days = s.count,
            mean = s.mean,
            improvement_pct = s.improvement_pct,
            time_saved = s.time_saved,
            verdict = s.verdict.map(tracing::field::display),
            "Scenario summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::TimeSeries;
    use std::fs;
    use std::sync::{Arc, Mutex};

    const NAMES: [&str; 3] = [FIGURES_DIR, REPORT_FILE, SUMMARY_FILE];

    /// An output directory holding a report from an earlier run.
    fn previous_report(out: &Path) {
        fs::create_dir_all(out.join(FIGURES_DIR)).unwrap();
        fs::write(out.join(FIGURES_DIR).join("01_old.png"), b"old").unwrap();
        fs::write(out.join(REPORT_FILE), "old report").unwrap();
        fs::write(out.join(SUMMARY_FILE), "{}").unwrap();
    }

    fn hidden_entries(out: &Path) -> Vec<String> {
        fs::read_dir(out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with('.'))
            .collect()
    }

    fn assert_previous_report_intact(out: &Path) {
        assert_eq!(fs::read_to_string(out.join(REPORT_FILE)).unwrap(), "old report");
        assert!(out.join(FIGURES_DIR).join("01_old.png").exists());
        assert!(!out.join(FIGURES_DIR).join("01_new.png").exists());
        assert!(hidden_entries(out).is_empty());
    }

    #[test]
    fn test_failed_render_keeps_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();
        previous_report(out);

        let err = stage_and_publish(out, &NAMES, |staging| -> Result<()> {
            fs::create_dir_all(staging.join(FIGURES_DIR))?;
            fs::write(staging.join(FIGURES_DIR).join("01_new.png"), b"new")?;
            Err(PipelineError::rendering("05_histograms", "font lost mid-catalog"))
        })
        .unwrap_err();

        assert!(matches!(err, PipelineError::Rendering { .. }));
        assert_previous_report_intact(out);
    }

    #[test]
    fn test_failed_publish_restores_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();
        previous_report(out);

        // summary.json is never staged, so its move fails after the others.
        let err = stage_and_publish(out, &NAMES, |staging| -> Result<()> {
            fs::create_dir_all(staging.join(FIGURES_DIR))?;
            fs::write(staging.join(FIGURES_DIR).join("01_new.png"), b"new")?;
            fs::write(staging.join(REPORT_FILE), "new report")?;
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(err, PipelineError::Io(_)));
        assert_previous_report_intact(out);
        assert_eq!(fs::read_to_string(out.join(SUMMARY_FILE)).unwrap(), "{}");
    }

    #[test]
    fn test_publish_replaces_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();
        previous_report(out);
        fs::write(out.join("notes.txt"), "kept").unwrap();

        let value = stage_and_publish(out, &NAMES, |staging| -> Result<u32> {
            fs::create_dir_all(staging.join(FIGURES_DIR))?;
            fs::write(staging.join(FIGURES_DIR).join("01_new.png"), b"new")?;
            fs::write(staging.join(REPORT_FILE), "new report")?;
            fs::write(staging.join(SUMMARY_FILE), "{\"new\":true}")?;
            Ok(7)
        })
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(fs::read_to_string(out.join(REPORT_FILE)).unwrap(), "new report");
        assert!(out.join(FIGURES_DIR).join("01_new.png").exists());
        assert!(!out.join(FIGURES_DIR).join("01_old.png").exists());
        assert_eq!(fs::read_to_string(out.join("notes.txt")).unwrap(), "kept");
        assert!(hidden_entries(out).is_empty());
    }

    #[test]
    fn test_failed_first_run_leaves_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report");

        stage_and_publish(&out, &NAMES, |_| -> Result<()> {
            Err(PipelineError::rendering("01_daily_timeline", "boom"))
        })
        .unwrap_err();

        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn series(scenario: &str, values: &[f64]) -> TimeSeries {
        TimeSeries {
            scenario: scenario.to_string(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| (NaiveDate::from_ymd_opt(2025, 10, i as u32 + 1).unwrap(), *v))
                .collect(),
        }
    }

    #[test]
    fn test_summary_log_omits_missing_comparisons() {
        let compared = summarize(&[series("base", &[100.0, 100.0]), series("fast", &[50.0])], Some("base"));
        let uncompared = summarize(&[series("idle", &[0.0]), series("slow", &[5.0])], Some("idle"));

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            log_summary(&compared, "base");
            log_summary(&uncompared, "idle");
        });

        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(!text.contains("NaN"));

        let fast = text.lines().find(|l| l.contains("scenario=fast")).unwrap();
        assert!(fast.contains("improvement_pct=50"));
        assert!(fast.contains("verdict=major improvement"));

        let slow = text.lines().find(|l| l.contains("scenario=slow")).unwrap();
        assert!(!slow.contains("improvement_pct"));
        assert!(!slow.contains("time_saved"));
        assert!(!slow.contains("verdict"));
    }
}
