use du_speed::analyzers::analyzer::{ACCELERATION_FILE, ROLLING_FILE, WEEKLY_FILE, analyze, write_views};
use du_speed::analyzers::types::DailyMeasurement;
use du_speed::config::Config;
use du_speed::error::PipelineError;
use du_speed::extract::extract;
use du_speed::output::{read_store, write_store};
use du_speed::report::catalog::ChartKind;
use du_speed::report::style::find_system_font;
use du_speed::pipeline;
use du_speed::report::{FIGURES_DIR, REPORT_FILE, SUMMARY_FILE, WORD_FILE, generate_report};
use std::fs::File;
use std::path::{Path, PathBuf};

const BASELINE: &str = "Типовой";
const DEDUP: &str = "Без дублей обменов";
const PARALLEL: &str = "Без дублей обменов + Параллельные портфели";

fn fixture() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/export.htm")
        .to_string_lossy()
        .into_owned()
}

fn day(d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
}

fn find(rows: &[DailyMeasurement], d: u32) -> &DailyMeasurement {
    rows.iter().find(|r| r.date == day(d)).unwrap()
}

/// Low-resolution config so the full catalog renders quickly.
fn fast_config() -> Config {
    let mut config = Config::default();
    config.style.dpi = 50;
    config
}

#[test]
fn test_extract_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.csv");

    let rows = extract(&fixture(), &store, &Config::default()).unwrap();

    assert_eq!(rows.len(), 25);
    assert_eq!(rows.iter().filter(|r| r.scenario == BASELINE).count(), 8);
    assert_eq!(rows.iter().filter(|r| r.scenario == DEDUP).count(), 8);
    assert_eq!(rows.iter().filter(|r| r.scenario == PARALLEL).count(), 9);

    assert_eq!(find(&rows, 1).minutes, 305.0);
    // thousands separator and a row without an end timestamp
    assert_eq!(find(&rows, 3).minutes, 1315.0);
    assert_eq!(find(&rows, 5).minutes, 325.0);
    assert_eq!(find(&rows, 9).minutes, 159.5);
    assert_eq!(find(&rows, 17).minutes, 77.0);

    assert_eq!(find(&rows, 8).scenario, BASELINE);
    assert_eq!(find(&rows, 9).scenario, DEDUP);
    assert_eq!(find(&rows, 16).scenario, DEDUP);
    assert_eq!(find(&rows, 17).scenario, PARALLEL);

    assert_eq!(read_store(&store).unwrap(), rows);
}

#[test]
fn test_extract_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.csv");
    let config = Config::default();

    extract(&fixture(), &store, &config).unwrap();
    let first = std::fs::read(&store).unwrap();
    extract(&fixture(), &store, &config).unwrap();
    let second = std::fs::read(&store).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_aggregate_disjoint_scenarios() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.csv");
    let config = Config::default();
    extract(&fixture(), &store, &config).unwrap();

    let (measurements, aggregation) = analyze(&store, &config).unwrap();
    assert_eq!(measurements.len(), 25);
    let names: Vec<&str> = aggregation.series.iter().map(|s| s.scenario.as_str()).collect();
    assert_eq!(names, vec![BASELINE, DEDUP, PARALLEL]);
    assert_eq!(aggregation.rolling.len(), 25);

    // Scenarios never share a date, so no ratio is defined.
    assert!(aggregation.acceleration.rows.is_empty());
    assert!(aggregation.weekly.is_empty());

    let out = dir.path().join("views");
    write_views(&out, &aggregation).unwrap();
    let rolling = std::fs::read_to_string(out.join(ROLLING_FILE)).unwrap();
    assert!(rolling.starts_with("date;scenario;mean;std;min;max"));
    assert_eq!(rolling.lines().count(), 26);
    let accel = std::fs::read_to_string(out.join(ACCELERATION_FILE)).unwrap();
    assert_eq!(accel.lines().count(), 1);
    assert!(out.join(WEEKLY_FILE).exists());
}

#[test]
fn test_aggregate_shared_dates() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.csv");
    let rows = vec![
        DailyMeasurement::new(day(6), "base", 100.0),
        DailyMeasurement::new(day(6), "fast", 50.0),
        DailyMeasurement::new(day(7), "base", 90.0),
        DailyMeasurement::new(day(7), "fast", 0.0),
        DailyMeasurement::new(day(13), "base", 80.0),
        DailyMeasurement::new(day(13), "fast", 40.0),
    ];
    write_store(&store, &rows).unwrap();

    let config = Config {
        baseline: "base".to_string(),
        ..Config::default()
    };
    let (_, aggregation) = analyze(&store, &config).unwrap();

    let samples = aggregation.acceleration.samples();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].date, day(6));
    assert_eq!(samples[0].ratio, 2.0);
    assert_eq!(samples[1].date, day(13));

    // 06.10 and 07.10 fall in the week ending 12.10; 13.10 starts the next one.
    assert_eq!(aggregation.weekly.len(), 2);
    assert_eq!(aggregation.weekly[0].week_ending, day(12));
    assert_eq!(aggregation.weekly[0].mean_ratio, Some(2.0));
    assert_eq!(aggregation.weekly[1].week_ending, day(19));
}

#[test]
fn test_missing_baseline_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.csv");
    extract(&fixture(), &store, &Config::default()).unwrap();

    let config = Config {
        baseline: "Nope".to_string(),
        ..Config::default()
    };
    let err = analyze(&store, &config).unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
}

#[test]
fn test_missing_store_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = analyze(&dir.path().join("absent.csv"), &Config::default()).unwrap_err();
    assert!(matches!(err, PipelineError::InputMissing(_)));
}

#[test]
fn test_full_pipeline() {
    if find_system_font().is_none() {
        eprintln!("skipping: no system font available");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report");
    let mut config = fast_config();
    config.paths.store = dir.path().join("store.csv");

    let output = pipeline::run(&fixture(), &config, &out).unwrap();

    assert_eq!(output.figures.len(), ChartKind::ALL.len());
    for (path, kind) in output.figures.iter().zip(ChartKind::ALL) {
        assert_eq!(*path, out.join(FIGURES_DIR).join(kind.file_name()));
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    let markdown = std::fs::read_to_string(out.join(REPORT_FILE)).unwrap();
    for kind in ChartKind::ALL {
        assert!(markdown.contains(&format!("{}/{}", FIGURES_DIR, kind.file_name())));
    }

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join(SUMMARY_FILE)).unwrap()).unwrap();
    assert_eq!(summary["baseline"], BASELINE);
    assert_eq!(summary["first_date"], "2025-10-01");
    assert_eq!(summary["last_date"], "2025-10-25");
    let scenarios = summary["scenarios"].as_array().unwrap();
    assert_eq!(scenarios.len(), 3);
    assert!(scenarios[0]["improvement_pct"].is_null());
    assert!(scenarios[1]["improvement_pct"].as_f64().unwrap() > 0.0);
    assert!(scenarios[2]["improvement_pct"].as_f64().unwrap() > 0.0);

    for view in [ROLLING_FILE, ACCELERATION_FILE, WEEKLY_FILE] {
        assert!(out.join(view).exists(), "{view} not published");
    }

    assert_eq!(output.word, out.join(WORD_FILE));
    let word = zip::ZipArchive::new(File::open(&output.word).unwrap()).unwrap();
    let media = word.file_names().filter(|n| n.contains("media/")).count();
    assert_eq!(media, ChartKind::ALL.len());

    let staged: Vec<PathBuf> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.file_name().is_some_and(|n| n.to_string_lossy().starts_with('.')))
        .collect();
    assert!(staged.is_empty());
}

#[test]
fn test_missing_font_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.csv");
    let out = dir.path().join("report");
    let mut config = fast_config();
    config.style.font_path = Some(dir.path().join("missing.ttf"));

    extract(&fixture(), &store, &config).unwrap();
    let (_, aggregation) = analyze(&store, &config).unwrap();
    let err = generate_report(&aggregation, &config, &out).unwrap_err();

    assert!(matches!(err, PipelineError::Rendering { .. }));
    assert!(!out.join(REPORT_FILE).exists());
    assert!(!out.join(SUMMARY_FILE).exists());
    assert!(!out.join(FIGURES_DIR).exists());
}

#[test]
fn test_failed_run_leaves_output_dir_empty() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report");
    let mut config = fast_config();
    config.paths.store = dir.path().join("store.csv");
    config.style.font_path = Some(dir.path().join("missing.ttf"));

    let err = pipeline::run(&fixture(), &config, &out).unwrap_err();

    assert!(matches!(err, PipelineError::Rendering { .. }));
    // The store is written, but nothing lands in the output directory.
    assert!(config.paths.store.exists());
    let published = std::fs::read_dir(&out).map(|d| d.count()).unwrap_or(0);
    assert_eq!(published, 0);
}
