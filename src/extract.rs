//! Extraction stage: raw export → daily totals → classified store rows.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::{DailyMeasurement, TimeSeries};
use crate::analyzers::utility::mean;
use crate::config::{Config, ExtractConfig};
use crate::error::{PipelineError, Result};
use crate::fetch::load_source;
use crate::output::{parse_minutes, write_store};
use crate::parser::{RawTable, parse_tables};
use crate::scenario::ScenarioBoundaries;

/// One task row of the export that passed filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub started: Option<NaiveDateTime>,
    pub finished: NaiveDateTime,
    pub has_errors: bool,
    pub reference: String,
    pub minutes: f64,
}

/// Parses the task rows of `table`, skipping header artifacts and rows
/// without a parsable end timestamp or duration.
pub fn task_records(table: &RawTable, opts: &ExtractConfig) -> Vec<TaskRecord> {
    table
        .rows
        .iter()
        .filter_map(|row| task_record(row, opts))
        .collect()
}

fn task_record(row: &[String], opts: &ExtractConfig) -> Option<TaskRecord> {
    let cols = &opts.columns;
    let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

    let duration = cell(cols.duration);
    if opts
        .header_markers
        .iter()
        .any(|marker| duration.contains(marker.as_str()))
    {
        return None;
    }

    let minutes = parse_minutes(duration)?;
    let finished = parse_timestamp(cell(cols.end), &opts.timestamp_format)?;

    Some(TaskRecord {
        started: parse_timestamp(cell(cols.start), &opts.timestamp_format),
        finished,
        has_errors: is_truthy(cell(cols.has_errors)),
        reference: cell(cols.reference).to_string(),
        minutes,
    })
}

fn parse_timestamp(raw: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), format).ok()
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "да" | "yes" | "true" | "1" | "истина"
    )
}

/// Picks the table holding the task records.
///
/// A configured index wins; otherwise the table with the most task rows,
/// the earliest one on ties.
pub fn select_task_table(tables: &[RawTable], opts: &ExtractConfig) -> Result<usize> {
    if let Some(idx) = opts.table_index {
        if idx >= tables.len() {
            return Err(PipelineError::Configuration(format!(
                "table index {} out of range: the export has {} tables",
                idx,
                tables.len()
            )));
        }
        return Ok(idx);
    }

    let best = tables
        .iter()
        .enumerate()
        .map(|(idx, table)| (idx, task_records(table, opts).len()))
        .filter(|(_, count)| *count > 0)
        .fold(None, |best: Option<(usize, usize)>, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        });

    best.map(|(idx, _)| idx).ok_or_else(|| {
        PipelineError::EmptyResult(format!("none of the {} tables holds task records", tables.len()))
    })
}

/// Sums task minutes per calendar day of the end timestamp.
pub fn daily_totals(records: &[TaskRecord]) -> BTreeMap<NaiveDate, f64> {
    let mut totals = BTreeMap::new();
    for r in records {
        *totals.entry(r.finished.date()).or_insert(0.0) += r.minutes;
    }
    totals
}

/// Tags every daily total with its scenario.
pub fn classify_days(
    totals: &BTreeMap<NaiveDate, f64>,
    boundaries: &ScenarioBoundaries,
) -> Vec<DailyMeasurement> {
    totals
        .iter()
        .map(|(date, minutes)| DailyMeasurement::new(*date, boundaries.classify(*date), *minutes))
        .collect()
}

/// Runs table selection, filtering, daily reduction and classification over
/// an HTML export.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyResult`] if no task row survives filtering.
pub fn extract_from_html(
    html: &str,
    opts: &ExtractConfig,
    boundaries: &ScenarioBoundaries,
) -> Result<Vec<DailyMeasurement>> {
    let tables = parse_tables(html);
    let idx = select_task_table(&tables, opts)?;
    let table = &tables[idx];

    let records = task_records(table, opts);
    debug!(
        tables = tables.len(),
        table = idx,
        rows = table.rows.len(),
        records = records.len(),
        dropped = table.rows.len() - records.len(),
        with_errors = records.iter().filter(|r| r.has_errors).count(),
        "Task table parsed"
    );

    if records.is_empty() {
        return Err(PipelineError::EmptyResult(format!("table {}", idx)));
    }

    Ok(classify_days(&daily_totals(&records), boundaries))
}

/// Extraction stage: reads `source`, replaces the store at `store` and
/// returns the written rows.
#[tracing::instrument(skip(config), fields(store = %store.display()))]
pub fn extract(source: &str, store: &Path, config: &Config) -> Result<Vec<DailyMeasurement>> {
    let boundaries = config.boundaries()?;
    let bytes = load_source(source)?;
    let html = String::from_utf8_lossy(&bytes);

    let rows = extract_from_html(&html, &config.extract, &boundaries)?;
    write_store(store, &rows)?;

    info!(days = rows.len(), "Extraction complete");
    for series in TimeSeries::split(&rows) {
        info!(
            scenario = %series.scenario,
            days = series.len(),
            mean_minutes = mean(&series.values()).unwrap_or(0.0),
            "Scenario distribution"
        );
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::default_boundaries;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn opts() -> ExtractConfig {
        ExtractConfig::default()
    }

    #[test]
    fn test_task_record_filtering() {
        let table = RawTable {
            rows: vec![
                row(&["Начало", "Окончание", "Ошибки", "Ссылка", "Длительность", "", ""]),
                row(&["01.10.2025 08:00:00", "01.10.2025 09:00:00", "Нет", "Task 1", "1 200", "", ""]),
                row(&["", "01.10.2025 12:00:00", "Да", "Task 2", "30,5", "", ""]),
                row(&["01.10.2025 08:00:00", "garbage", "Нет", "Task 3", "10", "", ""]),
                row(&["01.10.2025 08:00:00", "02.10.2025 01:00:00", "Нет", "Task 4", "", "", ""]),
                row(&["Итого", "", "", "", "Длительность итого", "", ""]),
                row(&["short"]),
            ],
        };

        let records = task_records(&table, &opts());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].minutes, 1200.0);
        assert!(records[0].started.is_some());
        assert!(!records[0].has_errors);
        assert_eq!(records[1].minutes, 30.5);
        assert!(records[1].started.is_none());
        assert!(records[1].has_errors);
        assert_eq!(records[1].reference, "Task 2");
    }

    #[test]
    fn test_daily_totals_group_by_end_date() {
        let ts = |s: &str| NaiveDateTime::parse_from_str(s, "%d.%m.%Y %H:%M:%S").unwrap();
        let rec = |end: &str, minutes: f64| TaskRecord {
            started: None,
            finished: ts(end),
            has_errors: false,
            reference: String::new(),
            minutes,
        };
        let totals = daily_totals(&[
            rec("01.10.2025 23:59:59", 10.0),
            rec("01.10.2025 00:00:00", 5.0),
            rec("02.10.2025 00:00:01", 7.0),
        ]);
        let d = |day| NaiveDate::from_ymd_opt(2025, 10, day).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&d(1)], 15.0);
        assert_eq!(totals[&d(2)], 7.0);
    }

    #[test]
    fn test_select_largest_task_table() {
        let noise = RawTable {
            rows: vec![row(&["Отчёт", "Период"])],
        };
        let small = RawTable {
            rows: vec![row(&["", "01.10.2025 09:00:00", "", "", "1"])],
        };
        let big = RawTable {
            rows: vec![
                row(&["", "01.10.2025 09:00:00", "", "", "1"]),
                row(&["", "02.10.2025 09:00:00", "", "", "2"]),
            ],
        };
        let tables = vec![noise.clone(), small, big];
        assert_eq!(select_task_table(&tables, &opts()).unwrap(), 2);

        let forced = ExtractConfig {
            table_index: Some(1),
            ..opts()
        };
        assert_eq!(select_task_table(&tables, &forced).unwrap(), 1);

        let out_of_range = ExtractConfig {
            table_index: Some(9),
            ..opts()
        };
        assert!(matches!(
            select_task_table(&tables, &out_of_range),
            Err(PipelineError::Configuration(_))
        ));

        assert!(matches!(
            select_task_table(&[noise], &opts()),
            Err(PipelineError::EmptyResult(_))
        ));
    }

    #[test]
    fn test_extract_from_html_classifies_days() {
        let html = r#"
            <table><tr><td>Отчёт по заданиям</td></tr></table>
            <table>
              <tr><td>Начало</td><td>Окончание</td><td>Ошибки</td><td>Ссылка</td><td>Длительность</td></tr>
              <tr><td>01.10.2025 08:00:00</td><td>01.10.2025 09:00:00</td><td>Нет</td><td>A</td><td>100</td></tr>
              <tr><td>01.10.2025 10:00:00</td><td>01.10.2025 11:00:00</td><td>Нет</td><td>B</td><td>20</td></tr>
              <tr><td>12.10.2025 08:00:00</td><td>12.10.2025 09:00:00</td><td>Нет</td><td>C</td><td>60</td></tr>
              <tr><td>20.10.2025 08:00:00</td><td>20.10.2025 09:00:00</td><td>Нет</td><td>D</td><td>30</td></tr>
            </table>"#;

        let boundaries = ScenarioBoundaries::new(&default_boundaries()).unwrap();
        let rows = extract_from_html(html, &opts(), &boundaries).unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2025, 10, day).unwrap();
        assert_eq!(
            rows,
            vec![
                DailyMeasurement::new(d(1), "Типовой", 120.0),
                DailyMeasurement::new(d(12), "Без дублей обменов", 60.0),
                DailyMeasurement::new(d(20), "Без дублей обменов + Параллельные портфели", 30.0),
            ]
        );
    }

    #[test]
    fn test_extract_from_html_without_records() {
        let html = "<table><tr><td>Длительность</td></tr></table>";
        let boundaries = ScenarioBoundaries::new(&default_boundaries()).unwrap();
        let err = extract_from_html(html, &opts(), &boundaries).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResult(_)));
    }

    #[test]
    fn test_extract_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract(
            dir.path().join("missing.htm").to_str().unwrap(),
            &dir.path().join("store.csv"),
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::InputMissing(_)));
        assert!(!dir.path().join("store.csv").exists());
    }
}
