//! Canonical store persistence and `;`-separated table output.
//!
//! The store is a flat `date;scenario;minutes` file that each extraction run
//! replaces wholesale.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::DailyMeasurement;
use crate::error::{PipelineError, Result};

pub const STORE_DELIMITER: u8 = b';';
pub const STORE_HEADER: [&str; 3] = ["date", "scenario", "minutes"];

/// Writes `header` and `rows` to `path`, replacing any existing file.
///
/// `header` must list the fields of `T` in declaration order. Parent
/// directories are created as needed.
pub fn write_table<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new()
        .delimiter(STORE_DELIMITER)
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = rows.len(), "Table written");
    Ok(())
}

/// Replaces the canonical store with `measurements`, ordered by date and
/// scenario so that identical input always yields identical bytes.
pub fn write_store(path: &Path, measurements: &[DailyMeasurement]) -> Result<()> {
    let mut rows = measurements.to_vec();
    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.scenario.cmp(&b.scenario)));

    write_table(path, &STORE_HEADER, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "Canonical store written");
    Ok(())
}

/// Loads the canonical store, dropping every row whose date, scenario or
/// minutes cannot be parsed. Rows come back ordered by date.
///
/// # Errors
///
/// Returns [`PipelineError::InputMissing`] if `path` does not exist.
pub fn read_store(path: &Path) -> Result<Vec<DailyMeasurement>> {
    if !path.exists() {
        return Err(PipelineError::InputMissing(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(STORE_DELIMITER)
        .flexible(true)
        .from_path(path)?;

    let columns = StoreColumns::locate(reader.headers()?);
    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for record in reader.records() {
        match record.ok().and_then(|r| columns.parse(&r)) {
            Some(row) => rows.push(row),
            None => dropped += 1,
        }
    }

    rows.sort_by_key(|r| r.date);
    debug!(path = %path.display(), rows = rows.len(), dropped, "Canonical store loaded");
    Ok(rows)
}

/// Column positions of the store fields, by header name where present.
struct StoreColumns {
    date: usize,
    scenario: usize,
    minutes: usize,
}

impl StoreColumns {
    fn locate(headers: &StringRecord) -> Self {
        let find = |name: &str, fallback: usize| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
                .unwrap_or(fallback)
        };
        Self {
            date: find("date", 0),
            scenario: find("scenario", 1),
            minutes: find("minutes", 2),
        }
    }

    fn parse(&self, record: &StringRecord) -> Option<DailyMeasurement> {
        let date = NaiveDate::parse_from_str(record.get(self.date)?.trim(), "%Y-%m-%d").ok()?;
        let scenario = record.get(self.scenario)?.trim();
        if scenario.is_empty() {
            return None;
        }
        let minutes = parse_minutes(record.get(self.minutes)?)?;
        Some(DailyMeasurement::new(date, scenario, minutes))
    }
}

/// Parses a non-negative, finite decimal, accepting `,` as decimal separator.
pub fn parse_minutes(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}
