//! One-shot extract, aggregate and report run.

use std::path::Path;
use tracing::info;

use crate::analyzers::analyzer::analyze;
use crate::config::Config;
use crate::error::Result;
use crate::extract::extract;
use crate::report::{ReportOutput, generate_report};

/// Extracts `source` into the configured store, aggregates it and publishes
/// the views and the report into `out_dir`.
///
/// The views are published together with the report, so a run that fails
/// at any stage leaves `out_dir` as it was.
pub fn run(source: &str, config: &Config, out_dir: &Path) -> Result<ReportOutput> {
    let store = &config.paths.store;
    extract(source, store, config)?;
    let (measurements, aggregation) = analyze(store, config)?;
    let output = generate_report(&aggregation, config, out_dir)?;

    info!(
        days = measurements.len(),
        scenarios = aggregation.series.len(),
        out_dir = %out_dir.display(),
        "Pipeline complete"
    );
    Ok(output)
}
