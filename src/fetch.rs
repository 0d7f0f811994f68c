//! Raw export loading from disk or over HTTP.

use std::path::Path;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Loads the raw export from a local file path or fetches it over HTTP.
///
/// # Errors
///
/// Returns [`PipelineError::InputMissing`] for a local path that does not
/// exist, and [`PipelineError::Http`] for a failed or non-success request.
#[tracing::instrument(fields(source = %source))]
pub fn load_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(source)?
    } else {
        let path = Path::new(source);
        if !path.exists() {
            return Err(PipelineError::InputMissing(path.to_path_buf()));
        }
        std::fs::read(path)?
    };
    debug!(bytes = bytes.len(), "Source loaded");
    Ok(bytes)
}

pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(resp.bytes()?.to_vec())
}
