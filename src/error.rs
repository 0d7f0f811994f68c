//! Error kinds shared by every pipeline stage.

use std::path::PathBuf;

/// Failure of one pipeline stage.
///
/// Row-level data-quality problems never surface here: unparsable rows are
/// dropped by the stage that reads them.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The source file a stage reads from does not exist.
    #[error("input not found: {}", .0.display())]
    InputMissing(PathBuf),

    /// Extraction filtered out every row of the export.
    #[error("no task records survived filtering in {0}")]
    EmptyResult(String),

    /// Baseline missing, nothing to compare against, or an invalid config.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A chart or the report document could not be produced.
    #[error("failed to render {target}: {message}")]
    Rendering { target: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl PipelineError {
    pub(crate) fn rendering(target: impl Into<String>, message: impl ToString) -> Self {
        PipelineError::Rendering {
            target: target.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
