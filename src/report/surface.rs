//! Scoped bitmap drawing surfaces.

use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use tracing::debug;

use crate::error::{PipelineError, Result};

pub type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Result of a drawing closure; plotters errors are boxed on `?`.
pub type DrawResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Acquires a `size` pixel surface backed by `path`, hands it to `draw`,
/// flushes it and releases it.
///
/// The surface is released on every path. When drawing or flushing fails
/// the partially written file is removed and a
/// [`PipelineError::Rendering`] naming `target` is returned.
pub fn with_surface<F>(path: &Path, size: (u32, u32), target: &str, draw: F) -> Result<()>
where
    F: FnOnce(&Canvas<'_>) -> DrawResult,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let outcome = {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        let drawn = root
            .fill(&WHITE)
            .map_err(Into::into)
            .and_then(|_| draw(&root));
        match drawn {
            Ok(()) => root.present().map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        }
    };

    match outcome {
        Ok(()) => {
            debug!(target_name = target, path = %path.display(), width = size.0, height = size.1, "Chart written");
            Ok(())
        }
        Err(message) => {
            let _ = std::fs::remove_file(path);
            Err(PipelineError::rendering(target, message))
        }
    }
}
