//! Explicit chart styling handed to every chart call.

use plotters::prelude::*;
use plotters::style::{FontDesc, FontStyle, register_font};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::StyleConfig;
use crate::error::{PipelineError, Result};

/// Font files tried, in order, when no font path is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const FALLBACK_COLOR: RGBColor = RGBColor(0x34, 0x98, 0xDB);

/// Palette, fonts and sizes for one report run.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub dpi: u32,
    pub font_family: String,
    pub font_path: Option<PathBuf>,
    pub title_pt: f64,
    pub label_pt: f64,
    colors: BTreeMap<String, RGBColor>,
    palette: Vec<RGBColor>,
}

impl ChartStyle {
    /// Builds a style from config; malformed color strings are skipped.
    pub fn from_config(config: &StyleConfig) -> Self {
        let colors = config
            .colors
            .iter()
            .filter_map(|(label, hex)| parse_hex(hex).map(|c| (label.clone(), c)))
            .collect();
        let mut palette: Vec<RGBColor> =
            config.palette.iter().filter_map(|hex| parse_hex(hex)).collect();
        if palette.is_empty() {
            palette.push(FALLBACK_COLOR);
        }

        Self {
            dpi: config.dpi.max(1),
            font_family: config.font_family.clone(),
            font_path: config.font_path.clone(),
            title_pt: config.title_size,
            label_pt: config.label_size,
            colors,
            palette,
        }
    }

    /// Color of `scenario`, falling back to the palette entry for `index`.
    pub fn color(&self, scenario: &str, index: usize) -> RGBColor {
        self.colors
            .get(scenario)
            .copied()
            .unwrap_or_else(|| self.palette[index % self.palette.len()])
    }

    /// Palette entry `index`, for series that are not scenarios.
    pub fn accent(&self, index: usize) -> RGBColor {
        self.palette[index % self.palette.len()]
    }

    /// Pixel size of a figure given in inches.
    pub fn figure(&self, width_in: f64, height_in: f64) -> (u32, u32) {
        let dpi = self.dpi as f64;
        ((width_in * dpi).round() as u32, (height_in * dpi).round() as u32)
    }

    /// Converts points to pixels at the configured resolution.
    pub fn px(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }

    /// Converts points to whole pixels, at least one.
    pub fn px_u32(&self, points: f64) -> u32 {
        self.px(points).round().max(1.0) as u32
    }

    pub fn title_font(&self) -> FontDesc<'_> {
        (self.font_family.as_str(), self.px(self.title_pt)).into_font()
    }

    pub fn label_font(&self) -> FontDesc<'_> {
        (self.font_family.as_str(), self.px(self.label_pt)).into_font()
    }

    pub fn small_font(&self) -> FontDesc<'_> {
        (self.font_family.as_str(), self.px(self.label_pt * 0.8)).into_font()
    }

    /// Line width for data series.
    pub fn stroke(&self) -> u32 {
        self.px_u32(1.8)
    }

    /// Registers the font file under the configured family name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Rendering`] when no font file is found or the
    /// file is not a usable font.
    pub fn register_fonts(&self) -> Result<PathBuf> {
        let path = self
            .font_path
            .clone()
            .or_else(find_system_font)
            .ok_or_else(|| {
                PipelineError::rendering(
                    "fonts",
                    "no font file configured and none found in the usual system locations",
                )
            })?;

        let bytes = std::fs::read(&path)
            .map_err(|e| PipelineError::rendering("fonts", format!("{}: {}", path.display(), e)))?;
        // the plotters font registry only holds 'static data
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());

        for style in [FontStyle::Normal, FontStyle::Bold] {
            register_font(&self.font_family, style, bytes).map_err(|_| {
                PipelineError::rendering("fonts", format!("{} is not a valid font", path.display()))
            })?;
        }

        debug!(family = %self.font_family, path = %path.display(), "Font registered");
        Ok(path)
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self::from_config(&StyleConfig::default())
    }
}

/// First existing file of the built-in candidate list.
pub fn find_system_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
}

/// Parses `#RRGGBB` (leading `#` optional).
pub fn parse_hex(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// Diverging green → yellow → red ramp for `t` in `[0, 1]`.
pub fn heat_color(t: f64) -> RGBColor {
    const GREEN: (f64, f64, f64) = (26.0, 152.0, 80.0);
    const YELLOW: (f64, f64, f64) = (255.0, 255.0, 191.0);
    const RED: (f64, f64, f64) = (215.0, 48.0, 39.0);

    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let (from, to, f) = if t < 0.5 {
        (GREEN, YELLOW, t * 2.0)
    } else {
        (YELLOW, RED, (t - 0.5) * 2.0)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * f).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}
