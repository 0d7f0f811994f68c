//! Chart renderers and the drawing helpers they share.
//!
//! Every chart is a function from [`ChartData`] to one drawing on a
//! [`Canvas`]; none of them touch the filesystem.

pub mod comparison;
pub mod distribution;
pub mod patterns;
pub mod timeline;

use chrono::NaiveDate;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;

use crate::analyzers::types::{Aggregation, TimeSeries};
use crate::report::style::ChartStyle;
use crate::report::surface::{Canvas, DrawResult};
use crate::stats::SummaryStatistics;

/// Everything a chart may draw from.
#[derive(Debug, Clone, Copy)]
pub struct ChartData<'a> {
    pub aggregation: &'a Aggregation,
    pub summary: &'a [SummaryStatistics],
    pub baseline: &'a str,
}

impl<'a> ChartData<'a> {
    pub fn series(&self) -> &'a [TimeSeries] {
        &self.aggregation.series
    }

    pub fn has_data(&self) -> bool {
        self.series().iter().any(|s| !s.is_empty())
    }

    pub fn stats_for(&self, scenario: &str) -> Option<&'a SummaryStatistics> {
        self.summary.iter().find(|s| s.scenario == scenario)
    }

    pub fn baseline_stats(&self) -> Option<&'a SummaryStatistics> {
        self.stats_for(self.baseline)
    }

    /// Earliest and latest date over every series.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.series().iter().filter_map(TimeSeries::first_date).min()?;
        let last = self.series().iter().filter_map(TimeSeries::last_date).max()?;
        Some((first, last))
    }

    /// Every value of every series.
    pub fn all_values(&self) -> Vec<f64> {
        self.series().iter().flat_map(|s| s.values()).collect()
    }
}

pub(crate) type Chart<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Maps dates to day offsets on an `f64` axis and back to labels.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DayAxis {
    origin: NaiveDate,
    span: i64,
}

impl DayAxis {
    pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            origin: first,
            span: (last - first).num_days().max(0),
        }
    }

    pub fn x(&self, date: NaiveDate) -> f64 {
        (date - self.origin).num_days() as f64
    }

    pub fn range(&self) -> Range<f64> {
        -1.0..self.span as f64 + 1.0
    }

    pub fn label(&self, x: f64) -> String {
        self.origin
            .checked_add_signed(chrono::Duration::days(x.round() as i64))
            .map(|d| d.format("%d.%m.%y").to_string())
            .unwrap_or_default()
    }
}

/// Lowest and highest finite value, if any.
pub(crate) fn bounds<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Value range with 5% headroom; optionally stretched to include zero.
pub(crate) fn padded(lo: f64, hi: f64, with_zero: bool) -> Range<f64> {
    let (lo, hi) = if with_zero {
        (lo.min(0.0), hi.max(0.0))
    } else {
        (lo, hi)
    };
    let span = if hi > lo { hi - lo } else { hi.abs().max(1.0) };
    let pad = span * 0.05;
    let lo = if with_zero && lo >= 0.0 { 0.0 } else { lo - pad };
    let hi = if with_zero && hi <= 0.0 { 0.0 } else { hi + pad };
    lo..hi
}

/// Axis range for `n` categories centred on `0..n`.
pub(crate) fn category_range(n: usize) -> Range<f64> {
    -0.5..n.max(1) as f64 - 0.5
}

/// Label of the category at `x`; blank between categories.
pub(crate) fn category_label<S: AsRef<str>>(names: &[S], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    names
        .get(idx as usize)
        .map(|n| short_label(n.as_ref(), 28))
        .unwrap_or_default()
}

/// Truncates `label` to at most `max` characters.
pub(crate) fn short_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        return label.to_string();
    }
    let mut cut: String = label.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Builds the titled plotting area shared by every cartesian chart.
pub(crate) fn cartesian<'a, 'b>(
    canvas: &'a Canvas<'b>,
    style: &ChartStyle,
    title: &str,
    x: Range<f64>,
    y: Range<f64>,
) -> Result<Chart<'a, 'b>, Box<dyn std::error::Error + Send + Sync>> {
    let chart = ChartBuilder::on(canvas)
        .caption(title, style.title_font())
        .margin(style.px_u32(8.0))
        .x_label_area_size(style.px_u32(28.0))
        .y_label_area_size(style.px_u32(44.0))
        .build_cartesian_2d(x, y)?;
    Ok(chart)
}

/// Mesh with dated x labels.
pub(crate) fn date_mesh(chart: &mut Chart, style: &ChartStyle, axis: &DayAxis, y_desc: &str) -> DrawResult {
    chart
        .configure_mesh()
        .x_labels(12)
        .x_label_formatter(&|x: &f64| axis.label(*x))
        .x_desc("Date")
        .y_desc(y_desc)
        .label_style(style.small_font())
        .axis_desc_style(style.label_font())
        .light_line_style(BLACK.mix(0.04))
        .bold_line_style(BLACK.mix(0.12))
        .draw()?;
    Ok(())
}

/// Mesh with plain numeric labels.
pub(crate) fn value_mesh(chart: &mut Chart, style: &ChartStyle, x_desc: &str, y_desc: &str) -> DrawResult {
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .label_style(style.small_font())
        .axis_desc_style(style.label_font())
        .light_line_style(BLACK.mix(0.04))
        .bold_line_style(BLACK.mix(0.12))
        .draw()?;
    Ok(())
}

/// Mesh whose x labels name the categories at `0..names.len()`.
pub(crate) fn category_mesh<S: AsRef<str>>(
    chart: &mut Chart,
    style: &ChartStyle,
    names: &[S],
    x_desc: &str,
    y_desc: &str,
) -> DrawResult {
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(names.len() * 2 + 2)
        .x_label_formatter(&|x: &f64| category_label(names, *x))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .label_style(style.small_font())
        .axis_desc_style(style.label_font())
        .light_line_style(BLACK.mix(0.04))
        .bold_line_style(BLACK.mix(0.12))
        .draw()?;
    Ok(())
}

pub(crate) fn legend<'a, 'b: 'a>(
    chart: &mut Chart<'a, 'b>,
    style: &ChartStyle,
    position: SeriesLabelPosition,
) -> DrawResult {
    chart
        .configure_series_labels()
        .position(position)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK.mix(0.4))
        .label_font(style.small_font())
        .draw()?;
    Ok(())
}

/// Draws a dashed horizontal reference line at `y` across `x`.
pub(crate) fn reference_line(chart: &mut Chart, x: &Range<f64>, y: f64, color: RGBAColor, width: u32) -> DrawResult {
    let steps = 60;
    let step = (x.end - x.start) / steps as f64;
    chart.draw_series((0..steps).step_by(2).map(|i| {
        let from = x.start + step * i as f64;
        PathElement::new(vec![(from, y), (from + step, y)], color.stroke_width(width))
    }))?;
    Ok(())
}

/// Placeholder drawn when a chart has nothing to show.
pub(crate) fn no_data(canvas: &Canvas, style: &ChartStyle, title: &str) -> DrawResult {
    let body = canvas.titled(title, style.title_font())?;
    let (w, h) = body.dim_in_pixel();
    let text = TextStyle::from(style.label_font()).pos(Pos::new(HPos::Center, VPos::Center));
    body.draw(&Text::new("No data to display", ((w / 2) as i32, (h / 2) as i32), text))?;
    Ok(())
}

/// Text anchored at its bottom centre, for bar value labels.
pub(crate) fn value_label_style(style: &ChartStyle) -> TextStyle<'_> {
    TextStyle::from(style.small_font()).pos(Pos::new(HPos::Center, VPos::Bottom))
}

/// Text anchored at its centre.
pub(crate) fn centered_style(style: &ChartStyle) -> TextStyle<'_> {
    TextStyle::from(style.small_font()).pos(Pos::new(HPos::Center, VPos::Center))
}

/// Splits the titled canvas into one panel per entry of `names`.
pub(crate) fn panels<'b>(
    canvas: &Canvas<'b>,
    style: &ChartStyle,
    title: &str,
    count: usize,
) -> Result<Vec<Canvas<'b>>, Box<dyn std::error::Error + Send + Sync>> {
    let body = canvas.titled(title, style.title_font())?;
    Ok(body.split_evenly((1, count.max(1))))
}

/// Small caption chart used inside a panel.
pub(crate) fn panel_chart<'a, 'b>(
    panel: &'a Canvas<'b>,
    style: &ChartStyle,
    caption: &str,
    x: Range<f64>,
    y: Range<f64>,
) -> Result<Chart<'a, 'b>, Box<dyn std::error::Error + Send + Sync>> {
    let chart = ChartBuilder::on(panel)
        .caption(short_label(caption, 40), style.label_font())
        .margin(style.px_u32(6.0))
        .x_label_area_size(style.px_u32(26.0))
        .y_label_area_size(style.px_u32(40.0))
        .build_cartesian_2d(x, y)?;
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::style::find_system_font;
    use crate::report::surface::with_surface;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    #[test]
    fn test_day_axis() {
        let axis = DayAxis::new(d(1), d(11));
        assert_eq!(axis.x(d(6)), 5.0);
        assert_eq!(axis.range(), -1.0..11.0);
        assert_eq!(axis.label(4.0), "05.10.25");
        assert_eq!(axis.label(3.6), "05.10.25");
    }

    #[test]
    fn test_bounds_and_padding() {
        assert_eq!(bounds(vec![3.0, f64::NAN, -1.0, 7.0]), Some((-1.0, 7.0)));
        assert_eq!(bounds(Vec::<f64>::new()), None);

        let r = padded(10.0, 20.0, true);
        assert_eq!(r.start, 0.0);
        assert!((r.end - 21.0).abs() < 1e-9);

        let flat = padded(5.0, 5.0, false);
        assert!(flat.start < 5.0 && flat.end > 5.0);
    }

    #[test]
    fn test_category_labels() {
        let names = ["alpha", "beta"];
        assert_eq!(category_label(&names, 0.0), "alpha");
        assert_eq!(category_label(&names, 1.0), "beta");
        assert_eq!(category_label(&names, 0.5), "");
        assert_eq!(category_label(&names, 2.0), "");
        assert_eq!(category_label(&names, -1.0), "");
        assert_eq!(category_range(3), -0.5..2.5);
    }

    #[test]
    fn test_legend_on_labelled_series() {
        if find_system_font().is_none() {
            return;
        }
        let mut style = ChartStyle::default();
        style.dpi = 40;
        style.register_fonts().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legend.png");

        with_surface(&path, style.figure(4.0, 3.0), "legend", |canvas| {
            let mut chart = cartesian(canvas, &style, "Legend", 0.0..2.0, 0.0..2.0)?;
            value_mesh(&mut chart, &style, "x", "y")?;
            chart
                .draw_series(LineSeries::new(vec![(0.0, 0.0), (2.0, 2.0)], RED.stroke_width(2)))?
                .label("rising")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], RED.stroke_width(2)));
            legend(&mut chart, &style, SeriesLabelPosition::UpperLeft)
        })
        .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_short_label() {
        assert_eq!(short_label("Типовой", 10), "Типовой");
        assert_eq!(short_label("Без дублей обменов", 6), "Без д…");
    }
}
