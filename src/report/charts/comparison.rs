//! Charts comparing whole-period statistics across scenarios.

use plotters::prelude::*;
use std::f64::consts::TAU;

use super::{
    ChartData, bounds, cartesian, category_mesh, category_range, centered_style, legend, no_data, padded,
    reference_line, value_label_style,
};
use crate::analyzers::utility::{mean, median, sample_stddev};
use crate::report::style::ChartStyle;
use crate::report::surface::{Canvas, DrawResult};
use crate::stats::SummaryStatistics;

pub const RADAR_AXES: [&str; 6] = ["Mean", "Median", "Max", "Min", "Std", "Range"];

/// `[mean, median, max, min, std, range]` of one scenario divided by the same
/// metric over all days; a zero overall metric yields zero.
pub fn radar_profile(stats: &SummaryStatistics, overall: &[f64; 6]) -> [f64; 6] {
    let own = [
        stats.mean,
        stats.median,
        stats.max,
        stats.min,
        stats.std.unwrap_or(0.0),
        stats.range(),
    ];
    let mut out = [0.0; 6];
    for (k, slot) in out.iter_mut().enumerate() {
        if overall[k] > 0.0 {
            *slot = own[k] / overall[k];
        }
    }
    out
}

/// The radar metrics over every value pooled together.
pub fn overall_metrics(values: &[f64]) -> Option<[f64; 6]> {
    let (lo, hi) = bounds(values.iter().copied())?;
    Some([
        mean(values)?,
        median(values)?,
        hi,
        lo,
        sample_stddev(values).unwrap_or(0.0),
        hi - lo,
    ])
}

fn polar(radius: f64, axis: usize) -> (f64, f64) {
    let angle = TAU * axis as f64 / RADAR_AXES.len() as f64;
    (radius * angle.cos(), radius * angle.sin())
}

/// Normalized multi-metric profile of each scenario on a six-axis radar.
pub fn radar(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let Some(overall) = overall_metrics(&data.all_values()) else {
        return no_data(canvas, style, title);
    };
    let profiles: Vec<(usize, &str, [f64; 6])> = data
        .series()
        .iter()
        .enumerate()
        .filter_map(|(i, s)| {
            let stats = data.stats_for(&s.scenario)?;
            Some((i, s.scenario.as_str(), radar_profile(stats, &overall)))
        })
        .collect();
    if profiles.is_empty() {
        return no_data(canvas, style, title);
    }

    let outer = profiles
        .iter()
        .flat_map(|p| p.2.iter().copied())
        .fold(1.0, f64::max);
    let extent = outer * 1.3;
    let mut chart = cartesian(canvas, style, title, -extent..extent, -extent..extent)?;

    let grid = BLACK.mix(0.2).stroke_width(1);
    for ring in 1..=4 {
        let r = outer * ring as f64 / 4.0;
        let mut path: Vec<(f64, f64)> = (0..RADAR_AXES.len()).map(|k| polar(r, k)).collect();
        path.push(polar(r, 0));
        chart.draw_series(std::iter::once(PathElement::new(path, grid)))?;
        chart.draw_series(std::iter::once(Text::new(
            format!("{r:.2}"),
            (r * 0.02, r + outer * 0.02),
            style.small_font(),
        )))?;
    }
    for (k, name) in RADAR_AXES.iter().enumerate() {
        chart.draw_series(std::iter::once(PathElement::new(vec![(0.0, 0.0), polar(outer, k)], grid)))?;
        chart.draw_series(std::iter::once(Text::new(
            name.to_string(),
            polar(outer * 1.15, k),
            centered_style(style),
        )))?;
    }

    let stroke = style.stroke();
    let radius = style.px_u32(3.0);
    for (i, name, profile) in profiles {
        let color = style.color(name, i);
        let shape: Vec<(f64, f64)> = profile.iter().enumerate().map(|(k, v)| polar(*v, k)).collect();
        let mut outline = shape.clone();
        outline.extend(shape.first().copied());

        chart.draw_series(std::iter::once(Polygon::new(shape.clone(), color.mix(0.25).filled())))?;
        chart
            .draw_series(std::iter::once(PathElement::new(outline, color.stroke_width(stroke))))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke)));
        chart.draw_series(shape.into_iter().map(|p| Circle::new(p, radius, color.filled())))?;
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperRight)?;
    Ok(())
}

/// Mean, median and standard deviation side by side per scenario.
pub fn summary_bars(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let stats = data.summary;
    let metrics: [(&str, fn(&SummaryStatistics) -> f64); 3] = [
        ("Mean", |s: &SummaryStatistics| s.mean),
        ("Median", |s: &SummaryStatistics| s.median),
        ("Std", |s: &SummaryStatistics| s.std.unwrap_or(0.0)),
    ];
    let Some((_, hi)) = bounds(stats.iter().flat_map(|s| metrics.iter().map(move |(_, f)| f(s)))) else {
        return no_data(canvas, style, title);
    };

    let names: Vec<&str> = stats.iter().map(|s| s.scenario.as_str()).collect();
    let mut chart = cartesian(canvas, style, title, category_range(names.len()), padded(0.0, hi, true))?;
    category_mesh(&mut chart, style, &names, "Scenario", "Minutes")?;

    let width = 0.25;
    for (m, (label, value)) in metrics.iter().enumerate() {
        let color = style.accent(m);
        let offset = width * (m as f64 - 1.5);
        chart
            .draw_series(stats.iter().enumerate().map(|(k, s)| {
                let x = k as f64 + offset;
                Rectangle::new([(x, 0.0), (x + width, value(s))], color.mix(0.8).filled())
            }))?
            .label(*label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperRight)?;
    Ok(())
}

/// Improvement of every compared scenario over the baseline, in percent.
pub fn improvement(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let bars: Vec<(usize, &str, f64)> = data
        .summary
        .iter()
        .enumerate()
        .filter_map(|(i, s)| Some((i, s.scenario.as_str(), s.improvement_pct?)))
        .collect();
    let Some((lo, hi)) = bounds(bars.iter().map(|b| b.2)) else {
        return no_data(canvas, style, title);
    };

    let names: Vec<&str> = bars.iter().map(|b| b.1).collect();
    let x_range = category_range(names.len());
    let mut chart = cartesian(canvas, style, title, x_range.clone(), padded(lo, hi * 1.1, true))?;
    category_mesh(&mut chart, style, &names, "Scenario", "Improvement (%)")?;
    reference_line(&mut chart, &x_range, 0.0, BLACK.mix(0.6), style.px_u32(1.0))?;

    let half = 0.3;
    for (k, (i, name, pct)) in bars.iter().enumerate() {
        let x = k as f64;
        let color = style.color(name, *i);
        chart.draw_series([
            Rectangle::new([(x - half, 0.0), (x + half, *pct)], color.mix(0.8).filled()),
            Rectangle::new([(x - half, 0.0), (x + half, *pct)], BLACK.stroke_width(style.px_u32(1.0))),
        ])?;
        chart.draw_series(std::iter::once(Text::new(
            format!("{pct:.1}%"),
            (x, pct.max(0.0)),
            value_label_style(style),
        )))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::TimeSeries;
    use chrono::NaiveDate;

    #[test]
    fn test_radar_profile_normalizes_by_pooled_metrics() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 10, day).unwrap();
        let series = TimeSeries {
            scenario: "a".into(),
            points: vec![(d(1), 10.0), (d(2), 30.0)],
        };
        let stats = SummaryStatistics::from_series(&series).unwrap();
        let overall = overall_metrics(&[10.0, 30.0, 50.0, 70.0]).unwrap();

        assert_eq!(overall[0], 40.0);
        assert_eq!(overall[2], 70.0);
        assert_eq!(overall[5], 60.0);

        let profile = radar_profile(&stats, &overall);
        assert!((profile[0] - 0.5).abs() < 1e-9);
        assert!((profile[2] - 30.0 / 70.0).abs() < 1e-9);
        assert!((profile[3] - 1.0).abs() < 1e-9);
        assert!((profile[5] - 20.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_radar_profile_zero_overall() {
        let d = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let series = TimeSeries {
            scenario: "a".into(),
            points: vec![(d, 0.0)],
        };
        let stats = SummaryStatistics::from_series(&series).unwrap();
        let overall = overall_metrics(&[0.0]).unwrap();
        assert_eq!(radar_profile(&stats, &overall), [0.0; 6]);
    }
}
