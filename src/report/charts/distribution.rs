//! Charts of the value distribution of each scenario.

use plotters::prelude::*;

use super::{
    ChartData, bounds, cartesian, category_mesh, category_range, legend, no_data, padded, panel_chart,
    panels, value_mesh,
};
use crate::analyzers::utility::{
    gaussian_kde, linear_fit, linspace, mean, qq_points, quantile_sorted, scott_bandwidth, sorted,
};
use crate::report::style::ChartStyle;
use crate::report::surface::{Canvas, DrawResult};

pub const PERCENTILES: [u32; 7] = [10, 25, 50, 75, 90, 95, 99];
const HISTOGRAM_BINS: usize = 15;
const DENSITY_STEPS: usize = 200;

/// Five-number summary with 1.5 IQR whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub mean: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let ordered = sorted(values);
        let q1 = quantile_sorted(&ordered, 0.25)?;
        let q3 = quantile_sorted(&ordered, 0.75)?;
        let fence = 1.5 * (q3 - q1);
        let (lo_fence, hi_fence) = (q1 - fence, q3 + fence);

        let inside = ordered.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
        let (whisker_low, whisker_high) = bounds(inside).unwrap_or((q1, q3));

        Some(Self {
            q1,
            median: quantile_sorted(&ordered, 0.5)?,
            q3,
            mean: mean(values)?,
            whisker_low,
            whisker_high,
            outliers: ordered
                .iter()
                .copied()
                .filter(|v| *v < lo_fence || *v > hi_fence)
                .collect(),
        })
    }
}

/// Equal-width bins over `[min, max]` as `(left edge, right edge, count)`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    let Some((lo, hi)) = bounds(values.iter().copied()) else {
        return Vec::new();
    };
    let bins = bins.max(1);
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values.iter().filter(|v| v.is_finite()) {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (lo + width * i as f64, lo + width * (i + 1) as f64, c))
        .collect()
}

pub fn box_plot(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let boxes: Vec<(usize, &str, BoxStats)> = data
        .series()
        .iter()
        .enumerate()
        .filter_map(|(i, s)| Some((i, s.scenario.as_str(), BoxStats::from_values(&s.values())?)))
        .collect();
    let Some((lo, hi)) = bounds(data.all_values()) else {
        return no_data(canvas, style, title);
    };

    let names: Vec<&str> = boxes.iter().map(|(_, name, _)| *name).collect();
    let mut chart = cartesian(canvas, style, title, category_range(names.len()), padded(lo, hi, false))?;
    category_mesh(&mut chart, style, &names, "Scenario", "Duration (minutes)")?;

    let line = style.px_u32(1.2);
    let radius = style.px_u32(3.0);
    for (x, (i, name, b)) in boxes.iter().enumerate() {
        let x = x as f64;
        let color = style.color(name, *i);
        let half = 0.3;

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - half, b.q1), (x + half, b.q3)],
                color.mix(0.7).filled(),
            )))?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.mix(0.7).filled()));

        chart.draw_series([
            Rectangle::new([(x - half, b.q1), (x + half, b.q3)], BLACK.stroke_width(line)),
        ])?;
        chart.draw_series([
            PathElement::new(vec![(x - half, b.median), (x + half, b.median)], BLACK.stroke_width(line * 2)),
            PathElement::new(vec![(x - half, b.mean), (x + half, b.mean)], GREEN.stroke_width(line)),
            PathElement::new(vec![(x, b.q3), (x, b.whisker_high)], BLACK.stroke_width(line)),
            PathElement::new(vec![(x, b.q1), (x, b.whisker_low)], BLACK.stroke_width(line)),
            PathElement::new(vec![(x - half / 2.0, b.whisker_high), (x + half / 2.0, b.whisker_high)], BLACK.stroke_width(line)),
            PathElement::new(vec![(x - half / 2.0, b.whisker_low), (x + half / 2.0, b.whisker_low)], BLACK.stroke_width(line)),
        ])?;
        chart.draw_series(
            b.outliers
                .iter()
                .map(|v| Circle::new((x, *v), radius, RED.stroke_width(line))),
        )?;
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperRight)?;
    Ok(())
}

pub fn violin(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    struct Body<'a> {
        index: usize,
        name: &'a str,
        outline: Vec<(f64, f64)>,
        median: f64,
        mean: f64,
    }

    let mut bodies = Vec::new();
    for (i, s) in data.series().iter().enumerate() {
        let values = s.values();
        let (Some(bw), Some((lo, hi)), Some(b)) = (
            scott_bandwidth(&values),
            bounds(values.iter().copied()),
            BoxStats::from_values(&values),
        ) else {
            continue;
        };
        let grid = linspace(lo - 2.0 * bw, hi + 2.0 * bw, 100);
        let Some(density) = gaussian_kde(&values, &grid) else {
            continue;
        };
        let peak = density.iter().copied().fold(0.0, f64::max);
        let scale = if peak > 0.0 { 0.4 / peak } else { 0.0 };

        let x = bodies.len() as f64;
        let outline = grid
            .iter()
            .zip(&density)
            .map(|(y, d)| (x + d * scale, *y))
            .chain(grid.iter().zip(&density).rev().map(|(y, d)| (x - d * scale, *y)))
            .collect();
        bodies.push(Body {
            index: i,
            name: s.scenario.as_str(),
            outline,
            median: b.median,
            mean: b.mean,
        });
    }

    let Some((lo, hi)) = bounds(bodies.iter().flat_map(|b| b.outline.iter().map(|p| p.1))) else {
        return no_data(canvas, style, title);
    };

    let names: Vec<&str> = bodies.iter().map(|b| b.name).collect();
    let mut chart = cartesian(canvas, style, title, category_range(names.len()), padded(lo, hi, false))?;
    category_mesh(&mut chart, style, &names, "Scenario", "Duration (minutes)")?;

    let line = style.px_u32(1.5);
    for (x, body) in bodies.iter().enumerate() {
        let x = x as f64;
        let color = style.color(body.name, body.index);
        chart
            .draw_series(std::iter::once(Polygon::new(body.outline.clone(), color.mix(0.6).filled())))?
            .label(body.name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.mix(0.6).filled()));

        let mut closed = body.outline.clone();
        closed.extend(body.outline.first().copied());
        chart.draw_series([
            PathElement::new(closed, color.stroke_width(line)),
            PathElement::new(vec![(x - 0.15, body.median), (x + 0.15, body.median)], BLACK.stroke_width(line * 2)),
            PathElement::new(vec![(x - 0.15, body.mean), (x + 0.15, body.mean)], RED.stroke_width(line)),
        ])?;
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperRight)?;
    Ok(())
}

/// One histogram panel per scenario with mean and median markers.
pub fn histograms(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let series: Vec<_> = data.series().iter().enumerate().filter(|(_, s)| !s.is_empty()).collect();
    if series.is_empty() {
        return no_data(canvas, style, title);
    }

    let areas = panels(canvas, style, title, series.len())?;
    let line = style.px_u32(1.5);
    for (area, (i, s)) in areas.iter().zip(series) {
        let values = s.values();
        let bins = histogram(&values, HISTOGRAM_BINS);
        let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
            continue;
        };
        let peak = bins.iter().map(|b| b.2).max().unwrap_or(1) as f64;
        let color = style.color(&s.scenario, i);

        let mut chart = panel_chart(area, style, &s.scenario, first.0..last.1, 0.0..peak * 1.15)?;
        value_mesh(&mut chart, style, "Minutes", "Frequency")?;

        chart.draw_series(bins.iter().map(|(l, r, c)| {
            Rectangle::new([(*l, 0.0), (*r, *c as f64)], color.mix(0.7).filled())
        }))?;
        chart.draw_series(bins.iter().map(|(l, r, c)| {
            Rectangle::new([(*l, 0.0), (*r, *c as f64)], BLACK.mix(0.6).stroke_width(1))
        }))?;

        let ordered = sorted(&values);
        let markers = [
            (mean(&values), RED, "Mean"),
            (quantile_sorted(&ordered, 0.5), GREEN, "Median"),
        ];
        for (value, marker, name) in markers {
            let Some(v) = value else { continue };
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(v, 0.0), (v, peak * 1.1)],
                    marker.stroke_width(line),
                )))?
                .label(format!("{name}: {v:.1}"))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], marker.stroke_width(line)));
        }
        legend(&mut chart, style, SeriesLabelPosition::UpperRight)?;
    }
    Ok(())
}

/// Gaussian kernel density of every scenario on a shared grid.
pub fn density(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let Some((lo, hi)) = bounds(data.all_values()) else {
        return no_data(canvas, style, title);
    };
    let widest = data
        .series()
        .iter()
        .filter_map(|s| scott_bandwidth(&s.values()))
        .fold(0.0, f64::max);
    let grid = linspace(lo - 3.0 * widest, hi + 3.0 * widest, DENSITY_STEPS);

    let curves: Vec<(usize, &str, Vec<(f64, f64)>)> = data
        .series()
        .iter()
        .enumerate()
        .filter_map(|(i, s)| {
            let density = gaussian_kde(&s.values(), &grid)?;
            let points = grid.iter().copied().zip(density).collect();
            Some((i, s.scenario.as_str(), points))
        })
        .collect();
    let peak = curves
        .iter()
        .flat_map(|(_, _, pts)| pts.iter().map(|p| p.1))
        .fold(0.0, f64::max);
    let (Some(x0), Some(x1)) = (grid.first(), grid.last()) else {
        return no_data(canvas, style, title);
    };

    let mut chart = cartesian(canvas, style, title, *x0..*x1, padded(0.0, peak, true))?;
    value_mesh(&mut chart, style, "Duration (minutes)", "Density")?;

    let stroke = style.stroke();
    for (i, name, points) in curves {
        let color = style.color(name, i);
        chart
            .draw_series(
                AreaSeries::new(points, 0.0, color.mix(0.15)).border_style(color.stroke_width(stroke)),
            )?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke)));
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperRight)?;
    Ok(())
}

/// Grouped bars of selected percentiles per scenario.
pub fn percentiles(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let rows: Vec<(usize, &str, Vec<f64>)> = data
        .series()
        .iter()
        .enumerate()
        .filter_map(|(i, s)| {
            let ordered = sorted(&s.values());
            let values = PERCENTILES
                .iter()
                .map(|p| quantile_sorted(&ordered, *p as f64 / 100.0))
                .collect::<Option<Vec<_>>>()?;
            Some((i, s.scenario.as_str(), values))
        })
        .collect();
    let Some((_, hi)) = bounds(rows.iter().flat_map(|r| r.2.iter().copied())) else {
        return no_data(canvas, style, title);
    };

    let labels: Vec<String> = PERCENTILES.iter().map(|p| format!("P{p}")).collect();
    let mut chart = cartesian(canvas, style, title, category_range(labels.len()), padded(0.0, hi, true))?;
    category_mesh(&mut chart, style, &labels, "Percentile", "Duration (minutes)")?;

    let width = 0.8 / rows.len() as f64;
    for (k, (i, name, values)) in rows.iter().enumerate() {
        let color = style.color(name, *i);
        let offset = -0.4 + width * k as f64;
        chart
            .draw_series(values.iter().enumerate().map(|(p, v)| {
                let x = p as f64 + offset;
                Rectangle::new([(x, 0.0), (x + width, *v)], color.mix(0.75).filled())
            }))?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperLeft)?;
    Ok(())
}

/// Per-scenario scatter over the day sequence with a least-squares trend.
pub fn scatter_trend(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let series: Vec<_> = data.series().iter().enumerate().filter(|(_, s)| !s.is_empty()).collect();
    if series.is_empty() {
        return no_data(canvas, style, title);
    }

    let areas = panels(canvas, style, title, series.len())?;
    let radius = style.px_u32(3.0);
    let stroke = style.stroke();
    for (area, (i, s)) in areas.iter().zip(series) {
        let points: Vec<(f64, f64)> = s.values().into_iter().enumerate().map(|(x, y)| (x as f64, y)).collect();
        let Some((lo, hi)) = bounds(points.iter().map(|p| p.1)) else {
            continue;
        };
        let color = style.color(&s.scenario, i);
        let x_range = -0.5..points.len() as f64 - 0.5;

        let mut chart = panel_chart(area, style, &s.scenario, x_range.clone(), padded(lo, hi, false))?;
        value_mesh(&mut chart, style, "Day (sequence)", "Minutes")?;
        chart.draw_series(points.iter().map(|p| Circle::new(*p, radius, color.mix(0.6).filled())))?;

        if let Some((slope, intercept)) = linear_fit(&points) {
            let ends = vec![
                (x_range.start, slope * x_range.start + intercept),
                (x_range.end, slope * x_range.end + intercept),
            ];
            chart
                .draw_series(std::iter::once(PathElement::new(ends, RED.stroke_width(stroke))))?
                .label(format!("Trend: {slope:.2}x + {intercept:.1}"))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], RED.stroke_width(stroke)));
            legend(&mut chart, style, SeriesLabelPosition::UpperRight)?;
        }
    }
    Ok(())
}

/// Normal probability plot per scenario with its least-squares reference line.
pub fn normality(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let series: Vec<_> = data.series().iter().enumerate().filter(|(_, s)| !s.is_empty()).collect();
    if series.is_empty() {
        return no_data(canvas, style, title);
    }

    let areas = panels(canvas, style, title, series.len())?;
    let radius = style.px_u32(2.5);
    let stroke = style.stroke();
    for (area, (i, s)) in areas.iter().zip(series) {
        let points = qq_points(&s.values());
        let (Some((x_lo, x_hi)), Some((y_lo, y_hi))) = (
            bounds(points.iter().map(|p| p.0)),
            bounds(points.iter().map(|p| p.1)),
        ) else {
            continue;
        };
        let color = style.color(&s.scenario, i);
        let x_range = padded(x_lo, x_hi, false);

        let mut chart = panel_chart(area, style, &s.scenario, x_range.clone(), padded(y_lo, y_hi, false))?;
        value_mesh(&mut chart, style, "Theoretical quantiles", "Ordered values")?;
        chart.draw_series(points.iter().map(|p| Circle::new(*p, radius, color.filled())))?;

        if let Some((slope, intercept)) = linear_fit(&points) {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![
                    (x_range.start, slope * x_range.start + intercept),
                    (x_range.end, slope * x_range.end + intercept),
                ],
                RED.stroke_width(stroke),
            )))?;
        }
    }
    Ok(())
}
