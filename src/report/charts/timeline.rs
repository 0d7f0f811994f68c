//! Charts with a date axis.

use chrono::NaiveDate;
use plotters::prelude::*;
use std::collections::BTreeMap;

use super::{
    ChartData, DayAxis, bounds, cartesian, date_mesh, legend, no_data, padded, reference_line,
};
use crate::analyzers::types::{RollingPoint, TimeSeries};
use crate::report::style::ChartStyle;
use crate::report::surface::{Canvas, DrawResult};

/// Daily totals as bars, grouped side by side when scenarios share a date.
pub fn daily_bars(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let Some((first, last)) = data.date_span() else {
        return no_data(canvas, style, title);
    };
    let Some((_, hi)) = bounds(data.all_values()) else {
        return no_data(canvas, style, title);
    };

    let axis = DayAxis::new(first, last);
    let mut chart = cartesian(canvas, style, title, axis.range(), padded(0.0, hi, true))?;
    date_mesh(&mut chart, style, &axis, "Duration (minutes)")?;

    let series = data.series();
    let width = 0.9 / series.len().max(1) as f64;
    for (i, s) in series.iter().enumerate() {
        let color = style.color(&s.scenario, i);
        let offset = -0.45 + width * i as f64;
        chart
            .draw_series(s.points.iter().map(|(date, minutes)| {
                let x = axis.x(*date) + offset;
                Rectangle::new([(x, 0.0), (x + width, *minutes)], color.mix(0.75).filled())
            }))?
            .label(s.scenario.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperRight)?;
    Ok(())
}

/// Rolling mean per scenario.
pub fn rolling_mean(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    rolling_line(canvas, style, data, title, "Mean duration (minutes)", |p| p.mean)
}

/// Rolling sample standard deviation per scenario.
pub fn volatility(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    rolling_line(canvas, style, data, title, "Standard deviation (minutes)", |p| p.std)
}

fn rolling_line<F>(
    canvas: &Canvas,
    style: &ChartStyle,
    data: &ChartData,
    title: &str,
    y_desc: &str,
    value: F,
) -> DrawResult
where
    F: Fn(&RollingPoint) -> Option<f64>,
{
    let defined: Vec<(&str, Vec<(NaiveDate, f64)>)> = data
        .series()
        .iter()
        .map(|s| {
            let points = data
                .aggregation
                .rolling_for(&s.scenario)
                .filter_map(|p| value(p).map(|v| (p.date, v)))
                .collect();
            (s.scenario.as_str(), points)
        })
        .collect();

    let Some((first, last)) = data.date_span() else {
        return no_data(canvas, style, title);
    };
    let Some((lo, hi)) = bounds(defined.iter().flat_map(|(_, pts)| pts.iter().map(|(_, v)| *v))) else {
        return no_data(canvas, style, title);
    };

    let axis = DayAxis::new(first, last);
    let mut chart = cartesian(canvas, style, title, axis.range(), padded(lo, hi, true))?;
    date_mesh(&mut chart, style, &axis, y_desc)?;

    let stroke = style.stroke();
    let radius = style.px_u32(2.5);
    for (i, (scenario, points)) in defined.iter().enumerate() {
        if points.is_empty() {
            continue;
        }
        let color = style.color(scenario, i);
        let xy: Vec<(f64, f64)> = points.iter().map(|(d, v)| (axis.x(*d), *v)).collect();
        chart
            .draw_series(LineSeries::new(xy.clone(), color.stroke_width(stroke)))?
            .label(*scenario)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke)));
        chart.draw_series(xy.into_iter().map(|p| Circle::new(p, radius, color.filled())))?;
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperRight)?;
    Ok(())
}

/// Rolling min..max band with the rolling mean on top.
pub fn min_max_band(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let Some((first, last)) = data.date_span() else {
        return no_data(canvas, style, title);
    };
    let extremes = data
        .aggregation
        .rolling
        .iter()
        .flat_map(|p| [p.min, p.max, p.mean])
        .flatten();
    let Some((lo, hi)) = bounds(extremes) else {
        return no_data(canvas, style, title);
    };

    let axis = DayAxis::new(first, last);
    let mut chart = cartesian(canvas, style, title, axis.range(), padded(lo, hi, true))?;
    date_mesh(&mut chart, style, &axis, "Duration (minutes)")?;

    let stroke = style.stroke();
    for (i, s) in data.series().iter().enumerate() {
        let color = style.color(&s.scenario, i);
        let points: Vec<&RollingPoint> = data.aggregation.rolling_for(&s.scenario).collect();

        let band: Vec<(f64, f64, f64)> = points
            .iter()
            .filter_map(|p| Some((axis.x(p.date), p.min?, p.max?)))
            .collect();
        if band.len() > 1 {
            let outline: Vec<(f64, f64)> = band
                .iter()
                .map(|(x, _, max)| (*x, *max))
                .chain(band.iter().rev().map(|(x, min, _)| (*x, *min)))
                .collect();
            chart
                .draw_series(std::iter::once(Polygon::new(outline, color.mix(0.2).filled())))?
                .label(format!("{} (range)", s.scenario))
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.mix(0.2).filled()));
        }

        let means: Vec<(f64, f64)> = points
            .iter()
            .filter_map(|p| Some((axis.x(p.date), p.mean?)))
            .collect();
        if !means.is_empty() {
            chart
                .draw_series(LineSeries::new(means, color.stroke_width(stroke)))?
                .label(format!("{} (mean)", s.scenario))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke)));
        }
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperRight)?;
    Ok(())
}

/// Running total of the daily minutes of `series`, by date.
pub fn running_totals(series: &TimeSeries) -> Vec<(NaiveDate, f64)> {
    let mut acc = 0.0;
    series
        .points
        .iter()
        .map(|(date, minutes)| {
            acc += minutes;
            (*date, acc)
        })
        .collect()
}

/// Cumulative processing minutes per scenario over its own dates.
pub fn cumulative(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let curves: Vec<(usize, &str, Vec<(NaiveDate, f64)>)> = data
        .series()
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_empty())
        .map(|(i, s)| (i, s.scenario.as_str(), running_totals(s)))
        .collect();
    let Some((first, last)) = data.date_span() else {
        return no_data(canvas, style, title);
    };
    let Some((_, hi)) = bounds(curves.iter().flat_map(|(_, _, pts)| pts.iter().map(|(_, v)| *v))) else {
        return no_data(canvas, style, title);
    };

    let axis = DayAxis::new(first, last);
    let mut chart = cartesian(canvas, style, title, axis.range(), padded(0.0, hi, true))?;
    date_mesh(&mut chart, style, &axis, "Cumulative duration (minutes)")?;

    let stroke = style.stroke();
    let radius = style.px_u32(2.0);
    for (i, scenario, points) in &curves {
        let color = style.color(scenario, *i);
        let xy: Vec<(f64, f64)> = points.iter().map(|(d, v)| (axis.x(*d), *v)).collect();
        chart
            .draw_series(LineSeries::new(xy.clone(), color.stroke_width(stroke)))?
            .label(*scenario)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke)));
        chart.draw_series(xy.into_iter().map(|p| Circle::new(p, radius, color.filled())))?;
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperLeft)?;
    Ok(())
}

/// Pivoted daily values stacked on top of each other; missing cells count as zero.
pub fn stacked_area(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let pivot = &data.aggregation.pivot;
    let (Some(first), Some(last)) = (pivot.rows.keys().next(), pivot.rows.keys().next_back()) else {
        return no_data(canvas, style, title);
    };

    // running totals per date, one layer per pivot column
    let mut layers: Vec<Vec<(f64, f64, f64)>> = vec![Vec::new(); pivot.scenarios.len()];
    let axis = DayAxis::new(*first, *last);
    let mut top = 0.0f64;
    for (date, cells) in &pivot.rows {
        let x = axis.x(*date);
        let mut floor = 0.0;
        for (layer, cell) in layers.iter_mut().zip(cells) {
            let ceil = floor + cell.unwrap_or(0.0);
            layer.push((x, floor, ceil));
            floor = ceil;
        }
        top = top.max(floor);
    }

    let mut chart = cartesian(canvas, style, title, axis.range(), padded(0.0, top, true))?;
    date_mesh(&mut chart, style, &axis, "Duration (minutes)")?;

    for (i, (scenario, layer)) in pivot.scenarios.iter().zip(&layers).enumerate() {
        let color = style.color(scenario, i);
        let outline: Vec<(f64, f64)> = layer
            .iter()
            .map(|(x, _, ceil)| (*x, *ceil))
            .chain(layer.iter().rev().map(|(x, floor, _)| (*x, *floor)))
            .collect();
        chart
            .draw_series(std::iter::once(Polygon::new(outline, color.mix(0.7).filled())))?
            .label(scenario.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.mix(0.7).filled()));
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperLeft)?;
    Ok(())
}

/// Running sum of `baseline mean - daily minutes` for every other scenario.
pub fn time_saved(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let Some(base) = data.baseline_stats() else {
        return no_data(canvas, style, title);
    };

    let curves: Vec<(usize, &str, Vec<(NaiveDate, f64)>)> = data
        .series()
        .iter()
        .enumerate()
        .filter(|(_, s)| s.scenario != data.baseline && !s.is_empty())
        .map(|(i, s)| {
            let mut acc = 0.0;
            let points = s
                .points
                .iter()
                .map(|(date, minutes)| {
                    acc += base.mean - minutes;
                    (*date, acc)
                })
                .collect();
            (i, s.scenario.as_str(), points)
        })
        .collect();

    let dates = curves.iter().flat_map(|(_, _, pts)| pts.iter().map(|(d, _)| *d));
    let (Some(first), Some(last)) = (dates.clone().min(), dates.max()) else {
        return no_data(canvas, style, title);
    };
    let Some((lo, hi)) = bounds(curves.iter().flat_map(|(_, _, pts)| pts.iter().map(|(_, v)| *v))) else {
        return no_data(canvas, style, title);
    };

    let axis = DayAxis::new(first, last);
    let x_range = axis.range();
    let mut chart = cartesian(canvas, style, title, x_range.clone(), padded(lo, hi, true))?;
    date_mesh(&mut chart, style, &axis, "Time saved (minutes)")?;
    reference_line(&mut chart, &x_range, 0.0, BLACK.mix(0.5), style.px_u32(1.0))?;

    let stroke = style.stroke();
    let radius = style.px_u32(2.0);
    for (i, scenario, points) in &curves {
        let color = style.color(scenario, *i);
        let xy: Vec<(f64, f64)> = points.iter().map(|(d, v)| (axis.x(*d), *v)).collect();
        chart
            .draw_series(LineSeries::new(xy.clone(), color.stroke_width(stroke)))?
            .label(*scenario)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke)));
        chart.draw_series(xy.into_iter().map(|p| Circle::new(p, radius, color.filled())))?;
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperLeft)?;
    Ok(())
}

/// Daily `baseline / scenario` ratios with the break-even line at 1.0.
pub fn acceleration(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let mut curves: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    let table = &data.aggregation.acceleration;
    for (date, ratios) in &table.rows {
        for (scenario, ratio) in table.scenarios.iter().zip(ratios) {
            if let Some(r) = ratio {
                curves.entry(scenario.as_str()).or_default().push((*date, *r));
            }
        }
    }
    ratio_chart(canvas, style, data, title, curves, "Acceleration (baseline / scenario)")
}

/// Weekly mean acceleration, labelled by week-ending date.
pub fn weekly_acceleration(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let mut curves: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for week in &data.aggregation.weekly {
        if let Some(r) = week.mean_ratio {
            curves.entry(week.scenario.as_str()).or_default().push((week.week_ending, r));
        }
    }
    ratio_chart(canvas, style, data, title, curves, "Mean weekly acceleration")
}

fn ratio_chart(
    canvas: &Canvas,
    style: &ChartStyle,
    data: &ChartData,
    title: &str,
    curves: BTreeMap<&str, Vec<(NaiveDate, f64)>>,
    y_desc: &str,
) -> DrawResult {
    let dates = curves.values().flat_map(|pts| pts.iter().map(|(d, _)| *d));
    let (Some(first), Some(last)) = (dates.clone().min(), dates.max()) else {
        return no_data(canvas, style, title);
    };
    let Some((lo, hi)) = bounds(curves.values().flat_map(|pts| pts.iter().map(|(_, v)| *v)).chain([1.0]))
    else {
        return no_data(canvas, style, title);
    };

    let axis = DayAxis::new(first, last);
    let x_range = axis.range();
    let mut chart = cartesian(canvas, style, title, x_range.clone(), padded(lo, hi, true))?;
    date_mesh(&mut chart, style, &axis, y_desc)?;
    reference_line(&mut chart, &x_range, 1.0, RED.mix(0.6), style.px_u32(1.2))?;

    let stroke = style.stroke();
    let radius = style.px_u32(2.5);
    for (i, s) in data.series().iter().enumerate() {
        let Some(points) = curves.get(s.scenario.as_str()) else {
            continue;
        };
        let color = style.color(&s.scenario, i);
        let xy: Vec<(f64, f64)> = points.iter().map(|(d, v)| (axis.x(*d), *v)).collect();
        chart
            .draw_series(LineSeries::new(xy.clone(), color.stroke_width(stroke)))?
            .label(s.scenario.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke)));
        chart.draw_series(xy.into_iter().map(|p| Circle::new(p, radius, color.filled())))?;
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperLeft)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_totals() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 10, day).unwrap();
        let series = TimeSeries {
            scenario: "a".into(),
            points: vec![(d(1), 120.0), (d(2), 30.5), (d(5), 49.5)],
        };
        assert_eq!(
            running_totals(&series),
            vec![(d(1), 120.0), (d(2), 150.5), (d(5), 200.0)]
        );

        let empty = TimeSeries {
            scenario: "b".into(),
            points: Vec::new(),
        };
        assert!(running_totals(&empty).is_empty());
    }
}
