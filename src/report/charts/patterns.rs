//! Calendar patterns: ISO weeks, weekdays and months.

use chrono::Datelike;
use plotters::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use super::{
    ChartData, bounds, category_label, category_mesh, category_range, cartesian, centered_style, legend,
    no_data, padded,
};
use crate::analyzers::types::TimeSeries;
use crate::analyzers::utility::mean;
use crate::report::style::{ChartStyle, heat_color};
use crate::report::surface::{Canvas, DrawResult};

pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Mean minutes per ISO week (`YYYY-Www`) and scenario column.
pub fn weekly_means(series: &[TimeSeries]) -> BTreeMap<String, Vec<Option<f64>>> {
    let mut cells: BTreeMap<String, Vec<Vec<f64>>> = BTreeMap::new();
    for (col, s) in series.iter().enumerate() {
        for (date, minutes) in &s.points {
            let week = date.iso_week();
            let label = format!("{}-W{:02}", week.year(), week.week());
            cells.entry(label).or_insert_with(|| vec![Vec::new(); series.len()])[col].push(*minutes);
        }
    }
    cells
        .into_iter()
        .map(|(week, cols)| (week, cols.iter().map(|v| mean(v)).collect()))
        .collect()
}

/// Mean minutes per weekday, Monday first.
pub fn weekday_means(series: &TimeSeries) -> [Option<f64>; 7] {
    let mut buckets: [Vec<f64>; 7] = Default::default();
    for (date, minutes) in &series.points {
        buckets[date.weekday().num_days_from_monday() as usize].push(*minutes);
    }
    buckets.map(|b| mean(&b))
}

/// Total minutes per `(year, month)`.
pub fn monthly_totals(series: &TimeSeries) -> BTreeMap<(i32, u32), f64> {
    let mut totals = BTreeMap::new();
    for (date, minutes) in &series.points {
        *totals.entry((date.year(), date.month())).or_insert(0.0) += minutes;
    }
    totals
}

/// Scenario × ISO-week grid coloured by mean daily minutes.
pub fn weekly_heatmap(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let series = data.series();
    let weeks = weekly_means(series);
    let Some((lo, hi)) = bounds(weeks.values().flatten().flatten().copied()) else {
        return no_data(canvas, style, title);
    };

    let names: Vec<&str> = series.iter().map(|s| s.scenario.as_str()).collect();
    let labels: Vec<&str> = weeks.keys().map(String::as_str).collect();
    let rows = labels.len();

    let mut chart = cartesian(canvas, style, title, category_range(names.len()), category_range(rows))?;
    // first week on top
    let row_label = |y: &f64| {
        let flipped = (rows as f64 - 1.0) - *y;
        category_label(&labels, flipped)
    };
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(names.len() * 2 + 2)
        .y_labels(rows * 2 + 2)
        .x_label_formatter(&|x: &f64| category_label(&names, *x))
        .y_label_formatter(&row_label)
        .x_desc("Scenario")
        .y_desc("Week")
        .label_style(style.small_font())
        .axis_desc_style(style.label_font())
        .draw()?;

    let span = hi - lo;
    for (r, cols) in weeks.values().enumerate() {
        let y = (rows - 1 - r) as f64;
        for (c, cell) in cols.iter().enumerate() {
            let x = c as f64;
            let fill = match cell {
                Some(v) if span > 0.0 => heat_color((v - lo) / span),
                Some(_) => heat_color(0.5),
                None => RGBColor(235, 235, 235),
            };
            chart.draw_series([
                Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], fill.filled()),
                Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], WHITE.stroke_width(2)),
            ])?;
            if let Some(v) = cell {
                chart.draw_series(std::iter::once(Text::new(
                    format!("{v:.0}"),
                    (x, y),
                    centered_style(style),
                )))?;
            }
        }
    }
    Ok(())
}

/// Mean minutes per weekday per scenario.
pub fn day_of_week(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let lines: Vec<(usize, &str, Vec<(f64, f64)>)> = data
        .series()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let points = weekday_means(s)
                .iter()
                .enumerate()
                .filter_map(|(d, v)| v.map(|v| (d as f64, v)))
                .collect();
            (i, s.scenario.as_str(), points)
        })
        .collect();
    let Some((lo, hi)) = bounds(lines.iter().flat_map(|l| l.2.iter().map(|p| p.1))) else {
        return no_data(canvas, style, title);
    };

    let mut chart = cartesian(canvas, style, title, category_range(WEEKDAYS.len()), padded(lo, hi, true))?;
    category_mesh(&mut chart, style, &WEEKDAYS, "Day of week", "Mean duration (minutes)")?;

    let stroke = style.stroke();
    let radius = style.px_u32(3.5);
    for (i, name, points) in lines {
        if points.is_empty() {
            continue;
        }
        let color = style.color(name, i);
        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(stroke)))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke)));
        chart.draw_series(points.into_iter().map(|p| Circle::new(p, radius, color.filled())))?;
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperRight)?;
    Ok(())
}

/// Grouped bars of total minutes per calendar month.
pub fn monthly(canvas: &Canvas, style: &ChartStyle, data: &ChartData, title: &str) -> DrawResult {
    let totals: Vec<BTreeMap<(i32, u32), f64>> = data.series().iter().map(monthly_totals).collect();
    let months: Vec<(i32, u32)> = totals
        .iter()
        .flat_map(|t| t.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let Some((_, hi)) = bounds(totals.iter().flat_map(|t| t.values().copied())) else {
        return no_data(canvas, style, title);
    };

    let labels: Vec<String> = months.iter().map(|(y, m)| format!("{y}-{m:02}")).collect();
    let mut chart = cartesian(canvas, style, title, category_range(labels.len()), padded(0.0, hi, true))?;
    category_mesh(&mut chart, style, &labels, "Month", "Total duration (minutes)")?;

    let width = 0.8 / totals.len().max(1) as f64;
    for (i, (s, per_month)) in data.series().iter().zip(&totals).enumerate() {
        let color = style.color(&s.scenario, i);
        let offset = -0.4 + width * i as f64;
        chart
            .draw_series(months.iter().enumerate().map(|(k, month)| {
                let x = k as f64 + offset;
                let v = per_month.get(month).copied().unwrap_or(0.0);
                Rectangle::new([(x, 0.0), (x + width, v)], color.mix(0.75).filled())
            }))?
            .label(s.scenario.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    legend(&mut chart, style, SeriesLabelPosition::UpperLeft)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn series(name: &str, points: &[(NaiveDate, f64)]) -> TimeSeries {
        TimeSeries {
            scenario: name.to_string(),
            points: points.to_vec(),
        }
    }

    #[test]
    fn test_weekly_means_by_iso_week() {
        let a = series("a", &[(d(10, 6), 10.0), (d(10, 12), 20.0), (d(10, 13), 7.0)]);
        let b = series("b", &[(d(10, 14), 3.0)]);
        let weeks = weekly_means(&[a, b]);

        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks["2025-W41"], vec![Some(15.0), None]);
        assert_eq!(weeks["2025-W42"], vec![Some(7.0), Some(3.0)]);
    }

    #[test]
    fn test_weekday_means() {
        // 2025-10-06 is a Monday
        let s = series("a", &[(d(10, 6), 10.0), (d(10, 13), 20.0), (d(10, 12), 5.0)]);
        let means = weekday_means(&s);
        assert_eq!(means[0], Some(15.0));
        assert_eq!(means[6], Some(5.0));
        assert_eq!(means[2], None);
    }

    #[test]
    fn test_monthly_totals_in_calendar_order() {
        let s = series("a", &[(d(9, 30), 1.0), (d(10, 1), 2.0), (d(10, 31), 3.0)]);
        let totals: Vec<_> = monthly_totals(&s).into_iter().collect();
        assert_eq!(totals, vec![((2025, 9), 1.0), ((2025, 10), 5.0)]);
    }
}
