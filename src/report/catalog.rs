//! The fixed chart catalog, in report order.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::report::charts::{ChartData, comparison, distribution, patterns, timeline};
use crate::report::style::ChartStyle;
use crate::report::surface::{Canvas, DrawResult, with_surface};

/// Document section a chart is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    Trends,
    Distributions,
    Patterns,
    Stability,
    Composition,
    Summary,
    Improvement,
    Acceleration,
}

impl Section {
    pub fn heading(self) -> &'static str {
        match self {
            Section::Trends => "Time series and trends",
            Section::Distributions => "Distributions and densities",
            Section::Patterns => "Calendar patterns",
            Section::Stability => "Volatility and stability",
            Section::Composition => "Cumulative and multi-metric views",
            Section::Summary => "Summary comparisons",
            Section::Improvement => "Improvement metrics",
            Section::Acceleration => "Acceleration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    DailyBars,
    RollingMean,
    Cumulative,
    BoxPlot,
    Violin,
    Histograms,
    Density,
    Percentiles,
    WeeklyHeatmap,
    DayOfWeek,
    MonthlyTotals,
    Volatility,
    ScatterTrend,
    Normality,
    StackedArea,
    Radar,
    SummaryBars,
    MinMaxBand,
    Improvement,
    TimeSaved,
    Acceleration,
    WeeklyAcceleration,
}

type Renderer = fn(&Canvas, &ChartStyle, &ChartData, &str) -> DrawResult;

impl ChartKind {
    pub const ALL: [ChartKind; 22] = [
        ChartKind::DailyBars,
        ChartKind::RollingMean,
        ChartKind::Cumulative,
        ChartKind::BoxPlot,
        ChartKind::Violin,
        ChartKind::Histograms,
        ChartKind::Density,
        ChartKind::Percentiles,
        ChartKind::WeeklyHeatmap,
        ChartKind::DayOfWeek,
        ChartKind::MonthlyTotals,
        ChartKind::Volatility,
        ChartKind::ScatterTrend,
        ChartKind::Normality,
        ChartKind::StackedArea,
        ChartKind::Radar,
        ChartKind::SummaryBars,
        ChartKind::MinMaxBand,
        ChartKind::Improvement,
        ChartKind::TimeSaved,
        ChartKind::Acceleration,
        ChartKind::WeeklyAcceleration,
    ];

    /// One-based position in the catalog.
    pub fn number(self) -> usize {
        ChartKind::ALL
            .iter()
            .position(|k| *k == self)
            .map_or(0, |i| i + 1)
    }

    pub fn slug(self) -> &'static str {
        match self {
            ChartKind::DailyBars => "daily_bars",
            ChartKind::RollingMean => "rolling_mean",
            ChartKind::Cumulative => "cumulative",
            ChartKind::BoxPlot => "box_plot",
            ChartKind::Violin => "violin",
            ChartKind::Histograms => "histograms",
            ChartKind::Density => "density",
            ChartKind::Percentiles => "percentiles",
            ChartKind::WeeklyHeatmap => "weekly_heatmap",
            ChartKind::DayOfWeek => "day_of_week",
            ChartKind::MonthlyTotals => "monthly_totals",
            ChartKind::Volatility => "volatility",
            ChartKind::ScatterTrend => "scatter_trend",
            ChartKind::Normality => "qq_plot",
            ChartKind::StackedArea => "stacked_area",
            ChartKind::Radar => "radar",
            ChartKind::SummaryBars => "summary_bars",
            ChartKind::MinMaxBand => "min_max_band",
            ChartKind::Improvement => "improvement",
            ChartKind::TimeSaved => "time_saved",
            ChartKind::Acceleration => "acceleration",
            ChartKind::WeeklyAcceleration => "weekly_acceleration",
        }
    }

    /// `NN_slug.png`.
    pub fn file_name(self) -> String {
        format!("{:02}_{}.png", self.number(), self.slug())
    }

    pub fn title(self, baseline: &str) -> String {
        let name = match self {
            ChartKind::DailyBars => "Daily processing time".to_string(),
            ChartKind::RollingMean => "Rolling mean".to_string(),
            ChartKind::Cumulative => "Cumulative processing time".to_string(),
            ChartKind::BoxPlot => "Distribution (box plot)".to_string(),
            ChartKind::Violin => "Distribution density (violin plot)".to_string(),
            ChartKind::Histograms => "Histograms by scenario".to_string(),
            ChartKind::Density => "Kernel density estimate".to_string(),
            ChartKind::Percentiles => "Percentile comparison".to_string(),
            ChartKind::WeeklyHeatmap => "Weekly heat map".to_string(),
            ChartKind::DayOfWeek => "Mean duration by day of week".to_string(),
            ChartKind::MonthlyTotals => "Total time by month".to_string(),
            ChartKind::Volatility => "Processing time volatility".to_string(),
            ChartKind::ScatterTrend => "Scatter with linear trend".to_string(),
            ChartKind::Normality => "Q-Q plot against the normal distribution".to_string(),
            ChartKind::StackedArea => "Stacked area".to_string(),
            ChartKind::Radar => "Multi-metric radar".to_string(),
            ChartKind::SummaryBars => "Summary statistics".to_string(),
            ChartKind::MinMaxBand => "Rolling min-max range with mean".to_string(),
            ChartKind::Improvement => format!("Improvement over \"{baseline}\""),
            ChartKind::TimeSaved => format!("Cumulative time saved vs \"{baseline}\""),
            ChartKind::Acceleration => format!("Daily acceleration vs \"{baseline}\""),
            ChartKind::WeeklyAcceleration => format!("Weekly acceleration vs \"{baseline}\""),
        };
        format!("Chart {}: {}", self.number(), name)
    }

    pub fn caption(self) -> &'static str {
        match self {
            ChartKind::DailyBars => "Total processing minutes of every day, coloured by scenario.",
            ChartKind::RollingMean => "The rolling mean smooths out short-term day-to-day swings.",
            ChartKind::Cumulative => "Running total of processing minutes within each scenario.",
            ChartKind::BoxPlot => "Quartiles, median, mean and outliers of the daily totals.",
            ChartKind::Violin => "Full shape of each scenario's distribution of daily totals.",
            ChartKind::Histograms => "Histograms of daily totals with the mean and median marked.",
            ChartKind::Density => "Continuous density estimate of daily totals per scenario.",
            ChartKind::Percentiles => "Key percentiles of daily totals compared across scenarios.",
            ChartKind::WeeklyHeatmap => "Mean daily minutes per ISO week reveals weekly patterns.",
            ChartKind::DayOfWeek => "Mean daily minutes per weekday shows weekly cyclicity.",
            ChartKind::MonthlyTotals => "Total processing minutes per calendar month.",
            ChartKind::Volatility => "Rolling standard deviation of daily totals.",
            ChartKind::ScatterTrend => "Daily totals in sequence with a least-squares trend line.",
            ChartKind::Normality => "Ordered daily totals against normal quantiles.",
            ChartKind::StackedArea => "Daily totals stacked to show each scenario's contribution.",
            ChartKind::Radar => "Mean, median, max, min, std and range relative to all days.",
            ChartKind::SummaryBars => "Mean, median and standard deviation side by side.",
            ChartKind::MinMaxBand => "Rolling minimum to maximum band with the rolling mean.",
            ChartKind::Improvement => "Reduction of mean daily minutes relative to the baseline.",
            ChartKind::TimeSaved => "Running total of minutes saved against the baseline mean.",
            ChartKind::Acceleration => "Baseline minutes divided by scenario minutes on shared dates.",
            ChartKind::WeeklyAcceleration => "Mean acceleration per Monday-to-Sunday week.",
        }
    }

    pub fn section(self) -> Section {
        match self {
            ChartKind::DailyBars | ChartKind::RollingMean | ChartKind::Cumulative => {
                Section::Trends
            }
            ChartKind::BoxPlot
            | ChartKind::Violin
            | ChartKind::Histograms
            | ChartKind::Density
            | ChartKind::Percentiles => Section::Distributions,
            ChartKind::WeeklyHeatmap | ChartKind::DayOfWeek | ChartKind::MonthlyTotals => {
                Section::Patterns
            }
            ChartKind::Volatility | ChartKind::ScatterTrend | ChartKind::Normality => {
                Section::Stability
            }
            ChartKind::StackedArea | ChartKind::Radar => Section::Composition,
            ChartKind::SummaryBars | ChartKind::MinMaxBand => Section::Summary,
            ChartKind::Improvement | ChartKind::TimeSaved => Section::Improvement,
            ChartKind::Acceleration | ChartKind::WeeklyAcceleration => Section::Acceleration,
        }
    }

    /// Figure size in inches.
    pub fn inches(self) -> (f64, f64) {
        match self {
            ChartKind::BoxPlot | ChartKind::Violin | ChartKind::Improvement => (10.0, 6.0),
            ChartKind::Histograms | ChartKind::ScatterTrend | ChartKind::Normality => (15.0, 5.0),
            ChartKind::Density
            | ChartKind::Percentiles
            | ChartKind::DayOfWeek
            | ChartKind::MonthlyTotals
            | ChartKind::SummaryBars => (12.0, 6.0),
            ChartKind::WeeklyHeatmap => (10.0, 8.0),
            ChartKind::Radar => (10.0, 10.0),
            _ => (14.0, 6.0),
        }
    }

    fn renderer(self) -> Renderer {
        match self {
            ChartKind::DailyBars => timeline::daily_bars,
            ChartKind::RollingMean => timeline::rolling_mean,
            ChartKind::Cumulative => timeline::cumulative,
            ChartKind::BoxPlot => distribution::box_plot,
            ChartKind::Violin => distribution::violin,
            ChartKind::Histograms => distribution::histograms,
            ChartKind::Density => distribution::density,
            ChartKind::Percentiles => distribution::percentiles,
            ChartKind::WeeklyHeatmap => patterns::weekly_heatmap,
            ChartKind::DayOfWeek => patterns::day_of_week,
            ChartKind::MonthlyTotals => patterns::monthly,
            ChartKind::Volatility => timeline::volatility,
            ChartKind::ScatterTrend => distribution::scatter_trend,
            ChartKind::Normality => distribution::normality,
            ChartKind::StackedArea => timeline::stacked_area,
            ChartKind::Radar => comparison::radar,
            ChartKind::SummaryBars => comparison::summary_bars,
            ChartKind::MinMaxBand => timeline::min_max_band,
            ChartKind::Improvement => comparison::improvement,
            ChartKind::TimeSaved => timeline::time_saved,
            ChartKind::Acceleration => timeline::acceleration,
            ChartKind::WeeklyAcceleration => timeline::weekly_acceleration,
        }
    }

    /// Renders this chart into `dir` and returns the image path.
    pub fn render(self, dir: &Path, style: &ChartStyle, data: &ChartData) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        let (w, h) = self.inches();
        let title = self.title(data.baseline);
        let draw = self.renderer();

        with_surface(&path, style.figure(w, h), self.slug(), |canvas| {
            draw(canvas, style, data, &title)
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_and_names() {
        assert_eq!(ChartKind::ALL.len(), 22);
        assert_eq!(ChartKind::DailyBars.file_name(), "01_daily_bars.png");
        assert_eq!(ChartKind::Cumulative.file_name(), "03_cumulative.png");
        assert_eq!(ChartKind::TimeSaved.file_name(), "20_time_saved.png");
        assert_eq!(
            ChartKind::WeeklyAcceleration.file_name(),
            "22_weekly_acceleration.png"
        );
        for (i, kind) in ChartKind::ALL.iter().enumerate() {
            assert_eq!(kind.number(), i + 1);
        }
    }

    #[test]
    fn test_sections_are_contiguous() {
        let sections: Vec<Section> = ChartKind::ALL.iter().map(|k| k.section()).collect();
        assert!(sections.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_titles_name_the_baseline() {
        assert_eq!(
            ChartKind::Improvement.title("Типовой"),
            "Chart 19: Improvement over \"Типовой\""
        );
        assert_eq!(ChartKind::BoxPlot.title("x"), "Chart 4: Distribution (box plot)");
    }
}
