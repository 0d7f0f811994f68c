//! Markdown report assembly.
//!
//! The document is derived entirely from computed data: summary statistics,
//! the scenario series and the charts rendered for this run.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use crate::analyzers::types::{AccelerationTable, TimeSeries};
use crate::analyzers::utility::mean;
use crate::report::catalog::{ChartKind, Section};
use crate::stats::SummaryStatistics;

/// A rendered chart, referenced relative to the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub kind: ChartKind,
    pub path: String,
    pub title: String,
}

/// Inputs of one report document.
#[derive(Debug, Clone)]
pub struct ReportDocument<'a> {
    pub generated: NaiveDateTime,
    pub baseline: &'a str,
    pub series: &'a [TimeSeries],
    pub summary: &'a [SummaryStatistics],
    pub acceleration: &'a AccelerationTable,
    pub descriptions: BTreeMap<String, String>,
    pub figures: Vec<Figure>,
}

impl ReportDocument<'_> {
    fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.series.iter().filter_map(TimeSeries::first_date).min()?;
        let last = self.series.iter().filter_map(TimeSeries::last_date).max()?;
        Some((first, last))
    }

    fn compared(&self) -> impl Iterator<Item = &SummaryStatistics> {
        self.summary.iter().filter(|s| s.is_compared())
    }
}

/// Generates the complete Markdown report.
pub fn generate_markdown_report(doc: &ReportDocument) -> String {
    let mut output = String::new();

    output.push_str("# Processing Performance After DU Import\n\n");
    output.push_str(&format!(
        "Comparative analysis of {} scenarios, {} charts.\n\n",
        doc.summary.len(),
        doc.figures.len()
    ));

    output.push_str(&generate_metadata_section(doc));
    output.push_str(&generate_table_of_contents(doc));
    output.push_str(&generate_summary_section(doc));
    output.push_str(&generate_scenarios_section(doc));
    output.push_str(&generate_charts_section(&doc.figures));
    output.push_str(&generate_statistics_section(doc.summary));
    output.push_str(&generate_conclusions_section(doc));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(doc: &ReportDocument) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Report date:** {}\n",
        doc.generated.format("%Y-%m-%d %H:%M")
    ));
    if let Some((first, last)) = doc.period() {
        section.push_str(&format!("- **Period:** {} to {}\n", first, last));
    }
    let days: usize = doc.summary.iter().map(|s| s.count).sum();
    section.push_str(&format!("- **Days analysed:** {}\n", days));
    section.push_str(&format!("- **Scenarios:** {}\n", doc.summary.len()));
    section.push_str(&format!("- **Baseline:** {}\n", doc.baseline));
    section.push('\n');

    section
}

fn generate_table_of_contents(doc: &ReportDocument) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("1. [Executive Summary](#1-executive-summary)\n");
    toc.push_str("2. [Scenarios](#2-scenarios)\n");
    toc.push_str("3. [Visual Analysis](#3-visual-analysis)\n");
    for (n, section) in sections(&doc.figures).iter().enumerate() {
        let heading = format!("3.{} {}", n + 1, section.heading());
        toc.push_str(&format!("   - [{}](#{})\n", heading, anchor(&heading)));
    }
    toc.push_str("4. [Detailed Statistics](#4-detailed-statistics)\n");
    toc.push_str("5. [Conclusions](#5-conclusions)\n\n");

    toc
}

fn generate_summary_section(doc: &ReportDocument) -> String {
    let mut section = String::new();

    section.push_str("## 1. Executive Summary\n\n");
    section.push_str(&format!(
        "Daily processing time of {} scenarios is compared against the baseline \"{}\".\n\n",
        doc.summary.len(),
        doc.baseline
    ));

    let compared: Vec<&SummaryStatistics> = doc.compared().collect();
    if compared.is_empty() {
        section.push_str("No scenario could be compared with the baseline.\n\n");
        return section;
    }

    section.push_str("**Key results:**\n\n");
    for s in compared {
        section.push_str(&format!("- **{}**\n", s.scenario));
        section.push_str(&format!("  - Mean: {:.1} min/day\n", s.mean));
        section.push_str(&format!(
            "  - Improvement: {}\n",
            format_pct(s.improvement_pct)
        ));
        section.push_str(&format!(
            "  - Time saved: {} minutes over the period\n",
            format_number(s.time_saved, 0)
        ));
    }
    section.push('\n');

    section
}

fn generate_scenarios_section(doc: &ReportDocument) -> String {
    let mut section = String::new();

    section.push_str("## 2. Scenarios\n\n");
    for s in doc.series {
        section.push_str(&format!("### {}\n\n", s.scenario));
        if let (Some(first), Some(last)) = (s.first_date(), s.last_date()) {
            section.push_str(&format!("- **Period:** {} to {}\n", first, last));
        }
        section.push_str(&format!("- **Days:** {}\n", s.len()));
        if let Some(m) = mean(&s.values()) {
            section.push_str(&format!("- **Mean:** {:.1} min/day\n", m));
        }
        if s.scenario == doc.baseline {
            section.push_str("- **Role:** baseline\n");
        }
        section.push('\n');
        if let Some(description) = doc.descriptions.get(&s.scenario) {
            section.push_str(description);
            section.push_str("\n\n");
        }
    }

    section
}

fn generate_charts_section(figures: &[Figure]) -> String {
    let mut section = String::new();

    section.push_str("## 3. Visual Analysis\n\n");
    for (n, current) in sections(figures).iter().enumerate() {
        section.push_str(&format!("### 3.{} {}\n\n", n + 1, current.heading()));
        for figure in figures.iter().filter(|f| f.kind.section() == *current) {
            section.push_str(&format!("#### {}\n\n", figure.title));
            section.push_str(&format!("![{}]({})\n\n", figure.title, figure.path));
            section.push_str(&format!("*{}*\n\n", figure.kind.caption()));
        }
    }

    section
}

fn generate_statistics_section(summary: &[SummaryStatistics]) -> String {
    let mut section = String::new();

    section.push_str("## 4. Detailed Statistics\n\n");
    section.push_str(
        "| Scenario | Days | Mean | Median | Min | Max | Q25 | Q75 | Std | Improvement | Time saved |\n",
    );
    section.push_str("|:---|---:|---:|---:|---:|---:|---:|---:|---:|---:|---:|\n");
    for s in summary {
        section.push_str(&format!(
            "| {} | {} | {:.1} | {:.1} | {:.0} | {:.0} | {:.1} | {:.1} | {} | {} | {} |\n",
            s.scenario,
            s.count,
            s.mean,
            s.median,
            s.min,
            s.max,
            s.q25,
            s.q75,
            format_number(s.std, 1),
            format_pct(s.improvement_pct),
            format_number(s.time_saved, 0),
        ));
    }
    section.push('\n');

    section
}

fn generate_conclusions_section(doc: &ReportDocument) -> String {
    let mut section = String::new();

    section.push_str("## 5. Conclusions\n\n");

    for s in doc.compared() {
        if let (Some(verdict), Some(pct)) = (s.verdict, s.improvement_pct) {
            section.push_str(&format!(
                "- **{}**: {} ({} vs \"{}\", {} minutes saved).\n",
                s.scenario,
                verdict,
                format_pct(Some(pct)),
                doc.baseline,
                format_number(s.time_saved, 0)
            ));
        }
    }

    if let Some(fastest) = doc
        .summary
        .iter()
        .min_by(|a, b| a.mean.total_cmp(&b.mean))
    {
        section.push_str(&format!(
            "- Lowest mean daily time: **{}** ({:.1} min/day).\n",
            fastest.scenario, fastest.mean
        ));
    }

    let stable = doc
        .summary
        .iter()
        .filter_map(|s| s.std.map(|std| (s, std)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((s, std)) = stable {
        section.push_str(&format!(
            "- Most stable scenario: **{}** (standard deviation {:.1} min).\n",
            s.scenario, std
        ));
    }

    let samples = doc.acceleration.samples();
    if samples.is_empty() {
        section.push_str("- No date has both baseline and scenario data, so no acceleration ratio is available.\n");
    } else {
        for scenario in &doc.acceleration.scenarios {
            let ratios: Vec<f64> = samples
                .iter()
                .filter(|a| &a.scenario == scenario)
                .map(|a| a.ratio)
                .collect();
            if let Some(m) = mean(&ratios) {
                section.push_str(&format!(
                    "- **{}** runs {:.2}x as fast as the baseline on average over {} shared days.\n",
                    scenario,
                    m,
                    ratios.len()
                ));
            }
        }
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Generated by du_speed v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Sections that have at least one figure, in catalog order.
fn sections(figures: &[Figure]) -> Vec<Section> {
    let mut out: Vec<Section> = figures.iter().map(|f| f.kind.section()).collect();
    out.sort();
    out.dedup();
    out
}

/// GitHub-style heading anchor.
fn anchor(heading: &str) -> String {
    heading
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

fn format_number(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.*}", precision, v))
}

fn format_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:+.1}%", v))
}
