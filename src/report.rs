use std::fmt::{self, Write};

use crate::aggregate::{Chart, YearRange};
use crate::interaction::Summary;
use crate::models::{AggregateSummary, CategoryCount, PointDetail, SeriesStats, MONTH_LABELS};
use crate::state::Frame;
use crate::zoom::nice_y_max;

/// Groups digits in threes: `28407` → `28,407`.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn write_categories(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    categories: &[CategoryCount],
) -> fmt::Result {
    writeln!(f, "Top {} {title}", categories.len())?;
    for category in categories {
        writeln!(f, "  {}: {}", category.name, format_count(category.count))?;
    }
    Ok(())
}

impl fmt::Display for SeriesStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.key)?;
        writeln!(f, "Total collisions: {}", format_count(self.total))?;
        writeln!(f, "Avg/month: {}", format_count(self.average_per_month))?;
        writeln!(
            f,
            "Peak: {} ({})",
            self.peak.month_name,
            format_count(self.peak.count)
        )?;
        write_categories(f, "Contributing Factors", &self.top_factors)?;
        write_categories(f, "Vehicle Types", &self.top_vehicles)
    }
}

impl fmt::Display for AggregateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} total (all series)", format_count(self.grand_total))?;
        for (key, total) in &self.per_series {
            writeln!(f, "  {key}: {}", format_count(*total))?;
        }
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Series(stats) => write!(f, "{stats}"),
            Summary::Aggregate(summary) => write!(f, "{summary}"),
        }
    }
}

impl fmt::Display for PointDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} / {}: {} collisions",
            self.key,
            self.month_name,
            format_count(self.count)
        )?;
        writeln!(f, "  Most common vehicle: {}", self.dominant_vehicle)?;
        writeln!(f, "  Most common factor: {}", self.dominant_factor)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opacities: Vec<String> = self
            .highlight
            .opacities
            .iter()
            .map(|(key, opacity)| format!("{key}={opacity:.2}"))
            .collect();
        writeln!(f, "opacity: {}", opacities.join(", "))?;
        writeln!(f, "zoom: {} (y max {:.0})", self.zoom_label, self.y_max)?;
        if let Some(tooltip) = &self.tooltip {
            write!(f, "{tooltip}")?;
        }
        write!(f, "{}", self.highlight.summary)
    }
}

/// Plain-text matrix: one row per series, one column per month.
pub fn series_table(chart: &Chart) -> String {
    let mut output = String::new();
    let key_width = chart
        .series
        .iter()
        .map(|series| series.key.to_string().len())
        .chain(std::iter::once(chart.dimension.label().len()))
        .max()
        .unwrap_or(0);

    let _ = write!(output, "{:<key_width$}", chart.dimension.label());
    for label in MONTH_LABELS {
        let _ = write!(output, " {label:>7}");
    }
    let _ = writeln!(output, " {:>9}", "Total");

    for series in &chart.series {
        let _ = write!(output, "{:<key_width$}", series.key.to_string());
        for point in &series.values {
            let _ = write!(output, " {:>7}", point.count);
        }
        let _ = writeln!(output, " {:>9}", series.total());
    }

    output
}

pub fn build_report(chart: &Chart, years: &YearRange, source: &str) -> String {
    let mut output = String::new();
    let summary = chart.summary();

    let _ = writeln!(output, "# NYC Motor Vehicle Collisions by Month");
    let _ = writeln!(
        output,
        "Series by {} for {}–{} (source: {})",
        chart.dimension.label().to_lowercase(),
        years.first,
        years.last,
        source
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Total collisions: {} · y-axis ceiling {}",
        format_count(summary.grand_total),
        format_count(nice_y_max(chart.max_count()))
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Counts");

    if chart.series.is_empty() {
        let _ = writeln!(output, "No collisions recorded for this window.");
    } else {
        let _ = write!(output, "| {} |", chart.dimension.label());
        for label in MONTH_LABELS {
            let _ = write!(output, " {label} |");
        }
        let _ = writeln!(output, " Total |");
        let _ = writeln!(output, "|---{}|---|", "|---".repeat(MONTH_LABELS.len()));
        for series in &chart.series {
            let _ = write!(output, "| {} |", series.key);
            for point in &series.values {
                let _ = write!(output, " {} |", point.count);
            }
            let _ = writeln!(output, " {} |", series.total());
        }
    }

    for stats in chart.all_stats() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", stats.key);
        let _ = writeln!(output, "- Total collisions: {}", format_count(stats.total));
        let _ = writeln!(
            output,
            "- Avg/month: {}; peak {} ({})",
            format_count(stats.average_per_month),
            stats.peak.month_name,
            format_count(stats.peak.count)
        );
        let _ = writeln!(output, "- Top contributing factors:");
        for factor in &stats.top_factors {
            let _ = writeln!(output, "  - {}: {}", factor.name, format_count(factor.count));
        }
        let _ = writeln!(output, "- Top vehicle types:");
        for vehicle in &stats.top_vehicles {
            let _ = writeln!(output, "  - {}: {}", vehicle.name, format_count(vehicle.count));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, AggregateOptions};
    use crate::models::RawRow;

    fn chart() -> Chart {
        let rows: Vec<RawRow> = [("01/05/2020", "Sedan"), ("02/11/2020", "Taxi")]
            .iter()
            .map(|(date, vehicle)| {
                [
                    ("CRASH DATE", *date),
                    ("VEHICLE TYPE CODE 1", *vehicle),
                    ("CONTRIBUTING FACTOR VEHICLE 1", "Unsafe Speed"),
                ]
                .iter()
                .map(|(column, value)| (column.to_string(), value.to_string()))
                .collect()
            })
            .collect();
        aggregate(&rows, &AggregateOptions::default())
    }

    #[test]
    fn counts_are_grouped_by_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(28407), "28,407");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn table_has_a_row_per_series() {
        let table = series_table(&chart());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Year"));
        assert!(lines[1].starts_with("2020"));
        assert!(lines[1].trim_end().ends_with(" 2"));
    }

    #[test]
    fn series_summary_lists_top_categories() {
        let chart = chart();
        let text = chart
            .stats(&crate::models::SeriesKey::Year(2020))
            .unwrap()
            .to_string();
        assert!(text.contains("Total collisions: 2"));
        assert!(text.contains("Peak: Jan (1)"));
        assert!(text.contains("Top 1 Contributing Factors"));
        assert!(text.contains("  Unsafe Speed: 2"));
        assert!(text.contains("  Sedan: 1"));
    }

    #[test]
    fn report_covers_every_series() {
        let chart = chart();
        let report = build_report(&chart, &YearRange::default(), "sample.csv");
        assert!(report.starts_with("# NYC Motor Vehicle Collisions by Month"));
        assert!(report.contains("| 2020 | 1 | 1 | 0 |"));
        for year in 2020..=2024 {
            assert!(report.contains(&format!("## {year}")));
        }
        assert!(report.contains("Total collisions: 2 · y-axis ceiling 2"));
    }
}
