//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use estimator_lib::estimator::{CostField, RangeDiff};
use estimator_lib::{Cost, CostDiff, CostRange};
use std::path::Path;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

const UP_ARROW: &str = "&#8593;";
const DOWN_ARROW: &str = "&#8595;";

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// Markdown, e.g. for a merge request comment
    Markdown,
    /// JSON format
    Json,
}

/// Row of the per-kind cost table
#[derive(Tabled)]
struct CostRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "MIN REQUESTED (USD)")]
    min_requested: String,
    #[tabled(rename = "MIN REQ + HPA CPU BUFFER (USD)")]
    hpa_buffer: String,
    #[tabled(rename = "MAX REQUESTED (USD)")]
    max_requested: String,
    #[tabled(rename = "MIN LIMITED (USD)")]
    min_limited: String,
    #[tabled(rename = "MAX LIMITED (USD)")]
    max_limited: String,
}

/// Row of the difference table
#[derive(Tabled)]
struct DiffRow {
    #[tabled(rename = "Cost Variation")]
    variation: String,
    #[tabled(rename = "Previous (USD)")]
    previous: String,
    #[tabled(rename = "Current (USD)")]
    current: String,
    #[tabled(rename = "Difference (USD)")]
    difference: String,
    #[tabled(rename = "Difference (%)")]
    percentage: String,
}

/// Bold and arrows differ between a terminal and Markdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Markup {
    Plain,
    Markdown,
}

impl Markup {
    fn bold(self, text: String) -> String {
        match self {
            Markup::Plain => text,
            Markup::Markdown => format!("**{}**", text),
        }
    }

    fn up(self) -> &'static str {
        match self {
            Markup::Plain => "↑",
            Markup::Markdown => UP_ARROW,
        }
    }

    fn down(self) -> &'static str {
        match self {
            Markup::Plain => "↓",
            Markup::Markdown => DOWN_ARROW,
        }
    }

    fn style(self, table: &mut Table) {
        match self {
            Markup::Plain => table.with(Style::rounded()),
            Markup::Markdown => table.with(Style::markdown()),
        };
        table.with(Modify::new(Columns::new(1..)).with(Alignment::right()));
    }
}

/// Format a USD amount as `$1,234.56`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

fn format_currency_diff(value: f64, markup: Markup) -> String {
    let formatted = format_currency(value);
    if value > 0.0 {
        markup.bold(format!("+{} ({})", formatted, markup.up()))
    } else if value < 0.0 {
        format!("{} ({})", formatted, markup.down())
    } else {
        String::new()
    }
}

fn format_percentage_diff(value: Option<f64>, markup: Markup) -> String {
    match value {
        None => "N/A".to_string(),
        Some(perc) if perc > 0.0 => markup.bold(format!("+{:.2}% ({})", perc, markup.up())),
        Some(perc) if perc < 0.0 => format!("{:.2}% ({})", perc, markup.down()),
        Some(_) => String::new(),
    }
}

fn cost_row(kind: String, range: &CostRange, markup: Markup, bold: bool) -> CostRow {
    let cell = |value: f64| {
        let text = format_currency(value);
        if bold {
            markup.bold(text)
        } else {
            text
        }
    };
    CostRow {
        kind,
        min_requested: cell(range.min_requested),
        hpa_buffer: cell(range.hpa_buffer),
        max_requested: cell(range.max_requested),
        min_limited: cell(range.min_limited),
        max_limited: cell(range.max_limited),
    }
}

fn cost_table(cost: &Cost, markup: Markup) -> String {
    let mut rows: Vec<CostRow> = cost
        .monthly_ranges
        .iter()
        .map(|range| cost_row(range.kind.clone(), range, markup, false))
        .collect();
    rows.push(cost_row(
        markup.bold("TOTAL".to_string()),
        &cost.monthly_total(),
        markup,
        true,
    ));

    let mut table = Table::new(rows);
    markup.style(&mut table);
    table.to_string()
}

fn diff_table(diff: &RangeDiff, markup: Markup) -> String {
    let rows: Vec<DiffRow> = CostField::ALL
        .iter()
        .map(|&field| DiffRow {
            variation: markup.bold(field.label().to_string()),
            previous: format_currency(field.value(&diff.previous)),
            current: format_currency(field.value(&diff.current)),
            difference: format_currency_diff(field.value(&diff.absolute), markup),
            percentage: format_percentage_diff(diff.percentage.get(field), markup),
        })
        .collect();

    let mut table = Table::new(rows);
    markup.style(&mut table);
    table.to_string()
}

/// Render a cost estimate in the requested format
pub fn render_cost(cost: &Cost, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(cost_table(cost, Markup::Plain)),
        OutputFormat::Markdown => Ok(cost_table(cost, Markup::Markdown)),
        OutputFormat::Json => serde_json::to_string_pretty(cost).context("Failed to serialize cost"),
    }
}

/// Render a cost difference in the requested format.
///
/// JSON output is the machine readable summary consumed by pipelines.
pub fn render_diff(diff: &CostDiff, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&diff.to_price_diff()).context("Failed to serialize cost difference")
        }
        OutputFormat::Markdown => Ok(format!(
            "## Previous Monthly Cost\n\n{}\n\n## Current Monthly Cost\n\n{}\n\n## Difference in Costs\n\n**Summary:** {}\n\n{}",
            cost_table(&diff.previous, Markup::Markdown),
            cost_table(&diff.current, Markup::Markdown),
            diff.summary,
            diff_table(&diff.monthly, Markup::Markdown),
        )),
        OutputFormat::Table => Ok(format!(
            "Previous Monthly Cost\n{}\n\nCurrent Monthly Cost\n{}\n\nDifference in Costs\n{}",
            cost_table(&diff.previous, Markup::Plain),
            cost_table(&diff.current, Markup::Plain),
            diff_table(&diff.monthly, Markup::Plain),
        )),
    }
}

/// Write rendered output to a file, or to stdout
pub fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", content))
                .with_context(|| format!("Failed to write output to '{}'", path.display()))?;
            print_success(&format!("Output written to {}", path.display()));
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use estimator_lib::diff;

    fn range(kind: &str, values: [f64; 5]) -> CostRange {
        CostRange {
            kind: kind.to_string(),
            min_requested: values[0],
            hpa_buffer: values[1],
            max_requested: values[2],
            min_limited: values[3],
            max_limited: values[4],
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(5.5), "$5.50");
        assert_eq!(format_currency(1234.567), "$1,234.57");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_currency(-42.1), "-$42.10");
        assert_eq!(format_currency(-0.001), "$0.00");
    }

    #[test]
    fn test_diff_cells() {
        assert_eq!(
            format_currency_diff(10.0, Markup::Markdown),
            "**+$10.00 (&#8593;)**"
        );
        assert_eq!(format_currency_diff(-3.0, Markup::Markdown), "-$3.00 (&#8595;)");
        assert_eq!(format_currency_diff(0.0, Markup::Markdown), "");
        assert_eq!(format_percentage_diff(None, Markup::Markdown), "N/A");
        assert_eq!(
            format_percentage_diff(Some(12.5), Markup::Plain),
            "+12.50% (↑)"
        );
        assert_eq!(format_percentage_diff(Some(-50.0), Markup::Plain), "-50.00% (↓)");
    }

    #[test]
    fn test_markdown_cost_has_bold_total() {
        let cost = Cost::new(vec![
            range("Deployment", [100.0, 140.0, 200.0, 200.0, 400.0]),
            range("DaemonSet", [10.0, 10.0, 10.0, 30.0, 30.0]),
        ]);
        let markdown = render_cost(&cost, OutputFormat::Markdown).unwrap();

        assert!(markdown.contains("MIN REQ + HPA CPU BUFFER (USD)"));
        assert!(markdown.contains("Deployment"));
        assert!(markdown.contains("**TOTAL**"));
        assert!(markdown.contains("**$110.00**"));
        assert!(markdown.contains("**$430.00**"));
        assert!(markdown.lines().all(|line| line.starts_with('|')));
    }

    #[test]
    fn test_markdown_diff_layout() {
        let previous = Cost::new(vec![range("Deployment", [0.0, 0.0, 100.0, 100.0, 100.0])]);
        let current = Cost::new(vec![range("Deployment", [0.0, 0.0, 150.0, 100.0, 80.0])]);
        let cost_diff = diff(&current, &previous);
        let markdown = render_diff(&cost_diff, OutputFormat::Markdown).unwrap();

        let previous_at = markdown.find("## Previous Monthly Cost").unwrap();
        let current_at = markdown.find("## Current Monthly Cost").unwrap();
        let diff_at = markdown.find("## Difference in Costs").unwrap();
        assert!(previous_at < current_at && current_at < diff_at);

        assert!(markdown.contains(&format!("**Summary:** {}", cost_diff.summary)));
        assert!(markdown.contains("Cost Variation"));
        assert!(markdown.contains("**+$50.00 (&#8593;)**"));
        assert!(markdown.contains("**+50.00% (&#8593;)**"));
        assert!(markdown.contains("-$20.00 (&#8595;)"));
        assert!(!markdown.contains("N/A"));
    }

    #[test]
    fn test_diff_from_zero_shows_not_available() {
        let previous = Cost::new(vec![]);
        let current = Cost::new(vec![range("Deployment", [10.0, 10.0, 10.0, 10.0, 10.0])]);
        let table = render_diff(&diff(&current, &previous), OutputFormat::Table).unwrap();
        assert!(table.contains("N/A"));
        assert!(table.contains("+$10.00 (↑)"));
    }

    #[test]
    fn test_json_diff_is_price_diff() {
        let previous = Cost::new(vec![range("Deployment", [100.0, 100.0, 100.0, 100.0, 100.0])]);
        let current = Cost::new(vec![range("Deployment", [110.0, 100.0, 100.0, 100.0, 100.0])]);
        let json = render_diff(&diff(&current, &previous), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["summary"]["possiblyCostIncrease"], true);
        assert_eq!(value["summary"]["maxDiff"]["usd"], 10.0);
        assert_eq!(value["summary"]["maxDiff"]["perc"], 10.0);
        assert_eq!(value["details"]["usd"]["minRequested"], 10.0);
    }

    #[test]
    fn test_emit_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cost.md");
        emit("| a |", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "| a |\n");
    }
}
