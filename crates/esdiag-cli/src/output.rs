//! Rendering of reports and rule listings.
//!
//! The text form prints ATTENTION findings, then charts, then OK findings.

use std::io::Write;

use esdiag_analyzer::{ChartSeries, Finding, Report, Rule};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

const HISTOGRAM_BINS: usize = 10;
const BAR_WIDTH: usize = 40;

/// Renders command results as a text report or as pretty JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    format: Format,
}

impl Renderer {
    /// Create a renderer for the selected format.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write `value` in the selected format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn render<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + Render,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.render_text(writer)?,
        }
        Ok(())
    }
}

/// Human-readable rendering of a command result.
pub trait Render {
    /// Write the value as plain text.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn render_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

impl Render for Report {
    fn render_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if let Some(name) = &self.cluster_name {
            writeln!(writer, "Cluster: {name}")?;
            writeln!(writer)?;
        }

        if !self.attention.is_empty() {
            writeln!(writer, "ATTENTION:")?;
            write_findings(writer, &self.attention)?;
            writeln!(writer)?;
        }

        if !self.charts.is_empty() {
            writeln!(writer, "CHARTS:")?;
            for chart in &self.charts {
                write_chart(writer, chart)?;
                writeln!(writer)?;
            }
        }

        if !self.ok.is_empty() {
            writeln!(writer, "OK:")?;
            write_findings(writer, &self.ok)?;
            writeln!(writer)?;
        }

        let hot = &self.hot_threads;
        match &hot.exported_to {
            Some(location) => writeln!(
                writer,
                "Hot threads: {} block(s), written to {location}",
                hot.blocks
            )?,
            None => writeln!(writer, "Hot threads: {} block(s)", hot.blocks)?,
        }
        writeln!(
            writer,
            "Total: {} need attention, {} ok",
            self.attention.len(),
            self.ok.len()
        )?;
        Ok(())
    }
}

fn write_findings<W: Write>(writer: &mut W, findings: &[Finding]) -> Result<(), CliError> {
    for finding in findings {
        writeln!(writer, " * [{}] {}", finding.code(), finding.message())?;
    }
    Ok(())
}

fn write_chart<W: Write>(writer: &mut W, chart: &ChartSeries) -> Result<(), CliError> {
    writeln!(writer, "{}", chart.title())?;
    match chart {
        ChartSeries::Histogram {
            values, x_min, x_max, ..
        } => write_histogram(writer, values, *x_min, *x_max),
        ChartSeries::Table { columns, rows, .. } => write_table_rows(writer, columns, rows),
        ChartSeries::List { items, .. } => {
            if items.is_empty() {
                writeln!(writer, "  (none)")?;
            }
            for item in items {
                writeln!(writer, " * {item}")?;
            }
            Ok(())
        }
    }
}

/// Counts per equal-width bin over `[x_min, x_max]`, plus the number of
/// values outside that range.
fn bin_values(values: &[f64], x_min: f64, x_max: f64) -> (Vec<usize>, usize) {
    let width = (x_max - x_min) / HISTOGRAM_BINS as f64;
    let mut bins = vec![0; HISTOGRAM_BINS];
    let mut outside = 0;
    for &v in values {
        if v < x_min || v > x_max || v.is_nan() {
            outside += 1;
            continue;
        }
        let index = (((v - x_min) / width) as usize).min(HISTOGRAM_BINS - 1);
        bins[index] += 1;
    }
    (bins, outside)
}

fn write_histogram<W: Write>(
    writer: &mut W,
    values: &[f64],
    x_min: f64,
    x_max: Option<f64>,
) -> Result<(), CliError> {
    if values.is_empty() {
        writeln!(writer, "  (no data)")?;
        return Ok(());
    }
    let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut upper = x_max.unwrap_or(data_max);
    if upper <= x_min {
        upper = x_min + 1.0;
    }

    let (bins, outside) = bin_values(values, x_min, upper);
    let peak = bins.iter().copied().max().unwrap_or(0).max(1);
    let width = (upper - x_min) / HISTOGRAM_BINS as f64;

    for (i, count) in bins.iter().enumerate() {
        let lo = x_min + width * i as f64;
        let bar_len = if *count == 0 {
            0
        } else {
            (count * BAR_WIDTH).div_ceil(peak)
        };
        writeln!(
            writer,
            "  [{lo:>9.2}, {:>9.2}) | {:<BAR_WIDTH$} {count}",
            lo + width,
            "█".repeat(bar_len)
        )?;
    }
    if outside > 0 {
        writeln!(writer, "  {outside} value(s) outside the x range")?;
    }
    Ok(())
}

fn write_table_rows<W: Write>(
    writer: &mut W,
    columns: &[String],
    rows: &[Vec<String>],
) -> Result<(), CliError> {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    writeln!(writer, "  {}", line(columns))?;
    let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    writeln!(writer, "  {}", "─".repeat(total))?;
    if rows.is_empty() {
        writeln!(writer, "  (none)")?;
    }
    for row in rows {
        writeln!(writer, "  {}", line(row))?;
    }
    Ok(())
}

/// One row of the rule listing.
#[derive(Debug, Clone, Serialize)]
pub struct RuleRow {
    /// Position in execution order, starting at 1.
    pub order: usize,
    /// Rule name.
    pub name: String,
    /// Finding codes the rule emits.
    pub codes: Vec<String>,
}

/// The rule set in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct RuleList {
    /// Rules in order.
    pub rules: Vec<RuleRow>,
}

impl RuleList {
    /// Builds the listing from rule definitions.
    #[must_use]
    pub fn from_rules(rules: &[Rule]) -> Self {
        Self {
            rules: rules
                .iter()
                .enumerate()
                .map(|(i, rule)| RuleRow {
                    order: i + 1,
                    name: rule.name.to_string(),
                    codes: rule.codes.iter().map(|c| (*c).to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl Render for RuleList {
    fn render_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{:>3}  {:<24}  CODES", "#", "RULE")?;
        writeln!(writer, "{}", "─".repeat(72))?;
        for rule in &self.rules {
            writeln!(
                writer,
                "{:>3}  {:<24}  {}",
                rule.order,
                rule.name,
                rule.codes.join(", ")
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} rule(s)", self.rules.len())?;
        Ok(())
    }
}
