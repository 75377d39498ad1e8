//! Finding aggregation and the final report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::charts::ChartSeries;
use crate::types::Finding;

/// One aggregated item, kept in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A rule outcome.
    Finding(Finding),
    /// A chart request.
    Chart(ChartSeries),
}

/// Collects findings and chart requests for one run.
///
/// Nothing is deduplicated; several findings may share a code.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    entries: Vec<Entry>,
}

impl Aggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finding.
    pub fn push(&mut self, finding: Finding) {
        self.entries.push(Entry::Finding(finding));
    }

    /// Appends findings in order.
    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.entries.extend(findings.into_iter().map(Entry::Finding));
    }

    /// Appends a chart request.
    pub fn push_chart(&mut self, chart: ChartSeries) {
        self.entries.push(Entry::Chart(chart));
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Findings in call order.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Finding(f) => Some(f),
            Entry::Chart(_) => None,
        })
    }

    /// Partitions the entries into a report, preserving order within each part.
    #[must_use]
    pub fn into_report(self, hot_threads: HotThreadSummary) -> Report {
        let mut report = Report {
            cluster_name: None,
            ok: Vec::new(),
            attention: Vec::new(),
            charts: Vec::new(),
            hot_threads,
            generated_at: Utc::now(),
            analysis_duration_ms: 0,
        };
        for entry in self.entries {
            match entry {
                Entry::Finding(f) if f.is_attention() => report.attention.push(f),
                Entry::Finding(f) => report.ok.push(f),
                Entry::Chart(c) => report.charts.push(c),
            }
        }
        report
    }
}

/// Outcome of hot-thread extraction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HotThreadSummary {
    /// Hot blocks found.
    pub blocks: usize,
    /// Where the blocks were written, if they were.
    pub exported_to: Option<String>,
}

/// Result of analyzing one bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Cluster name from the health document, if reported.
    pub cluster_name: Option<String>,
    /// Healthy and informational findings, in emission order.
    pub ok: Vec<Finding>,
    /// Findings that need attention, in emission order.
    pub attention: Vec<Finding>,
    /// Chart series in report order.
    pub charts: Vec<ChartSeries>,
    /// Hot-thread summary.
    pub hot_threads: HotThreadSummary,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Duration of the analysis in milliseconds.
    pub analysis_duration_ms: u64,
}

impl Report {
    /// Returns true if any finding needs attention.
    #[must_use]
    pub fn has_attention(&self) -> bool {
        !self.attention.is_empty()
    }

    /// All findings, attention first.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.attention.iter().chain(&self.ok)
    }
}
