//! Core analysis engine.
//!
//! The [`Analyzer`] loads every metric set from a bundle, runs the rules in
//! order, scans the hot-threads dump and assembles the [`Report`].

use std::time::Instant;

use tracing::{info, warn};

use crate::aggregator::{Aggregator, HotThreadSummary, Report};
use crate::bundle::{Artifact, Bundle};
use crate::charts::build_charts;
use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::hot_threads::{extract_hot_threads, BlockSink, HotThreadScan};
use crate::metrics::ClusterMetrics;
use crate::rules::run_all_rules;

/// Analyzes diagnostic bundles against a fixed rule set.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Creates an analyzer with the default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an analyzer with the given configuration.
    #[must_use]
    pub const fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Returns a reference to the analyzer's configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyzes a whole bundle.
    ///
    /// Fails on the first missing required artifact, in load order, or on the
    /// first malformed metric.
    /// Hot-thread blocks go to `sink` when there are enough of them; a sink
    /// failure is logged and does not fail the run.
    pub fn analyze(
        &self,
        bundle: &impl Bundle,
        sink: Option<&mut dyn BlockSink>,
    ) -> Result<Report> {
        let start = Instant::now();

        bundle.check_required()?;
        let metrics = ClusterMetrics::extract(bundle)?;
        let dump = bundle.read_text(Artifact::HotThreads)?;
        let scan = extract_hot_threads(&dump, &self.config.hot_threads);

        let mut report = self.analyze_metrics(&metrics, &scan, sink);
        report.analysis_duration_ms = start.elapsed().as_millis() as u64;

        info!(
            cluster = report.cluster_name.as_deref().unwrap_or("unknown"),
            attention = report.attention.len(),
            ok = report.ok.len(),
            charts = report.charts.len(),
            hot_blocks = report.hot_threads.blocks,
            duration_ms = report.analysis_duration_ms,
            "analysis complete"
        );
        Ok(report)
    }

    /// Builds a report from already-extracted inputs.
    #[must_use]
    pub fn analyze_metrics(
        &self,
        metrics: &ClusterMetrics,
        scan: &HotThreadScan,
        sink: Option<&mut dyn BlockSink>,
    ) -> Report {
        let mut aggregator = Aggregator::new();
        run_all_rules(metrics, &self.config, &mut aggregator);

        let exported_to = Self::export(scan, sink);
        aggregator.push(scan.finding(exported_to.as_deref()));

        for chart in build_charts(metrics, &self.config) {
            aggregator.push_chart(chart);
        }

        let mut report = aggregator.into_report(HotThreadSummary {
            blocks: scan.len(),
            exported_to,
        });
        report.cluster_name = metrics.health.as_ref().and_then(|h| h.cluster_name.clone());
        report
    }

    fn export(scan: &HotThreadScan, sink: Option<&mut dyn BlockSink>) -> Option<String> {
        if !scan.is_export_worthy() {
            return None;
        }
        let sink = sink?;
        match sink.write_blocks(scan.blocks()) {
            Ok(location) => {
                info!(blocks = scan.len(), %location, "hot thread blocks exported");
                Some(location)
            }
            Err(e) => {
                warn!(error = %e, "failed to export hot thread blocks");
                None
            }
        }
    }
}
