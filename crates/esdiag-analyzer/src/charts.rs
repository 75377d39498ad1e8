//! Chart series derived from the metrics.
//!
//! Charts carry data only; rendering is left to the reporter.

use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;
use crate::metrics::nodes::thread_pool_totals;
use crate::metrics::shards::GB;
use crate::metrics::ClusterMetrics;

/// One chart request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartSeries {
    /// Distribution of values over an x range.
    Histogram {
        /// Chart title.
        title: String,
        /// Sample values.
        values: Vec<f64>,
        /// Lower bound of the x axis.
        x_min: f64,
        /// Upper bound of the x axis; derived from the data when absent.
        x_max: Option<f64>,
    },
    /// Rows of labelled columns.
    Table {
        /// Chart title.
        title: String,
        /// Column headers.
        columns: Vec<String>,
        /// Cell text per row.
        rows: Vec<Vec<String>>,
    },
    /// A plain list of items.
    List {
        /// Chart title.
        title: String,
        /// Items in order.
        items: Vec<String>,
    },
}

impl ChartSeries {
    /// Chart title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Histogram { title, .. }
            | Self::Table { title, .. }
            | Self::List { title, .. } => title,
        }
    }

    fn histogram(title: &str, values: Vec<f64>, x_max: Option<f64>) -> Self {
        Self::Histogram {
            title: title.to_string(),
            values,
            x_min: 0.0,
            x_max,
        }
    }
}

fn millions(count: u64) -> f64 {
    count as f64 / 1024.0 / 1024.0
}

/// Every chart whose input is available, in report order.
#[must_use]
pub fn build_charts(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<ChartSeries> {
    let mut charts = Vec::new();

    if let Some(shards) = &metrics.shards {
        charts.push(ChartSeries::histogram(
            "Shards by doc count (millions)",
            shards.docs_millions(),
            Some(100.0),
        ));
        charts.push(ChartSeries::histogram(
            "Shards by disk size (GB)",
            shards.store_sizes_gb(),
            Some(100.0),
        ));
        charts.push(ChartSeries::histogram(
            "Nodes by shard count",
            shards.count_by_node().into_values().map(|c| c as f64).collect(),
            None,
        ));
    }

    if let Some(fielddata) = &metrics.fielddata {
        let top = config.charts.top_fields;
        charts.push(ChartSeries::Table {
            title: format!("Top {top} largest fields"),
            columns: vec!["Field".to_string(), "Size (GB)".to_string()],
            rows: fielddata
                .top(top)
                .into_iter()
                .map(|(field, bytes)| vec![field.to_string(), format!("{:.2}", bytes as f64 / GB)])
                .collect(),
        });
        charts.push(ChartSeries::List {
            title: "Zero-size fielddata fields (consider removal from mappings)".to_string(),
            items: fielddata.zero_sized().into_iter().map(str::to_string).collect(),
        });
    }

    if let Some(stats) = &metrics.node_stats {
        let mut pools: Vec<(String, u64)> = thread_pool_totals(stats)
            .into_iter()
            .filter(|(_, c)| c.rejected > 0)
            .map(|(pool, c)| (pool, c.rejected))
            .collect();
        pools.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        charts.push(ChartSeries::Table {
            title: "Thread pool rejections".to_string(),
            columns: vec!["Thread pool".to_string(), "Rejections".to_string()],
            rows: pools
                .into_iter()
                .map(|(pool, rejected)| vec![pool, rejected.to_string()])
                .collect(),
        });
        charts.push(ChartSeries::histogram(
            "Nodes by doc count (millions)",
            stats.iter().map(|n| millions(n.docs_count)).collect(),
            None,
        ));
        charts.push(ChartSeries::histogram(
            "Nodes by disk size (GB)",
            stats.iter().map(|n| n.store_bytes as f64 / GB).collect(),
            None,
        ));
    }

    charts
}
