//! Per-node resource rules.

use crate::config::AnalyzerConfig;
use crate::metrics::nodes::thread_pool_totals;
use crate::metrics::shards::GB;
use crate::metrics::{ClusterMetrics, NodeStats};
use crate::types::{codes, Finding, FindingValue};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// One ATTENTION finding per node for which `breach` yields a value and
/// message, or a single OK finding when no node does.
fn per_node(
    metrics: &ClusterMetrics,
    code: &str,
    healthy: impl FnOnce() -> String,
    breach: impl Fn(&NodeStats) -> Option<(f64, String)>,
) -> Vec<Finding> {
    let Some(stats) = &metrics.node_stats else {
        return Vec::new();
    };
    let findings: Vec<Finding> = stats
        .iter()
        .filter_map(|node| {
            breach(node).map(|(value, message)| {
                Finding::attention(code, message).with_value(FindingValue::NodeMetric {
                    node: node.name.clone(),
                    value,
                })
            })
        })
        .collect();
    if findings.is_empty() {
        return vec![Finding::ok(code, healthy())];
    }
    findings
}

/// Flags nodes whose JVM heap usage exceeds the limit.
pub fn check_jvm_heap(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let limit = config.nodes.max_heap_percent;
    per_node(
        metrics,
        codes::JVM_HEAP,
        || format!("JVM heap usage is at most {limit}% on all nodes"),
        |node| {
            let used = node.heap_used_percent;
            (used > limit).then(|| {
                let message =
                    format!("Node {} JVM heap usage is {used:.1}% (limit {limit}%)", node.name);
                (used, message)
            })
        },
    )
}

/// Flags nodes whose CPU usage exceeds the limit.
pub fn check_cpu_usage(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let limit = config.nodes.max_cpu_percent;
    per_node(
        metrics,
        codes::CPU_USAGE,
        || format!("CPU usage is at most {limit}% on all nodes"),
        |node| {
            let cpu = node.cpu_percent;
            (cpu > limit).then(|| {
                let message = format!("Node {} CPU usage is {cpu:.1}% (limit {limit}%)", node.name);
                (cpu, message)
            })
        },
    )
}

/// Flags nodes whose OS memory usage exceeds the limit.
pub fn check_memory_usage(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let limit = config.nodes.max_memory_percent;
    per_node(
        metrics,
        codes::MEMORY_USAGE,
        || format!("Memory usage is at most {limit}% on all nodes"),
        |node| {
            let mem = node.mem_used_percent;
            (mem > limit).then(|| {
                let message =
                    format!("Node {} memory usage is {mem:.1}% (limit {limit}%)", node.name);
                (mem, message)
            })
        },
    )
}

/// Flags nodes with less free disk than the minimum.
pub fn check_disk_free(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let min = config.nodes.min_disk_free_gb;
    per_node(
        metrics,
        codes::DISK_FREE,
        || format!("All nodes have at least {min} GB of free disk"),
        |node| {
            let free = node.disk_free_bytes as f64 / GB;
            (free < min).then(|| {
                let message = format!(
                    "Node {} has {free:.2} GB of free disk (minimum {min} GB)",
                    node.name
                );
                (free, message)
            })
        },
    )
}

/// Flags nodes whose disk usage passes the watermark.
pub fn check_disk_watermark(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let limit = config.nodes.max_disk_used_percent;
    per_node(
        metrics,
        codes::DISK_WATERMARK,
        || format!("Disk usage is below the {limit}% watermark on all nodes"),
        |node| {
            let used = node.disk_used_percent;
            (used > limit).then(|| {
                let message =
                    format!("Node {} disk usage is {used:.1}% (watermark {limit}%)", node.name);
                (used, message)
            })
        },
    )
}

/// Flags nodes with more cumulative disk operations than the limit.
///
/// Nodes that do not report I/O stats are not checked.
pub fn check_disk_io(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let limit = config.nodes.max_disk_io_ops;
    per_node(
        metrics,
        codes::DISK_IO,
        || format!("Disk operations are at most {limit} on all reporting nodes"),
        |node| {
            let ops = node.disk_io_ops.filter(|ops| *ops > limit)?;
            let message =
                format!("Node {} performed {ops} disk operations (limit {limit})", node.name);
            Some((ops as f64, message))
        },
    )
}

/// Flags every thread pool with rejections summed across nodes.
pub fn check_thread_pool_rejections(
    metrics: &ClusterMetrics,
    _config: &AnalyzerConfig,
) -> Vec<Finding> {
    let Some(stats) = &metrics.node_stats else {
        return Vec::new();
    };
    let findings: Vec<Finding> = thread_pool_totals(stats)
        .into_iter()
        .filter(|(_, counters)| counters.rejected > 0)
        .map(|(pool, counters)| {
            let rate_percent = counters.rejection_rate_percent();
            let rate = rate_percent.map_or_else(
                || "rate unavailable, nothing completed".to_string(),
                |r| format!("{r:.2}% of completed"),
            );
            Finding::attention(
                codes::THREAD_POOL_REJECTIONS,
                format!("Thread pool {pool} rejected {} tasks ({rate})", counters.rejected),
            )
            .with_value(FindingValue::Rejections {
                pool,
                rejected: counters.rejected,
                completed: counters.completed,
                rate_percent,
            })
        })
        .collect();
    if findings.is_empty() {
        return vec![Finding::ok(codes::THREAD_POOL_REJECTIONS, "No thread pool rejections")];
    }
    findings
}

/// Flags nodes with long old-generation GC time and reports young-generation
/// time across the cluster.
pub fn check_gc_time(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(stats) = &metrics.node_stats else {
        return Vec::new();
    };
    let limit_hours = config.nodes.max_old_gc_hours;
    let mut findings = per_node(
        metrics,
        codes::OLD_GC_TIME,
        || format!("Old-generation GC time is below {limit_hours} h on all nodes"),
        |node| {
            let millis = node.gc.old_millis as f64;
            (millis >= limit_hours * MILLIS_PER_HOUR).then(|| {
                let hours = millis / MILLIS_PER_HOUR;
                (hours, format!("Node {} spent {hours:.2} h in old-generation GC", node.name))
            })
        },
    );

    let young_millis: u64 = stats.iter().map(|n| n.gc.young_millis).sum();
    let young_hours = young_millis as f64 / MILLIS_PER_HOUR;
    let busiest = stats
        .iter()
        .max_by(|a, b| a.gc.young_millis.cmp(&b.gc.young_millis).then_with(|| b.id.cmp(&a.id)))
        .filter(|n| n.gc.young_millis > 0)
        .map(|n| format!(", most on {}", n.name))
        .unwrap_or_default();
    findings.push(
        Finding::ok(
            codes::YOUNG_GC_TIME,
            format!(
                "Young-generation GC time totals {young_hours:.2} h across {} nodes{busiest}",
                stats.len()
            ),
        )
        .with_value(FindingValue::Hours(young_hours)),
    );
    findings
}
