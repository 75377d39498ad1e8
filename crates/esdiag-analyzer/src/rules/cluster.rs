//! Cluster-wide rules.

use crate::config::AnalyzerConfig;
use crate::metrics::ClusterMetrics;
use crate::types::{codes, Finding, FindingValue};

const MB: f64 = 1024.0 * 1024.0;

/// Flags a cluster whose status is not green.
pub fn check_cluster_health(metrics: &ClusterMetrics, _config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(health) = &metrics.health else {
        return Vec::new();
    };
    vec![Finding::flagged(
        !health.is_green(),
        codes::CLUSTER_HEALTH,
        format!("Cluster is: {}", health.status.to_ascii_uppercase()),
    )
    .with_value(FindingValue::Status(health.status.clone()))]
}

/// Flags nodes running without compressed ordinary object pointers.
pub fn check_compressed_oops(metrics: &ClusterMetrics, _config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(nodes) = &metrics.nodes else {
        return Vec::new();
    };
    let off = nodes.iter().filter(|n| !n.compressed_oops).count() as u64;
    let finding = if off > 0 {
        Finding::attention(
            codes::COMPRESSED_OOPS,
            format!("Compressed OOPs off for {off} nodes out of {}", nodes.len()),
        )
    } else {
        Finding::ok(codes::COMPRESSED_OOPS, "Compressed OOPs on for all nodes")
    };
    vec![finding.with_value(FindingValue::Count(off))]
}

/// Flags a shard count above the configured ceiling.
pub fn check_oversharding(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(shards) = &metrics.shards else {
        return Vec::new();
    };
    let count = shards.len() as u64;
    let finding = if count > config.cluster.max_shard_count {
        Finding::attention(
            codes::OVERSHARDING,
            format!("Cluster has {count} shards, that can cause some instability"),
        )
    } else {
        Finding::ok(
            codes::OVERSHARDING,
            format!("Cluster has {count} shards, that should not cause any issues"),
        )
    };
    vec![finding.with_value(FindingValue::Count(count))]
}

/// Flags an oversized serialized cluster state.
pub fn check_cluster_state_size(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(bytes) = metrics.cluster_state_bytes else {
        return Vec::new();
    };
    let mb = bytes as f64 / MB;
    let finding = if mb > config.cluster.max_cluster_state_mb {
        Finding::attention(
            codes::CLUSTER_STATE_SIZE,
            format!(
                "Cluster state size is {mb:.2} MB; \
                 this might cause various issues across the cluster"
            ),
        )
    } else {
        Finding::ok(codes::CLUSTER_STATE_SIZE, format!("Cluster state size is {mb:.2} MB"))
    };
    vec![finding.with_value(FindingValue::Megabytes(mb))]
}

/// Flags a non-empty master task queue. Skipped when the bundle has no
/// pending-tasks document.
pub fn check_pending_tasks(metrics: &ClusterMetrics, _config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(pending) = metrics.pending_tasks else {
        return Vec::new();
    };
    let finding = if pending.count > 0 {
        let wait = pending
            .max_time_in_queue_millis
            .map(|ms| format!(", longest waiting {ms} ms"))
            .unwrap_or_default();
        Finding::attention(
            codes::PENDING_TASKS,
            format!("{} cluster tasks are pending{wait}", pending.count),
        )
    } else {
        Finding::ok(codes::PENDING_TASKS, "No pending cluster tasks")
    };
    vec![finding.with_value(FindingValue::Count(pending.count))]
}

/// Flags shards that are not allocated to any node.
pub fn check_unassigned_shards(metrics: &ClusterMetrics, _config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(health) = &metrics.health else {
        return Vec::new();
    };
    let count = health.unassigned_shards;
    let finding = if count > 0 {
        Finding::attention(codes::UNASSIGNED_SHARDS, format!("{count} shards are unassigned"))
    } else {
        Finding::ok(codes::UNASSIGNED_SHARDS, "All shards are assigned")
    };
    vec![finding.with_value(FindingValue::Count(count))]
}
