//! Shard size rules.

use crate::config::AnalyzerConfig;
use crate::metrics::ClusterMetrics;
use crate::types::{codes, percent_of, Finding, FindingValue};

/// Flags a cluster where small shards exceed the configured share of all shards.
///
/// The share is taken over every shard in the inventory, including
/// unassigned shards that report no size.
pub fn check_small_shards(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(shards) = &metrics.shards else {
        return Vec::new();
    };
    let limit = config.shards.small_shard_gb;
    let total = shards.len() as u64;
    let small = shards.store_sizes_gb().into_iter().filter(|gb| *gb < limit).count() as u64;
    let percent = percent_of(small, total);

    let breached = small as f64 > config.shards.max_small_shard_ratio * total as f64;
    let message = if breached {
        format!(
            "Cluster has {small} ({percent:.2}%) small (less than {limit} GB) shards, \
             shrinking or merging recommended"
        )
    } else {
        format!("Cluster has {small} ({percent:.2}%) small (less than {limit} GB) shards")
    };
    vec![
        Finding::flagged(breached, codes::MANY_SMALL_SHARDS, message).with_value(
            FindingValue::Ratio {
                count: small,
                total,
                percent,
            },
        ),
    ]
}

/// Flags any shard above the large-shard size, naming the largest ones.
pub fn check_large_shards(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(shards) = &metrics.shards else {
        return Vec::new();
    };
    let limit = config.shards.large_shard_gb;
    let mut large: Vec<(f64, String)> = shards
        .records()
        .iter()
        .filter_map(|r| r.store_gb().filter(|gb| *gb > limit).map(|gb| (gb, r.label())))
        .collect();
    large.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let count = large.len() as u64;
    let total = shards.len() as u64;
    let percent = percent_of(count, total);
    let mut message =
        format!("Cluster has {count} ({percent:.2}%) large (more than {limit} GB) shards");
    if !large.is_empty() {
        let names: Vec<String> = large
            .iter()
            .take(config.indices.list_limit)
            .map(|(gb, label)| format!("{label} {gb:.1} GB"))
            .collect();
        message.push_str(&format!(", largest: {}", names.join(", ")));
    }

    vec![
        Finding::flagged(count > 0, codes::MANY_LARGE_SHARDS, message).with_value(
            FindingValue::Ratio {
                count,
                total,
                percent,
            },
        ),
    ]
}
