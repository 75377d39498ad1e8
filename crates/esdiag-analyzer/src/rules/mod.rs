//! Threshold rules over extracted cluster metrics.
//!
//! Every rule is a pure function of the metrics and the configuration. The
//! rules run unconditionally in the fixed order of [`RULES`]; a rule whose
//! input metric set is unavailable emits nothing.

mod cluster;
mod indices;
mod nodes;
mod shards;

use tracing::debug;

use crate::aggregator::Aggregator;
use crate::config::AnalyzerConfig;
use crate::metrics::ClusterMetrics;
use crate::types::{codes, Finding};

pub use cluster::{
    check_cluster_health, check_cluster_state_size, check_compressed_oops, check_oversharding,
    check_pending_tasks, check_unassigned_shards,
};
pub use indices::{
    check_custom_fields, check_dynamic_mapping, check_field_count, check_id_field_type,
    check_nested_field_count, check_refresh_interval, check_replica_count, check_text_fielddata,
};
pub use nodes::{
    check_cpu_usage, check_disk_free, check_disk_io, check_disk_watermark, check_gc_time,
    check_jvm_heap, check_memory_usage, check_thread_pool_rejections,
};
pub use shards::{check_large_shards, check_small_shards};

/// Signature shared by every rule.
pub type CheckFn = fn(&ClusterMetrics, &AnalyzerConfig) -> Vec<Finding>;

/// A named rule and the finding codes it can emit.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Short human-readable name.
    pub name: &'static str,
    /// Codes of the findings this rule emits.
    pub codes: &'static [&'static str],
    /// The check itself.
    pub check: CheckFn,
}

/// All rules in execution order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "Cluster health",
        codes: &[codes::CLUSTER_HEALTH],
        check: check_cluster_health,
    },
    Rule {
        name: "Pointer compression",
        codes: &[codes::COMPRESSED_OOPS],
        check: check_compressed_oops,
    },
    Rule {
        name: "Oversharding",
        codes: &[codes::OVERSHARDING],
        check: check_oversharding,
    },
    Rule {
        name: "Small shards",
        codes: &[codes::MANY_SMALL_SHARDS],
        check: check_small_shards,
    },
    Rule {
        name: "Large shards",
        codes: &[codes::MANY_LARGE_SHARDS],
        check: check_large_shards,
    },
    Rule {
        name: "Cluster state size",
        codes: &[codes::CLUSTER_STATE_SIZE],
        check: check_cluster_state_size,
    },
    Rule {
        name: "Refresh interval",
        codes: &[codes::REFRESH_INTERVAL],
        check: check_refresh_interval,
    },
    Rule {
        name: "_id field type",
        codes: &[codes::ID_FIELD_TYPE],
        check: check_id_field_type,
    },
    Rule {
        name: "Dynamic mapping",
        codes: &[codes::DYNAMIC_MAPPING],
        check: check_dynamic_mapping,
    },
    Rule {
        name: "Field count",
        codes: &[codes::FIELD_COUNT],
        check: check_field_count,
    },
    Rule {
        name: "Nested field count",
        codes: &[codes::NESTED_FIELD_COUNT],
        check: check_nested_field_count,
    },
    Rule {
        name: "Custom fields",
        codes: &[codes::CUSTOM_FIELDS],
        check: check_custom_fields,
    },
    Rule {
        name: "Fielddata on text",
        codes: &[codes::TEXT_FIELDDATA],
        check: check_text_fielddata,
    },
    Rule {
        name: "JVM heap",
        codes: &[codes::JVM_HEAP],
        check: check_jvm_heap,
    },
    Rule {
        name: "CPU",
        codes: &[codes::CPU_USAGE],
        check: check_cpu_usage,
    },
    Rule {
        name: "Memory",
        codes: &[codes::MEMORY_USAGE],
        check: check_memory_usage,
    },
    Rule {
        name: "Disk free",
        codes: &[codes::DISK_FREE],
        check: check_disk_free,
    },
    Rule {
        name: "Disk watermark",
        codes: &[codes::DISK_WATERMARK],
        check: check_disk_watermark,
    },
    Rule {
        name: "Disk I/O",
        codes: &[codes::DISK_IO],
        check: check_disk_io,
    },
    Rule {
        name: "Thread-pool rejections",
        codes: &[codes::THREAD_POOL_REJECTIONS],
        check: check_thread_pool_rejections,
    },
    Rule {
        name: "GC",
        codes: &[codes::OLD_GC_TIME, codes::YOUNG_GC_TIME],
        check: check_gc_time,
    },
    Rule {
        name: "Pending tasks",
        codes: &[codes::PENDING_TASKS],
        check: check_pending_tasks,
    },
    Rule {
        name: "Unassigned shards",
        codes: &[codes::UNASSIGNED_SHARDS],
        check: check_unassigned_shards,
    },
    Rule {
        name: "Replica count",
        codes: &[codes::REPLICA_COUNT],
        check: check_replica_count,
    },
];

/// Runs every rule in order, appending findings to the aggregator.
pub fn run_all_rules(
    metrics: &ClusterMetrics,
    config: &AnalyzerConfig,
    aggregator: &mut Aggregator,
) {
    for rule in RULES {
        let findings = (rule.check)(metrics, config);
        if findings.is_empty() {
            debug!(rule = rule.name, "rule skipped, input unavailable");
            continue;
        }
        debug!(
            rule = rule.name,
            findings = findings.len(),
            attention = findings.iter().filter(|f| f.is_attention()).count(),
            "rule evaluated"
        );
        aggregator.extend(findings);
    }
}

/// Lists up to `limit - 1` names, or just the count once there are more.
pub(crate) fn name_or_count(names: &[String], limit: usize) -> String {
    if names.len() < limit {
        format!("{} ({})", names.len(), names.join(", "))
    } else {
        names.len().to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{ClusterHealth, ShardInventory};

    mod registry_tests {
        use super::*;

        #[test]
        fn twenty_four_rules_in_fixed_order() {
            assert_eq!(RULES.len(), 24);
            assert_eq!(RULES[0].codes, &[codes::CLUSTER_HEALTH]);
            assert_eq!(RULES[2].codes, &[codes::OVERSHARDING]);
            assert_eq!(RULES[20].codes, &[codes::OLD_GC_TIME, codes::YOUNG_GC_TIME]);
            assert_eq!(RULES[23].codes, &[codes::REPLICA_COUNT]);
        }

        #[test]
        fn no_code_is_claimed_twice() {
            let mut all: Vec<&str> = RULES.iter().flat_map(|r| r.codes.iter().copied()).collect();
            let before = all.len();
            all.sort_unstable();
            all.dedup();
            assert_eq!(all.len(), before);
        }
    }

    mod run_all_tests {
        use super::*;

        #[test]
        fn empty_metrics_emit_nothing() {
            let mut aggregator = Aggregator::new();
            run_all_rules(&ClusterMetrics::default(), &fixtures::defaults(), &mut aggregator);
            assert!(aggregator.is_empty());
        }

        #[test]
        fn findings_follow_rule_order() {
            let metrics = ClusterMetrics {
                health: Some(ClusterHealth {
                    cluster_name: None,
                    status: "red".to_string(),
                    number_of_nodes: Some(1),
                    unassigned_shards: 3,
                }),
                shards: Some(ShardInventory::default()),
                ..ClusterMetrics::default()
            };
            let mut aggregator = Aggregator::new();
            run_all_rules(&metrics, &fixtures::defaults(), &mut aggregator);

            let codes: Vec<String> = aggregator
                .findings()
                .map(|f| f.code().to_string())
                .collect();
            assert_eq!(
                codes,
                vec![
                    codes::CLUSTER_HEALTH,
                    codes::OVERSHARDING,
                    codes::MANY_SMALL_SHARDS,
                    codes::MANY_LARGE_SHARDS,
                    codes::UNASSIGNED_SHARDS,
                ]
            );
        }

        #[test]
        fn repeated_runs_are_identical() {
            let metrics = ClusterMetrics {
                shards: Some(ShardInventory::default()),
                ..ClusterMetrics::default()
            };
            let config = fixtures::defaults();
            let mut first = Aggregator::new();
            let mut second = Aggregator::new();
            run_all_rules(&metrics, &config, &mut first);
            run_all_rules(&metrics, &config, &mut second);
            assert_eq!(
                first.findings().collect::<Vec<_>>(),
                second.findings().collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn names_listed_below_limit() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(name_or_count(&names, 10), "2 (a, b)");
        assert_eq!(name_or_count(&names, 2), "2");
    }
}
