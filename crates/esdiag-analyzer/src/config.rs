//! Analyzer configuration.
//!
//! Thresholds for every rule, grouped by the metric domain they read. The
//! defaults are the canonical policy; a TOML file may override any subset:
//!
//! ```toml
//! [nodes]
//! max_heap_percent = 80.0
//!
//! [hot_threads]
//! export_threshold = 10
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Cluster-level thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterThresholds {
    /// Shard count above which the cluster is considered overloaded.
    pub max_shard_count: u64,
    /// Serialized cluster-state size limit in megabytes.
    pub max_cluster_state_mb: f64,
}

impl Default for ClusterThresholds {
    fn default() -> Self {
        Self {
            max_shard_count: 20_000,
            max_cluster_state_mb: 50.0,
        }
    }
}

/// Shard-size thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardThresholds {
    /// Shards below this size (GB) count as small.
    pub small_shard_gb: f64,
    /// Largest tolerated share (0..=1) of small shards.
    pub max_small_shard_ratio: f64,
    /// Shards above this size (GB) count as large.
    pub large_shard_gb: f64,
}

impl Default for ShardThresholds {
    fn default() -> Self {
        Self {
            small_shard_gb: 1.0,
            max_small_shard_ratio: 0.10,
            large_shard_gb: 50.0,
        }
    }
}

/// Settings and mapping thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexThresholds {
    /// Share (0..=1) of indices on the default refresh above which raising it is suggested.
    pub max_default_refresh_ratio: f64,
    /// Minimum configured replica count.
    pub min_replicas: u32,
    /// Top-level field count limit per index.
    pub max_fields: usize,
    /// `nested` field count limit per index.
    pub max_nested_fields: usize,
    /// Field-name prefix reserved for custom fields.
    pub custom_field_prefix: String,
    /// Offending indices listed by name below this count; otherwise only counted.
    pub list_limit: usize,
}

impl Default for IndexThresholds {
    fn default() -> Self {
        Self {
            max_default_refresh_ratio: 0.10,
            min_replicas: 1,
            max_fields: 200,
            max_nested_fields: 5,
            custom_field_prefix: "custom_".to_string(),
            list_limit: 10,
        }
    }
}

/// Per-node resource thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeThresholds {
    /// JVM heap-used percent limit.
    pub max_heap_percent: f64,
    /// CPU percent limit.
    pub max_cpu_percent: f64,
    /// OS memory-used percent limit.
    pub max_memory_percent: f64,
    /// Minimum free disk in GB.
    pub min_disk_free_gb: f64,
    /// Disk-used percent watermark.
    pub max_disk_used_percent: f64,
    /// Cumulative disk operation limit.
    pub max_disk_io_ops: u64,
    /// Old-generation GC time (hours) at or above which a node is flagged.
    pub max_old_gc_hours: f64,
}

impl Default for NodeThresholds {
    fn default() -> Self {
        Self {
            max_heap_percent: 75.0,
            max_cpu_percent: 80.0,
            max_memory_percent: 80.0,
            min_disk_free_gb: 10.0,
            max_disk_used_percent: 85.0,
            max_disk_io_ops: 1_000_000,
            max_old_gc_hours: 1.0,
        }
    }
}

/// Hot-thread extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotThreadConfig {
    /// Header CPU percentage at or above which a block is hot.
    pub hot_cpu_percent: f64,
    /// Lines kept per block.
    pub max_block_lines: usize,
    /// Block count above which blocks are exported to the sink.
    pub export_threshold: usize,
}

impl Default for HotThreadConfig {
    fn default() -> Self {
        Self {
            hot_cpu_percent: 90.0,
            max_block_lines: 10,
            export_threshold: 5,
        }
    }
}

/// Chart settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Rows in the largest-fields table.
    pub top_fields: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self { top_fields: 10 }
    }
}

/// Complete analyzer configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Cluster-level thresholds.
    pub cluster: ClusterThresholds,
    /// Shard-size thresholds.
    pub shards: ShardThresholds,
    /// Settings and mapping thresholds.
    pub indices: IndexThresholds,
    /// Per-node thresholds.
    pub nodes: NodeThresholds,
    /// Hot-thread extraction.
    pub hot_threads: HotThreadConfig,
    /// Chart settings.
    pub charts: ChartConfig,
}

impl AnalyzerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AnalysisError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AnalysisError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("shards.max_small_shard_ratio", self.shards.max_small_shard_ratio),
            (
                "indices.max_default_refresh_ratio",
                self.indices.max_default_refresh_ratio,
            ),
        ];
        for (name, ratio) in ratios {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(AnalysisError::Config(format!(
                    "{name} must be between 0 and 1, got {ratio}"
                )));
            }
        }

        let percents = [
            ("nodes.max_heap_percent", self.nodes.max_heap_percent),
            ("nodes.max_cpu_percent", self.nodes.max_cpu_percent),
            ("nodes.max_memory_percent", self.nodes.max_memory_percent),
            ("nodes.max_disk_used_percent", self.nodes.max_disk_used_percent),
            ("hot_threads.hot_cpu_percent", self.hot_threads.hot_cpu_percent),
        ];
        for (name, percent) in percents {
            if percent.is_nan() || percent <= 0.0 || percent > 100.0 {
                return Err(AnalysisError::Config(format!(
                    "{name} must be in (0, 100], got {percent}"
                )));
            }
        }

        if self.shards.small_shard_gb < 0.0 || self.shards.large_shard_gb <= 0.0 {
            return Err(AnalysisError::Config(
                "shard size thresholds must be positive".to_string(),
            ));
        }

        if self.hot_threads.max_block_lines == 0 {
            return Err(AnalysisError::Config(
                "hot_threads.max_block_lines must be greater than 0".to_string(),
            ));
        }

        if self.indices.custom_field_prefix.is_empty() {
            return Err(AnalysisError::Config(
                "indices.custom_field_prefix cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_canonical() {
        let config = AnalyzerConfig::default();

        assert_eq!(config.cluster.max_shard_count, 20_000);
        assert!((config.shards.max_small_shard_ratio - 0.10).abs() < f64::EPSILON);
        assert_eq!(config.indices.max_fields, 200);
        assert_eq!(config.indices.max_nested_fields, 5);
        assert!((config.nodes.max_heap_percent - 75.0).abs() < f64::EPSILON);
        assert_eq!(config.nodes.max_disk_io_ops, 1_000_000);
        assert_eq!(config.hot_threads.max_block_lines, 10);
        assert_eq!(config.hot_threads.export_threshold, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let toml = r"
            [nodes]
            max_heap_percent = 85.0

            [hot_threads]
            export_threshold = 2
        ";

        let config = AnalyzerConfig::from_toml(toml).expect("should parse partial config");

        assert!((config.nodes.max_heap_percent - 85.0).abs() < f64::EPSILON);
        assert!((config.nodes.max_cpu_percent - 80.0).abs() < f64::EPSILON);
        assert_eq!(config.hot_threads.export_threshold, 2);
        assert_eq!(config.cluster, ClusterThresholds::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = AnalyzerConfig::from_toml("").expect("empty config");
        assert_eq!(config, AnalyzerConfig::default());
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = AnalyzerConfig::from_toml("[nodes\nmax = ").expect_err("bad toml");
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn test_ratio_out_of_range_rejected() {
        let toml = r"
            [shards]
            max_small_shard_ratio = 10.0
        ";
        let err = AnalyzerConfig::from_toml(toml).expect_err("ratio > 1");
        assert!(err.to_string().contains("shards.max_small_shard_ratio"));
    }

    #[test]
    fn test_zero_block_lines_rejected() {
        let mut config = AnalyzerConfig::default();
        config.hot_threads.max_block_lines = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        file.write_all(b"[indices]\ncustom_field_prefix = \"x_\"\n")
            .expect("failed to write temp file");

        let config = AnalyzerConfig::from_file(file.path()).expect("should load");
        assert_eq!(config.indices.custom_field_prefix, "x_");
    }

    #[test]
    fn test_from_missing_file() {
        let err = AnalyzerConfig::from_file("/no/such/esdiag.toml").expect_err("missing");
        assert!(err.to_string().contains("failed to read config file"));
    }
}
