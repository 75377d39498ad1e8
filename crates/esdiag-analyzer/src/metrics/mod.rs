//! Metric extractors.
//!
//! Each submodule projects one bundle document into a typed, read-only
//! record set. Extraction fails fast with [`AnalysisError::MissingArtifact`]
//! or [`AnalysisError::InvalidMetric`]; no value used downstream is ever
//! defaulted to zero when the document does not carry it.

pub mod fielddata;
pub mod health;
pub mod mappings;
pub mod nodes;
pub mod pending;
pub mod settings;
pub mod shards;

use serde_json::{Map, Value};
use tracing::debug;

use crate::bundle::{Artifact, Bundle};
use crate::error::{AnalysisError, Result};

pub use fielddata::FielddataStats;
pub use health::ClusterHealth;
pub use mappings::{FieldMapping, IndexMapping};
pub use nodes::{GcTimes, NodeInfo, NodeStats, ThreadPoolCounters};
pub use pending::PendingTasks;
pub use settings::IndexSettings;
pub use shards::{ShardInventory, ShardRecord};

/// Every metric set extracted from one bundle.
///
/// A field is `None` only when its artifact was not loaded; rules skip a
/// check whose input is absent.
#[derive(Debug, Clone, Default)]
pub struct ClusterMetrics {
    /// Cluster health.
    pub health: Option<ClusterHealth>,
    /// Node info, sorted by node id.
    pub nodes: Option<Vec<NodeInfo>>,
    /// Node stats, sorted by node id.
    pub node_stats: Option<Vec<NodeStats>>,
    /// Shard inventory.
    pub shards: Option<ShardInventory>,
    /// Index settings, sorted by index name.
    pub settings: Option<Vec<IndexSettings>>,
    /// Index mappings, sorted by index name.
    pub mappings: Option<Vec<IndexMapping>>,
    /// Field-data totals.
    pub fielddata: Option<FielddataStats>,
    /// Serialized cluster-state size in bytes.
    pub cluster_state_bytes: Option<u64>,
    /// Pending tasks; absent when the optional artifact is.
    pub pending_tasks: Option<PendingTasks>,
}

impl ClusterMetrics {
    /// Extracts every metric set from a bundle.
    ///
    /// Stops at the first missing required artifact or malformed metric.
    pub fn extract(bundle: &impl Bundle) -> Result<Self> {
        let metrics = Self {
            health: Some(health::extract(bundle)?),
            nodes: Some(nodes::extract_info(bundle)?),
            node_stats: Some(nodes::extract_stats(bundle)?),
            shards: Some(shards::extract(bundle)?),
            settings: Some(settings::extract(bundle)?),
            mappings: Some(mappings::extract(bundle)?),
            fielddata: Some(fielddata::extract(bundle)?),
            cluster_state_bytes: Some(bundle.size_bytes(Artifact::ClusterState)?),
            pending_tasks: pending::extract(bundle)?,
        };
        debug!(
            nodes = metrics.node_stats.as_ref().map_or(0, Vec::len),
            shards = metrics.shards.as_ref().map_or(0, ShardInventory::len),
            indices = metrics.settings.as_ref().map_or(0, Vec::len),
            "metrics extracted"
        );
        Ok(metrics)
    }
}

/// A position inside a JSON document that remembers how it was reached,
/// so every error can name the artifact and dotted path at fault.
#[derive(Debug, Clone)]
pub(crate) struct Doc<'a> {
    artifact: Artifact,
    value: &'a Value,
    path: String,
}

impl<'a> Doc<'a> {
    pub(crate) fn root(artifact: Artifact, value: &'a Value) -> Self {
        Self {
            artifact,
            value,
            path: String::new(),
        }
    }

    pub(crate) const fn value(&self) -> &'a Value {
        self.value
    }

    fn join(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    pub(crate) fn error(&self, field: &str, reason: impl Into<String>) -> AnalysisError {
        AnalysisError::invalid_metric(self.artifact, self.join(field), reason)
    }

    /// Follows a dotted key path; `None` if any segment is absent or null.
    pub(crate) fn get(&self, key_path: &str) -> Option<Self> {
        let mut current = self.value;
        for segment in key_path.split('.') {
            current = current.get(segment)?;
        }
        if current.is_null() {
            return None;
        }
        Some(Self {
            artifact: self.artifact,
            value: current,
            path: self.join(key_path),
        })
    }

    /// Like [`Doc::get`], but a missing path is an error.
    pub(crate) fn require(&self, key_path: &str) -> Result<Self> {
        self.get(key_path)
            .ok_or_else(|| self.error(key_path, "field is missing"))
    }

    pub(crate) fn as_object(&self) -> Result<&'a Map<String, Value>> {
        self.value.as_object().ok_or_else(|| {
            AnalysisError::invalid_metric(self.artifact, self.display_path(), "expected an object")
        })
    }

    pub(crate) fn as_array(&self) -> Result<&'a Vec<Value>> {
        self.value.as_array().ok_or_else(|| {
            AnalysisError::invalid_metric(self.artifact, self.display_path(), "expected an array")
        })
    }

    /// A child document for element `index` of the current array.
    pub(crate) fn element(&self, index: usize, value: &'a Value) -> Self {
        Self {
            artifact: self.artifact,
            value,
            path: format!("{}[{index}]", self.path),
        }
    }

    /// Object entries as child documents, in key order.
    pub(crate) fn entries(&self) -> Result<Vec<(&'a str, Self)>> {
        let object = self.as_object()?;
        Ok(object
            .iter()
            .map(|(key, value)| {
                (
                    key.as_str(),
                    Self {
                        artifact: self.artifact,
                        value,
                        path: self.join(key),
                    },
                )
            })
            .collect())
    }

    fn display_path(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.clone()
        }
    }

    /// Reads the current value as an unsigned integer (number or numeric string).
    pub(crate) fn to_u64(&self) -> Result<u64> {
        let parsed = match self.value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            AnalysisError::invalid_metric(
                self.artifact,
                self.display_path(),
                format!("expected a non-negative integer, got {}", self.value),
            )
        })
    }

    /// Reads the current value as a float (number or numeric string).
    pub(crate) fn to_f64(&self) -> Result<f64> {
        let parsed = match self.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            AnalysisError::invalid_metric(
                self.artifact,
                self.display_path(),
                format!("expected a number, got {}", self.value),
            )
        })
    }

    /// Reads the current value as a boolean (`true`/`false` or their strings).
    pub(crate) fn to_bool(&self) -> Result<bool> {
        match self.value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(AnalysisError::invalid_metric(
                self.artifact,
                self.display_path(),
                format!("expected a boolean, got {other}"),
            )),
        }
    }

    pub(crate) fn to_str(&self) -> Result<&'a str> {
        self.value.as_str().ok_or_else(|| {
            AnalysisError::invalid_metric(
                self.artifact,
                self.display_path(),
                format!("expected a string, got {}", self.value),
            )
        })
    }

    pub(crate) fn u64_at(&self, key_path: &str) -> Result<u64> {
        self.require(key_path)?.to_u64()
    }

    pub(crate) fn f64_at(&self, key_path: &str) -> Result<f64> {
        self.require(key_path)?.to_f64()
    }

    pub(crate) fn opt_u64_at(&self, key_path: &str) -> Result<Option<u64>> {
        self.get(key_path).map(|d| d.to_u64()).transpose()
    }
}
