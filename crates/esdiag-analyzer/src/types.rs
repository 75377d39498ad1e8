//! Core finding types.
//!
//! A [`Finding`] is one classified observation emitted by a rule. Findings are
//! immutable once built; the builder methods consume and return `self`.

use serde::{Deserialize, Serialize};

/// Classification of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Healthy or informational observation.
    Ok,
    /// Observation that needs attention.
    Attention,
}

impl Severity {
    /// Returns true if this severity needs attention.
    #[must_use]
    pub const fn is_attention(&self) -> bool {
        matches!(self, Self::Attention)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Attention => write!(f, "ATTENTION"),
        }
    }
}

/// Stable finding codes, for programmatic filtering.
pub mod codes {
    /// Cluster health status.
    pub const CLUSTER_HEALTH: &str = "CLUSTER_HEALTH";
    /// Compressed ordinary object pointers.
    pub const COMPRESSED_OOPS: &str = "COMPRESSED_OOPS";
    /// Total shard count.
    pub const OVERSHARDING: &str = "OVERSHARDING";
    /// Share of shards below the small-shard size.
    pub const MANY_SMALL_SHARDS: &str = "MANY_SMALL_SHARDS";
    /// Shards above the large-shard size.
    pub const MANY_LARGE_SHARDS: &str = "MANY_LARGE_SHARDS";
    /// Serialized cluster-state size.
    pub const CLUSTER_STATE_SIZE: &str = "CLUSTER_STATE_SIZE";
    /// Indices on the default refresh interval.
    pub const REFRESH_INTERVAL: &str = "REFRESH_INTERVAL";
    /// `_id` mapped with a non-keyword type.
    pub const ID_FIELD_TYPE: &str = "ID_FIELD_TYPE";
    /// Dynamic mapping enabled.
    pub const DYNAMIC_MAPPING: &str = "DYNAMIC_MAPPING";
    /// Top-level field count per index.
    pub const FIELD_COUNT: &str = "FIELD_COUNT";
    /// `nested` field count per index.
    pub const NESTED_FIELD_COUNT: &str = "NESTED_FIELD_COUNT";
    /// Fields using the custom prefix.
    pub const CUSTOM_FIELDS: &str = "CUSTOM_FIELDS";
    /// Fielddata enabled on `text` fields.
    pub const TEXT_FIELDDATA: &str = "TEXT_FIELDDATA";
    /// JVM heap usage per node.
    pub const JVM_HEAP: &str = "JVM_HEAP";
    /// CPU usage per node.
    pub const CPU_USAGE: &str = "CPU_USAGE";
    /// OS memory usage per node.
    pub const MEMORY_USAGE: &str = "MEMORY_USAGE";
    /// Free disk per node.
    pub const DISK_FREE: &str = "DISK_FREE";
    /// Disk usage against the watermark.
    pub const DISK_WATERMARK: &str = "DISK_WATERMARK";
    /// Cumulative disk operations per node.
    pub const DISK_IO: &str = "DISK_IO";
    /// Thread-pool rejections, cluster-wide per pool.
    pub const THREAD_POOL_REJECTIONS: &str = "THREAD_POOL_REJECTIONS";
    /// Old-generation GC time per node.
    pub const OLD_GC_TIME: &str = "OLD_GC_TIME";
    /// Young-generation GC time, cluster-wide.
    pub const YOUNG_GC_TIME: &str = "YOUNG_GC_TIME";
    /// Pending cluster tasks.
    pub const PENDING_TASKS: &str = "PENDING_TASKS";
    /// Unassigned shards.
    pub const UNASSIGNED_SHARDS: &str = "UNASSIGNED_SHARDS";
    /// Indices without replicas.
    pub const REPLICA_COUNT: &str = "REPLICA_COUNT";
    /// CPU-hot thread blocks in the stack dump.
    pub const HOT_THREADS: &str = "HOT_THREADS";
}

/// Metric payload attached to a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FindingValue {
    /// A status word, e.g. `yellow`.
    Status(String),
    /// A plain count.
    Count(u64),
    /// A count out of a total.
    Ratio {
        /// Matching items.
        count: u64,
        /// All items.
        total: u64,
        /// `count / total × 100`.
        percent: f64,
    },
    /// A size in megabytes.
    Megabytes(f64),
    /// A duration in hours.
    Hours(f64),
    /// One index name.
    Index(String),
    /// Several index names.
    Indices(Vec<String>),
    /// A count attributed to one index.
    IndexMetric {
        /// Index name.
        index: String,
        /// The measured count.
        count: u64,
    },
    /// One field of one index.
    Field {
        /// Index name.
        index: String,
        /// Dotted field path.
        field: String,
    },
    /// Several fields of one index.
    Fields {
        /// Index name.
        index: String,
        /// Dotted field paths.
        fields: Vec<String>,
    },
    /// A measurement attributed to one node.
    NodeMetric {
        /// Node name.
        node: String,
        /// The measured value.
        value: f64,
    },
    /// Cluster-wide rejections for one thread pool.
    Rejections {
        /// Thread pool name.
        pool: String,
        /// Rejected tasks summed across nodes.
        rejected: u64,
        /// Completed tasks summed across nodes.
        completed: u64,
        /// `rejected / completed × 100`; absent when nothing completed.
        rate_percent: Option<f64>,
    },
}

/// One classified observation produced by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    code: String,
    message: String,
    severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<FindingValue>,
}

impl Finding {
    /// Creates a finding with the given severity.
    #[must_use]
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
            value: None,
        }
    }

    /// Creates a healthy or informational finding.
    #[must_use]
    pub fn ok(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Ok, code, message)
    }

    /// Creates a finding that needs attention.
    #[must_use]
    pub fn attention(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Attention, code, message)
    }

    /// Creates an OK finding when `breached` is false, ATTENTION otherwise.
    #[must_use]
    pub fn flagged(
        breached: bool,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let severity = if breached {
            Severity::Attention
        } else {
            Severity::Ok
        };
        Self::new(severity, code, message)
    }

    /// Attaches a metric payload.
    #[must_use]
    pub fn with_value(mut self, value: FindingValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Stable identifier of the rule outcome.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Classification.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Metric payload, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&FindingValue> {
        self.value.as_ref()
    }

    /// Returns true if this finding needs attention.
    #[must_use]
    pub const fn is_attention(&self) -> bool {
        self.severity.is_attention()
    }
}

/// Percentage of `count` in `total`, or zero for an empty total.
#[must_use]
pub fn percent_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}
