//! Node info and node stats extraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Doc;
use crate::bundle::{Artifact, Bundle};
use crate::error::Result;

/// Static information about one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node id.
    pub id: String,
    /// Node name.
    pub name: String,
    /// Whether the JVM runs with compressed ordinary object pointers.
    pub compressed_oops: bool,
}

/// Cumulative counters for one thread pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThreadPoolCounters {
    /// Tasks refused because the queue was full.
    pub rejected: u64,
    /// Tasks completed.
    pub completed: u64,
}

impl ThreadPoolCounters {
    /// `rejected / completed × 100`, or `None` when nothing completed.
    #[must_use]
    pub fn rejection_rate_percent(&self) -> Option<f64> {
        (self.completed > 0).then(|| self.rejected as f64 / self.completed as f64 * 100.0)
    }
}

/// Cumulative garbage collection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GcTimes {
    /// Young-generation collection time in milliseconds.
    pub young_millis: u64,
    /// Old-generation collection time in milliseconds.
    pub old_millis: u64,
}

/// Resource usage of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    /// Node id.
    pub id: String,
    /// Node name.
    pub name: String,
    /// JVM heap used, percent.
    pub heap_used_percent: f64,
    /// Process CPU usage, percent.
    pub cpu_percent: f64,
    /// OS memory used, percent.
    pub mem_used_percent: f64,
    /// Total data-path disk in bytes.
    pub disk_total_bytes: u64,
    /// Disk available to the node in bytes.
    pub disk_free_bytes: u64,
    /// `(total - free) / total × 100`.
    pub disk_used_percent: f64,
    /// Cumulative disk operations; absent where the OS does not report them.
    pub disk_io_ops: Option<u64>,
    /// Counters per thread pool.
    pub thread_pools: BTreeMap<String, ThreadPoolCounters>,
    /// GC time.
    pub gc: GcTimes,
    /// Documents held by the node.
    pub docs_count: u64,
    /// Bytes stored by the node.
    pub store_bytes: u64,
}

/// Extracts node info, sorted by node id.
pub fn extract_info(bundle: &impl Bundle) -> Result<Vec<NodeInfo>> {
    let value = bundle.read_json(Artifact::NodeInfo)?;
    parse_info(&value)
}

pub(crate) fn parse_info(value: &serde_json::Value) -> Result<Vec<NodeInfo>> {
    let doc = Doc::root(Artifact::NodeInfo, value);
    let mut nodes = doc
        .require("nodes")?
        .entries()?
        .into_iter()
        .map(|(id, node)| {
            Ok(NodeInfo {
                id: id.to_string(),
                name: node_name(id, &node)?,
                compressed_oops: node
                    .require("jvm.using_compressed_ordinary_object_pointers")?
                    .to_bool()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(nodes)
}

/// Extracts node stats, sorted by node id.
pub fn extract_stats(bundle: &impl Bundle) -> Result<Vec<NodeStats>> {
    let value = bundle.read_json(Artifact::NodeStats)?;
    parse_stats(&value)
}

pub(crate) fn parse_stats(value: &serde_json::Value) -> Result<Vec<NodeStats>> {
    let doc = Doc::root(Artifact::NodeStats, value);
    let mut stats = doc
        .require("nodes")?
        .entries()?
        .into_iter()
        .map(|(id, node)| parse_node_stats(id, &node))
        .collect::<Result<Vec<_>>>()?;
    stats.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(stats)
}

fn node_name(id: &str, node: &Doc<'_>) -> Result<String> {
    Ok(node
        .get("name")
        .map(|d| d.to_str().map(str::to_string))
        .transpose()?
        .unwrap_or_else(|| id.to_string()))
}

fn parse_node_stats(id: &str, node: &Doc<'_>) -> Result<NodeStats> {
    let disk_total_bytes = node.u64_at("fs.total.total_in_bytes")?;
    if disk_total_bytes == 0 {
        return Err(node.error("fs.total.total_in_bytes", "total disk size is zero"));
    }
    let disk_free_bytes = match node.get("fs.total.available_in_bytes") {
        Some(available) => available.to_u64()?,
        None => node.u64_at("fs.total.free_in_bytes")?,
    };
    let used = disk_total_bytes.saturating_sub(disk_free_bytes);

    let mut thread_pools = BTreeMap::new();
    for (pool, counters) in node.require("thread_pool")?.entries()? {
        thread_pools.insert(
            pool.to_string(),
            ThreadPoolCounters {
                rejected: counters.u64_at("rejected")?,
                completed: counters.u64_at("completed")?,
            },
        );
    }

    Ok(NodeStats {
        id: id.to_string(),
        name: node_name(id, node)?,
        heap_used_percent: node.f64_at("jvm.mem.heap_used_percent")?,
        cpu_percent: node.f64_at("os.cpu.percent")?,
        mem_used_percent: node.f64_at("os.mem.used_percent")?,
        disk_total_bytes,
        disk_free_bytes,
        disk_used_percent: used as f64 / disk_total_bytes as f64 * 100.0,
        disk_io_ops: node.opt_u64_at("fs.io_stats.total.operations")?,
        thread_pools,
        gc: GcTimes {
            young_millis: node.u64_at("jvm.gc.collectors.young.collection_time_in_millis")?,
            old_millis: node.u64_at("jvm.gc.collectors.old.collection_time_in_millis")?,
        },
        docs_count: node.u64_at("indices.docs.count")?,
        store_bytes: node.u64_at("indices.store.size_in_bytes")?,
    })
}

/// Sums thread-pool counters across all nodes, per pool name.
#[must_use]
pub fn thread_pool_totals(stats: &[NodeStats]) -> BTreeMap<String, ThreadPoolCounters> {
    let mut totals: BTreeMap<String, ThreadPoolCounters> = BTreeMap::new();
    for node in stats {
        for (pool, counters) in &node.thread_pools {
            let total = totals.entry(pool.clone()).or_default();
            total.rejected += counters.rejected;
            total.completed += counters.completed;
        }
    }
    totals
}
