//! Shard inventory extraction.
//!
//! The inventory is a JSON array of cat-shards rows. Counts arrive as
//! strings and are null for unassigned shards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Doc;
use crate::bundle::{Artifact, Bundle};
use crate::error::Result;

/// Bytes per gigabyte.
pub const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// One row of the shard inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardRecord {
    /// Index the shard belongs to.
    pub index: String,
    /// Shard number within the index.
    pub shard: Option<u32>,
    /// True for a primary, false for a replica.
    pub primary: bool,
    /// Node holding the shard; absent when unassigned.
    pub node: Option<String>,
    /// Documents in the shard.
    pub docs_count: Option<u64>,
    /// Store size in bytes.
    pub store_bytes: Option<u64>,
}

impl ShardRecord {
    /// Store size in gigabytes, if known.
    #[must_use]
    pub fn store_gb(&self) -> Option<f64> {
        self.store_bytes.map(|b| b as f64 / GB)
    }

    /// `index[shard]` plus the copy kind, e.g. `logs[0] primary`.
    #[must_use]
    pub fn label(&self) -> String {
        let copy = if self.primary { "primary" } else { "replica" };
        match self.shard {
            Some(shard) => format!("{}[{shard}] {copy}", self.index),
            None => format!("{} {copy}", self.index),
        }
    }
}

/// The full shard inventory, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShardInventory {
    records: Vec<ShardRecord>,
}

impl ShardInventory {
    /// Wraps already-extracted records.
    #[must_use]
    pub fn from_records(records: Vec<ShardRecord>) -> Self {
        Self { records }
    }

    /// All records.
    #[must_use]
    pub fn records(&self) -> &[ShardRecord] {
        &self.records
    }

    /// Total shard count, assigned or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the inventory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Store sizes in GB for shards that report one.
    #[must_use]
    pub fn store_sizes_gb(&self) -> Vec<f64> {
        self.records.iter().filter_map(ShardRecord::store_gb).collect()
    }

    /// Document counts in millions for shards that report one.
    #[must_use]
    pub fn docs_millions(&self) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| r.docs_count)
            .map(|d| d as f64 / 1024.0 / 1024.0)
            .collect()
    }

    /// Shards held per node; unassigned shards are not counted.
    #[must_use]
    pub fn count_by_node(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for node in self.records.iter().filter_map(|r| r.node.as_ref()) {
            *counts.entry(node.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Extracts the shard inventory.
pub fn extract(bundle: &impl Bundle) -> Result<ShardInventory> {
    let value = bundle.read_json(Artifact::Shards)?;
    parse(&value)
}

pub(crate) fn parse(value: &serde_json::Value) -> Result<ShardInventory> {
    let doc = Doc::root(Artifact::Shards, value);
    let rows = doc.as_array()?;
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let row_doc = doc.element(i, row);
        records.push(ShardRecord {
            index: row_doc.require("index")?.to_str()?.to_string(),
            shard: row_doc
                .opt_u64_at("shard")?
                .map(|s| {
                    u32::try_from(s)
                        .map_err(|_| row_doc.error("shard", "shard number out of range"))
                })
                .transpose()?,
            primary: row_doc
                .get("prirep")
                .map(|d| d.to_str().map(|p| p.eq_ignore_ascii_case("p")))
                .transpose()?
                .unwrap_or(false),
            node: optional_string(&row_doc, "node")?,
            docs_count: row_doc.opt_u64_at("docs")?,
            store_bytes: row_doc.opt_u64_at("store")?,
        });
    }

    Ok(ShardInventory { records })
}

fn optional_string(doc: &Doc<'_>, key: &str) -> Result<Option<String>> {
    doc.get(key)
        .map(|d| d.to_str().map(str::to_string))
        .transpose()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use serde_json::json;

    #[test]
    fn parses_cat_shards_rows() {
        let inventory = parse(&json!([
            {"index": "logs", "shard": "0", "prirep": "p", "state": "STARTED",
             "docs": "2048", "store": "1073741824", "node": "n1"},
            {"index": "logs", "shard": "0", "prirep": "r", "state": "UNASSIGNED",
             "docs": null, "store": null, "node": null}
        ]))
        .expect("valid shards");

        assert_eq!(inventory.len(), 2);
        let first = &inventory.records()[0];
        assert!(first.primary);
        assert_eq!(first.docs_count, Some(2048));
        assert!((first.store_gb().expect("sized") - 1.0).abs() < f64::EPSILON);

        let unassigned = &inventory.records()[1];
        assert!(!unassigned.primary);
        assert!(unassigned.node.is_none());
        assert!(unassigned.store_bytes.is_none());
    }

    #[test]
    fn labels_name_index_shard_and_copy() {
        let mut record = fixtures::shard_gb("n1", 1.0);
        record.shard = Some(3);
        assert_eq!(record.label(), "logs[3] primary");
        record.primary = false;
        record.shard = None;
        assert_eq!(record.label(), "logs replica");
    }

    #[test]
    fn counts_shards_by_node() {
        let inventory = ShardInventory::from_records(vec![
            fixtures::shard_gb("n1", 1.0),
            fixtures::shard_gb("n2", 1.0),
            fixtures::shard_gb("n1", 2.0),
        ]);
        let counts = inventory.count_by_node();
        assert_eq!(counts["n1"], 2);
        assert_eq!(counts["n2"], 1);
    }

    #[test]
    fn malformed_store_names_row() {
        let err = parse(&json!([{"index": "logs", "store": "12kb"}])).expect_err("bad store");
        assert!(matches!(
            err,
            AnalysisError::InvalidMetric { ref field, .. } if field == "[0].store"
        ));
    }

    #[test]
    fn non_array_document_is_invalid() {
        assert!(parse(&json!({"index": "logs"})).is_err());
    }
}
