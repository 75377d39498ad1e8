//! Field-data statistics extraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Doc;
use crate::bundle::{Artifact, Bundle};
use crate::error::Result;

/// Field-data memory per field, summed across nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FielddataStats {
    /// Bytes loaded per field name.
    pub field_sizes: BTreeMap<String, u64>,
}

impl FielddataStats {
    /// The `n` largest fields, largest first; ties break by name.
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        let mut sizes: Vec<(&str, u64)> = self
            .field_sizes
            .iter()
            .map(|(name, size)| (name.as_str(), *size))
            .collect();
        sizes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        sizes.truncate(n);
        sizes
    }

    /// Fields loaded into fielddata that hold zero bytes, in name order.
    #[must_use]
    pub fn zero_sized(&self) -> Vec<&str> {
        self.field_sizes
            .iter()
            .filter(|(_, size)| **size == 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Extracts field-data totals.
pub fn extract(bundle: &impl Bundle) -> Result<FielddataStats> {
    let value = bundle.read_json(Artifact::FielddataStats)?;
    parse(&value)
}

pub(crate) fn parse(value: &serde_json::Value) -> Result<FielddataStats> {
    let doc = Doc::root(Artifact::FielddataStats, value);
    let mut field_sizes: BTreeMap<String, u64> = BTreeMap::new();

    for (_, node) in doc.require("nodes")?.entries()? {
        let fielddata = node.require("indices.fielddata")?;
        // Nodes that never loaded fielddata omit `fields`.
        let Some(fields) = fielddata.get("fields") else {
            continue;
        };
        for (field, stats) in fields.entries()? {
            let size = stats.u64_at("memory_size_in_bytes")?;
            *field_sizes.entry(field.to_string()).or_insert(0) += size;
        }
    }

    Ok(FielddataStats { field_sizes })
}
