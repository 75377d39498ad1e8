//! Cluster health extraction.

use serde::{Deserialize, Serialize};

use super::Doc;
use crate::bundle::{Artifact, Bundle};
use crate::error::Result;

/// The subset of the cluster health document the rules read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHealth {
    /// Cluster name, if reported.
    pub cluster_name: Option<String>,
    /// Lowercase status word: `green`, `yellow` or `red`.
    pub status: String,
    /// Node count, if reported.
    pub number_of_nodes: Option<u64>,
    /// Shards not allocated to any node.
    pub unassigned_shards: u64,
}

impl ClusterHealth {
    /// Returns true for a green cluster.
    #[must_use]
    pub fn is_green(&self) -> bool {
        self.status == "green"
    }
}

/// Extracts cluster health from the bundle.
pub fn extract(bundle: &impl Bundle) -> Result<ClusterHealth> {
    let value = bundle.read_json(Artifact::ClusterHealth)?;
    parse(&value)
}

pub(crate) fn parse(value: &serde_json::Value) -> Result<ClusterHealth> {
    let doc = Doc::root(Artifact::ClusterHealth, value);
    Ok(ClusterHealth {
        cluster_name: doc
            .get("cluster_name")
            .map(|d| d.to_str().map(str::to_string))
            .transpose()?,
        status: doc.require("status")?.to_str()?.to_ascii_lowercase(),
        number_of_nodes: doc.opt_u64_at("number_of_nodes")?,
        unassigned_shards: doc.u64_at("unassigned_shards")?,
    })
}
