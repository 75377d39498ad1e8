//! Index settings extraction.

use serde::{Deserialize, Serialize};

use super::Doc;
use crate::bundle::{Artifact, Bundle};
use crate::error::Result;

/// Interval applied when an index does not set one.
pub const DEFAULT_REFRESH_INTERVAL: &str = "1s";

/// The settings of one index that the rules read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Index name.
    pub index: String,
    /// Explicit refresh interval, if set.
    pub refresh_interval: Option<String>,
    /// Configured replica count, if set.
    pub number_of_replicas: Option<u32>,
}

impl IndexSettings {
    /// Returns true if the index refreshes on the default interval.
    #[must_use]
    pub fn uses_default_refresh(&self) -> bool {
        self.refresh_interval
            .as_deref()
            .is_none_or(|interval| interval == DEFAULT_REFRESH_INTERVAL)
    }
}

/// Extracts index settings, sorted by index name.
pub fn extract(bundle: &impl Bundle) -> Result<Vec<IndexSettings>> {
    let value = bundle.read_json(Artifact::Settings)?;
    parse(&value)
}

pub(crate) fn parse(value: &serde_json::Value) -> Result<Vec<IndexSettings>> {
    let doc = Doc::root(Artifact::Settings, value);
    let mut indices = Vec::new();

    for (index, entry) in doc.entries()? {
        let settings = entry.require("settings.index")?;
        let number_of_replicas = settings
            .opt_u64_at("number_of_replicas")?
            .map(|n| {
                u32::try_from(n)
                    .map_err(|_| settings.error("number_of_replicas", "replica count out of range"))
            })
            .transpose()?;

        indices.push(IndexSettings {
            index: index.to_string(),
            refresh_interval: settings
                .get("refresh_interval")
                .map(|d| d.to_str().map(str::to_string))
                .transpose()?,
            number_of_replicas,
        });
    }

    indices.sort_by(|a, b| a.index.cmp(&b.index));
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use serde_json::json;

    #[test]
    fn parses_refresh_and_replicas() {
        let indices = parse(&json!({
            "logs": {"settings": {"index": {"refresh_interval": "30s", "number_of_replicas": "1"}}},
            "metrics": {"settings": {"index": {"number_of_replicas": "0"}}}
        }))
        .expect("valid settings");

        assert_eq!(indices.len(), 2);
        assert_eq!(indices[0].index, "logs");
        assert!(!indices[0].uses_default_refresh());
        assert_eq!(indices[1].number_of_replicas, Some(0));
        assert!(indices[1].uses_default_refresh());
    }

    #[test]
    fn explicit_one_second_counts_as_default() {
        let settings = IndexSettings {
            index: "a".to_string(),
            refresh_interval: Some("1s".to_string()),
            number_of_replicas: None,
        };
        assert!(settings.uses_default_refresh());
    }

    #[test]
    fn missing_index_block_is_invalid() {
        let err = parse(&json!({"logs": {"settings": {}}})).expect_err("no index block");
        assert!(matches!(
            err,
            AnalysisError::InvalidMetric { ref field, .. } if field == "logs.settings.index"
        ));
    }
}
