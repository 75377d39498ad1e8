//! Access to the artifacts of a diagnostic bundle.
//!
//! A bundle is a directory of captured documents for one cluster snapshot.
//! Artifacts are addressed by logical name ([`Artifact`]); the [`Bundle`]
//! trait resolves them to raw text, parsed JSON, or a byte size.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{AnalysisError, Result};

/// Logical names of the artifacts read from a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    /// Cluster health document.
    ClusterHealth,
    /// Node info document (JVM flags, names).
    NodeInfo,
    /// Node stats document (resource usage, thread pools, GC).
    NodeStats,
    /// Shard inventory rows.
    Shards,
    /// Per-index settings.
    Settings,
    /// Per-index field mappings.
    Mappings,
    /// Field-data memory stats per node.
    FielddataStats,
    /// Plain-text hot-threads dump.
    HotThreads,
    /// Serialized cluster state; only its size is used.
    ClusterState,
    /// Pending cluster tasks.
    PendingTasks,
}

impl Artifact {
    /// Every artifact, in load order.
    pub const ALL: [Self; 10] = [
        Self::ClusterHealth,
        Self::NodeInfo,
        Self::NodeStats,
        Self::Shards,
        Self::Settings,
        Self::Mappings,
        Self::FielddataStats,
        Self::HotThreads,
        Self::ClusterState,
        Self::PendingTasks,
    ];

    /// File name of the artifact inside the bundle directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::ClusterHealth => "cluster_health.json",
            Self::NodeInfo => "nodes.json",
            Self::NodeStats => "nodes_stats.json",
            Self::Shards => "shards.json",
            Self::Settings => "settings.json",
            Self::Mappings => "mapping.json",
            Self::FielddataStats => "fielddata_stats.json",
            Self::HotThreads => "nodes_hot_threads.txt",
            Self::ClusterState => "cluster_state.json",
            Self::PendingTasks => "cluster_pending_tasks.json",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ClusterHealth => "cluster health",
            Self::NodeInfo => "node info",
            Self::NodeStats => "node stats",
            Self::Shards => "shard inventory",
            Self::Settings => "index settings",
            Self::Mappings => "field mappings",
            Self::FielddataStats => "field-data stats",
            Self::HotThreads => "hot threads",
            Self::ClusterState => "cluster state",
            Self::PendingTasks => "pending tasks",
        }
    }

    /// Returns true if the run must fail when this artifact is absent.
    #[must_use]
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::PendingTasks)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.file_name())
    }
}

/// Read-only access to the artifacts of one bundle.
pub trait Bundle {
    /// Returns true if the artifact is present.
    fn contains(&self, artifact: Artifact) -> bool;

    /// Reads an artifact as text.
    ///
    /// Fails with [`AnalysisError::MissingArtifact`] when it is absent.
    fn read_text(&self, artifact: Artifact) -> Result<String>;

    /// Returns the artifact's size in bytes.
    fn size_bytes(&self, artifact: Artifact) -> Result<u64>;

    /// Reads and parses an artifact as JSON.
    fn read_json(&self, artifact: Artifact) -> Result<Value> {
        let text = self.read_text(artifact)?;
        serde_json::from_str(&text).map_err(|source| AnalysisError::Json { artifact, source })
    }

    /// Reads a JSON artifact according to its catalogue entry.
    ///
    /// A required artifact must be present; an optional one yields `None`
    /// when the bundle does not carry it.
    fn load_json(&self, artifact: Artifact) -> Result<Option<Value>> {
        if artifact.is_required() || self.contains(artifact) {
            self.read_json(artifact).map(Some)
        } else {
            debug!(%artifact, "optional artifact absent");
            Ok(None)
        }
    }

    /// Fails with the first required artifact, in load order, that is absent.
    fn check_required(&self) -> Result<()> {
        match Artifact::ALL
            .into_iter()
            .find(|a| a.is_required() && !self.contains(*a))
        {
            Some(artifact) => Err(AnalysisError::MissingArtifact { artifact }),
            None => Ok(()),
        }
    }
}

/// A bundle backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    /// Opens a bundle directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(AnalysisError::BundleNotFound {
                path: root.to_path_buf(),
            });
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// The bundle root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of an artifact inside the bundle.
    #[must_use]
    pub fn path_of(&self, artifact: Artifact) -> PathBuf {
        self.root.join(artifact.file_name())
    }

    fn map_io(artifact: Artifact, source: std::io::Error) -> AnalysisError {
        if source.kind() == ErrorKind::NotFound {
            AnalysisError::MissingArtifact { artifact }
        } else {
            AnalysisError::Io { artifact, source }
        }
    }
}

impl Bundle for DirectoryBundle {
    fn contains(&self, artifact: Artifact) -> bool {
        self.path_of(artifact).is_file()
    }

    fn read_text(&self, artifact: Artifact) -> Result<String> {
        let path = self.path_of(artifact);
        debug!(path = %path.display(), "reading artifact");
        fs::read_to_string(&path).map_err(|e| Self::map_io(artifact, e))
    }

    fn size_bytes(&self, artifact: Artifact) -> Result<u64> {
        fs::metadata(self.path_of(artifact))
            .map(|m| m.len())
            .map_err(|e| Self::map_io(artifact, e))
    }
}

/// A bundle held in memory. Useful for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryBundle {
    artifacts: HashMap<Artifact, String>,
}

impl MemoryBundle {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text artifact.
    #[must_use]
    pub fn with_text(mut self, artifact: Artifact, text: impl Into<String>) -> Self {
        self.artifacts.insert(artifact, text.into());
        self
    }

    /// Adds a JSON artifact.
    #[must_use]
    pub fn with_json(self, artifact: Artifact, value: &Value) -> Self {
        self.with_text(artifact, value.to_string())
    }

    /// Removes an artifact.
    #[must_use]
    pub fn without(mut self, artifact: Artifact) -> Self {
        self.artifacts.remove(&artifact);
        self
    }
}

impl Bundle for MemoryBundle {
    fn contains(&self, artifact: Artifact) -> bool {
        self.artifacts.contains_key(&artifact)
    }

    fn read_text(&self, artifact: Artifact) -> Result<String> {
        self.artifacts
            .get(&artifact)
            .cloned()
            .ok_or(AnalysisError::MissingArtifact { artifact })
    }

    fn size_bytes(&self, artifact: Artifact) -> Result<u64> {
        self.artifacts
            .get(&artifact)
            .map(|text| text.len() as u64)
            .ok_or(AnalysisError::MissingArtifact { artifact })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod artifact_tests {
        use super::*;

        #[test]
        fn only_pending_tasks_is_optional() {
            let optional: Vec<Artifact> = Artifact::ALL
                .into_iter()
                .filter(|a| !a.is_required())
                .collect();
            assert_eq!(optional, vec![Artifact::PendingTasks]);
        }

        #[test]
        fn file_names_are_unique() {
            let mut names: Vec<&str> = Artifact::ALL.iter().map(|a| a.file_name()).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), Artifact::ALL.len());
        }
    }

    mod memory_bundle_tests {
        use super::*;

        #[test]
        fn missing_artifact_is_reported() {
            let bundle = MemoryBundle::new();
            let err = bundle
                .read_json(Artifact::ClusterHealth)
                .expect_err("should be missing");
            assert!(matches!(
                err,
                AnalysisError::MissingArtifact {
                    artifact: Artifact::ClusterHealth
                }
            ));
        }

        #[test]
        fn optional_artifact_absent_is_none() {
            let bundle = MemoryBundle::new();
            let doc = bundle
                .load_json(Artifact::PendingTasks)
                .expect("absence is not an error");
            assert!(doc.is_none());
        }

        #[test]
        fn required_artifact_absent_is_an_error() {
            let err = MemoryBundle::new()
                .load_json(Artifact::Settings)
                .expect_err("settings are required");
            assert!(matches!(
                err,
                AnalysisError::MissingArtifact {
                    artifact: Artifact::Settings
                }
            ));
        }

        #[test]
        fn check_required_names_first_absent_artifact() {
            let mut bundle = MemoryBundle::new();
            for artifact in Artifact::ALL {
                bundle = bundle.with_text(artifact, "{}");
            }
            bundle
                .clone()
                .without(Artifact::PendingTasks)
                .check_required()
                .expect("pending tasks are optional");

            let err = bundle
                .without(Artifact::Mappings)
                .without(Artifact::ClusterState)
                .check_required()
                .expect_err("mappings are required");
            assert!(matches!(
                err,
                AnalysisError::MissingArtifact {
                    artifact: Artifact::Mappings
                }
            ));
        }

        #[test]
        fn malformed_json_names_artifact() {
            let bundle = MemoryBundle::new().with_text(Artifact::Settings, "{oops");
            let err = bundle.read_json(Artifact::Settings).expect_err("bad json");
            assert!(matches!(
                err,
                AnalysisError::Json {
                    artifact: Artifact::Settings,
                    ..
                }
            ));
        }

        #[test]
        fn size_is_text_length() {
            let bundle = MemoryBundle::new().with_json(Artifact::ClusterState, &json!({"a": 1}));
            assert_eq!(
                bundle.size_bytes(Artifact::ClusterState).expect("present"),
                7
            );
        }
    }

    mod directory_bundle_tests {
        use super::*;

        #[test]
        fn open_rejects_missing_directory() {
            let err = DirectoryBundle::open("/definitely/not/a/bundle").expect_err("no dir");
            assert!(matches!(err, AnalysisError::BundleNotFound { .. }));
        }

        #[test]
        fn reads_text_and_size() {
            let dir = tempfile::tempdir().expect("tempdir");
            fs::write(dir.path().join("cluster_state.json"), "{\"x\":true}").expect("write");

            let bundle = DirectoryBundle::open(dir.path()).expect("open");
            assert!(bundle.contains(Artifact::ClusterState));
            assert!(!bundle.contains(Artifact::ClusterHealth));
            assert_eq!(bundle.size_bytes(Artifact::ClusterState).expect("size"), 10);

            let err = bundle
                .read_text(Artifact::ClusterHealth)
                .expect_err("absent");
            assert!(matches!(err, AnalysisError::MissingArtifact { .. }));
        }
    }
}
