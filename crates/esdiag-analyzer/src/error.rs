//! Error types for the esdiag-analyzer crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::bundle::Artifact;

/// Errors that can occur while analyzing a diagnostic bundle.
///
/// Every variant raised while reading the bundle names the artifact (and,
/// for malformed metrics, the JSON path) that caused it.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The bundle directory does not exist or is not a directory.
    #[error("bundle not found: {}", path.display())]
    BundleNotFound {
        /// The path that was given as the bundle root.
        path: PathBuf,
    },

    /// A required artifact is absent from the bundle.
    #[error("missing required artifact: {artifact}")]
    MissingArtifact {
        /// The artifact that was not found.
        artifact: Artifact,
    },

    /// A document is present but a metric is missing or malformed.
    #[error("invalid metric in {artifact} at `{field}`: {reason}")]
    InvalidMetric {
        /// The artifact holding the metric.
        artifact: Artifact,
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with the value.
        reason: String,
    },

    /// Reading an artifact failed.
    #[error("failed to read {artifact}: {source}")]
    Io {
        /// The artifact being read.
        artifact: Artifact,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An artifact is not valid JSON.
    #[error("malformed JSON in {artifact}: {source}")]
    Json {
        /// The artifact being parsed.
        artifact: Artifact,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing hot-thread blocks to the export sink failed.
    #[error("failed to export hot threads to {location}: {source}")]
    SinkWrite {
        /// Where the blocks were being written.
        location: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid analyzer configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Builds an [`AnalysisError::InvalidMetric`].
    pub fn invalid_metric(
        artifact: Artifact,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidMetric {
            artifact,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error must abort the run.
    ///
    /// Only sink failures are recoverable: the export is best-effort.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::SinkWrite { .. })
    }
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
