//! Command implementations for the esdiag CLI.

mod analyze;
mod rules;

use std::path::Path;

use esdiag_analyzer::{AnalysisError, AnalyzerConfig};

use crate::error::CliError;

pub use analyze::AnalyzeCommand;
pub use rules::RulesCommand;

/// Loads thresholds from `path`, or the defaults when none is given.
///
/// # Errors
///
/// Returns [`CliError::Config`] if the file cannot be read, parsed or validated.
pub fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig, CliError> {
    let Some(path) = path else {
        return Ok(AnalyzerConfig::default());
    };
    AnalyzerConfig::from_file(path).map_err(|e| match e {
        AnalysisError::Config(msg) => CliError::Config(msg),
        other => CliError::Analysis(other),
    })
}
