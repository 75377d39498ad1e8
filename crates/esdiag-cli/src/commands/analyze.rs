//! Bundle analysis command.

use std::io::Write;

use esdiag_analyzer::{Analyzer, AnalyzerConfig, DirectoryBundle, FileSink};
use tracing::debug;

use crate::cli::AnalyzeArgs;
use crate::error::CliError;
use crate::output::Renderer;

/// Analyze command executor.
pub struct AnalyzeCommand {
    analyzer: Analyzer,
}

impl AnalyzeCommand {
    /// Create a new analyze command with the given thresholds.
    #[must_use]
    pub const fn new(config: AnalyzerConfig) -> Self {
        Self {
            analyzer: Analyzer::with_config(config),
        }
    }

    /// Analyze the bundle named in `args` and write the report.
    ///
    /// Returns true if any finding needs attention.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be read or output fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        renderer: &Renderer,
        args: &AnalyzeArgs,
    ) -> Result<bool, CliError> {
        let bundle = DirectoryBundle::open(&args.bundle)?;
        let mut sink = FileSink::new(args.hot_threads_path());
        debug!(
            bundle = %bundle.root().display(),
            hot_threads_out = %sink.path().display(),
            "analyzing bundle"
        );

        let mut report = self.analyzer.analyze(&bundle, Some(&mut sink))?;
        if args.attention_only {
            report.ok.clear();
        }

        renderer.render(writer, &report)?;
        Ok(report.has_attention())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use std::path::PathBuf;

    fn args(bundle: PathBuf) -> AnalyzeArgs {
        AnalyzeArgs {
            bundle,
            hot_threads_out: None,
            attention_only: false,
            fail_on_attention: false,
        }
    }

    #[test]
    fn missing_bundle_is_an_error() {
        let cmd = AnalyzeCommand::new(AnalyzerConfig::default());
        let mut out = Vec::new();
        let err = cmd
            .execute(
                &mut out,
                &Renderer::new(Format::Json),
                &args(PathBuf::from("/nonexistent/diag")),
            )
            .expect_err("no bundle");
        assert!(err.to_string().contains("/nonexistent/diag"));
        assert!(out.is_empty());
    }

    #[test]
    fn empty_bundle_names_first_missing_artifact() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cmd = AnalyzeCommand::new(AnalyzerConfig::default());
        let mut out = Vec::new();
        let err = cmd
            .execute(&mut out, &Renderer::default(), &args(dir.path().to_path_buf()))
            .expect_err("empty bundle");
        assert!(matches!(err, CliError::Analysis(_)));
        assert!(err.to_string().contains("cluster_health.json"));
    }
}
