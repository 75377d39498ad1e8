//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// esdiag - offline analysis of search-cluster diagnostic bundles.
#[derive(Parser, Debug, Clone)]
#[command(name = "esdiag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Threshold configuration file (TOML).
    #[arg(short, long, env = "ESDIAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable report.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Analyze a diagnostic bundle directory.
    Analyze(AnalyzeArgs),

    /// List the rules in execution order.
    Rules,
}

/// Arguments for the analyze command.
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Bundle directory.
    #[arg(required = true)]
    pub bundle: PathBuf,

    /// Where to write hot-thread blocks when there are enough of them.
    ///
    /// Defaults to `hot_threads_extract.txt` inside the bundle directory.
    #[arg(long, value_name = "FILE")]
    pub hot_threads_out: Option<PathBuf>,

    /// Only print findings that need attention.
    #[arg(long)]
    pub attention_only: bool,

    /// Exit with status 2 when any finding needs attention.
    #[arg(long)]
    pub fail_on_attention: bool,
}

impl AnalyzeArgs {
    /// File name of the default hot-thread export inside the bundle.
    pub const DEFAULT_HOT_THREADS_FILE: &'static str = "hot_threads_extract.txt";

    /// Resolved hot-thread export path.
    #[must_use]
    pub fn hot_threads_path(&self) -> PathBuf {
        self.hot_threads_out
            .clone()
            .unwrap_or_else(|| self.bundle.join(Self::DEFAULT_HOT_THREADS_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analyze_with_flags() {
        let cli = Cli::parse_from([
            "esdiag",
            "--format",
            "json",
            "analyze",
            "/tmp/diag",
            "--attention-only",
            "--fail-on-attention",
        ]);
        assert_eq!(cli.format, Format::Json);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.bundle, PathBuf::from("/tmp/diag"));
                assert!(args.attention_only);
                assert!(args.fail_on_attention);
            }
            Commands::Rules => panic!("expected analyze command"),
        }
    }

    #[test]
    fn default_hot_threads_path_is_inside_bundle() {
        let cli = Cli::parse_from(["esdiag", "analyze", "/tmp/diag"]);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze command");
        };
        assert_eq!(
            args.hot_threads_path(),
            PathBuf::from("/tmp/diag/hot_threads_extract.txt")
        );
    }

    #[test]
    fn explicit_hot_threads_path_wins() {
        let cli = Cli::parse_from([
            "esdiag",
            "analyze",
            "/tmp/diag",
            "--hot-threads-out",
            "/tmp/hot.txt",
        ]);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze command");
        };
        assert_eq!(args.hot_threads_path(), PathBuf::from("/tmp/hot.txt"));
    }

    #[test]
    fn parses_rules() {
        let cli = Cli::parse_from(["esdiag", "rules"]);
        assert!(matches!(cli.command, Commands::Rules));
        assert_eq!(cli.format, Format::Table);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
