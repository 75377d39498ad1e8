//! esdiag binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use esdiag_cli::cli::{Cli, Commands};
use esdiag_cli::commands::{load_config, AnalyzeCommand, RulesCommand};
use esdiag_cli::output::Renderer;

/// Exit status when `--fail-on-attention` is set and findings need attention.
const ATTENTION_EXIT: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, esdiag_cli::CliError> {
    let renderer = Renderer::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Analyze(args) => {
            let config = load_config(cli.config.as_deref())?;
            let has_attention = AnalyzeCommand::new(config).execute(&mut stdout, &renderer, &args)?;
            if args.fail_on_attention && has_attention {
                return Ok(ExitCode::from(ATTENTION_EXIT));
            }
        }
        Commands::Rules => {
            RulesCommand.execute(&mut stdout, &renderer)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["esdiag", "-c", "/etc/esdiag.toml", "analyze", "/tmp/diag"]);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/etc/esdiag.toml")));
    }

    #[test]
    fn rules_needs_no_config() {
        let cli = Cli::parse_from(["esdiag", "--format", "json", "rules"]);
        assert!(matches!(cli.command, Commands::Rules));
    }
}
