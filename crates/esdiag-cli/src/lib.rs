//! # esdiag-cli
//!
//! Command-line front end for the esdiag analyzer.
//!
//! ## Commands
//!
//! - `analyze <bundle>` - run every rule over a bundle directory and print
//!   ATTENTION findings, chart series and OK findings
//! - `rules` - list the rules in execution order
//!
//! Thresholds come from a TOML file given with `--config` or `ESDIAG_CONFIG`.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::{Render, Renderer};
