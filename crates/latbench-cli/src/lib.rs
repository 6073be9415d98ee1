//! Latbench CLI library
//!
//! Argument parsing, configuration layering, progress output and the
//! handlers behind the `latbench` binary.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{Cli, ColorArg, Commands, FormatArg, ReportArgs, RunArgs};
pub use config::{
    ApiKey, BenchFile, CliConfig, ColorChoice, RunSettings, Verbosity, ANTHROPIC_KEY_ENV,
    BEDROCK_KEY_ENV,
};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, ProgressReporter};
