//! Handler for `latbench report`.

use crate::commands::ReportArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use latbench::report::{append_history, load_reports};

/// Execute `latbench report`: append saved runs in a directory to the
/// history file, skipping runs it already lists.
pub fn execute_report(config: &CliConfig, args: &ReportArgs) -> CliResult<()> {
    if !args.results.is_dir() {
        return Err(CliError::invalid_argument(format!(
            "{} is not a directory",
            args.results.display()
        )));
    }

    let reports = load_reports(&args.results)?;
    tracing::info!(dir = %args.results.display(), count = reports.len(), "reports loaded");
    let quiet = config.verbosity.is_quiet();

    if reports.is_empty() {
        if !quiet {
            println!("No result files found in {}", args.results.display());
        }
        return Ok(());
    }

    let added = append_history(&args.output, &reports).map_err(|e| {
        CliError::report_generation(format!("cannot update {}: {e}", args.output.display()))
    })?;
    tracing::info!(path = %args.output.display(), added, "history updated");

    if !quiet {
        println!("Loaded {} result files", reports.len());
        if added == 0 {
            println!("{} is already up to date", args.output.display());
        } else {
            println!("Added {added} runs to {}", args.output.display());
        }
    }
    Ok(())
}
