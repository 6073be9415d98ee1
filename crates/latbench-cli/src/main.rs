//! Latbench CLI: latency benchmarking for LLM inference backends
//!
//! ## Usage
//!
//! ```bash
//! latbench run                              # Bedrock only
//! latbench run --compare --iterations 20    # Bedrock vs direct API
//! latbench report benchmark_results         # Append saved runs to performance.md
//! ```

use clap::Parser;
use latbench_cli::{
    handlers, logging, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    // Optional; existing environment variables are not overridden.
    dotenvy::dotenv().ok();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(&config);

    match cli.command {
        Commands::Run(args) => {
            // Trials run one at a time.
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| CliError::config(format!("failed to create async runtime: {e}")))?;
            rt.block_on(handlers::execute_run(&config, args))
        }
        Commands::Report(args) => handlers::execute_report(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(color)
        .with_log_json(cli.log_json)
}
