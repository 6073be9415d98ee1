//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Latbench: compare LLM inference latency between AWS Bedrock and the direct Anthropic API
#[derive(Parser, Debug)]
#[command(name = "latbench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit log events as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a latency benchmark against Bedrock, optionally compared with the direct API
    Run(RunArgs),

    /// Append saved benchmark results to a Markdown history table
    Report(ReportArgs),
}

/// Arguments for the run command
///
/// Options left unset fall back to the `--config` file, then to built-in
/// defaults.
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// YAML file with benchmark settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also benchmark the direct Anthropic API and compare against it
    #[arg(long)]
    pub compare: bool,

    /// Region the benchmark is run from (recorded only)
    #[arg(long)]
    pub source_region: Option<String>,

    /// Bedrock region requests are sent to
    #[arg(long)]
    pub target_region: Option<String>,

    /// Bedrock model or inference profile id
    #[arg(long)]
    pub model_id: Option<String>,

    /// Model id for the direct Anthropic API
    #[arg(long)]
    pub direct_model_id: Option<String>,

    /// Requests per backend
    #[arg(short = 'n', long)]
    pub iterations: Option<usize>,

    /// Pause between consecutive requests, in milliseconds
    #[arg(long)]
    pub pause_ms: Option<u64>,

    /// Prompt text sent on every request
    #[arg(long)]
    pub prompt: Option<String>,

    /// Maximum tokens to generate per request
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Per-request timeout for Bedrock, in seconds
    #[arg(long)]
    pub bedrock_timeout_secs: Option<u64>,

    /// Per-request timeout for the direct API, in seconds
    #[arg(long)]
    pub direct_timeout_secs: Option<u64>,

    /// Bedrock API key
    #[arg(long, env = "AWS_BEARER_TOKEN_BEDROCK", hide_env_values = true)]
    pub bedrock_api_key: Option<String>,

    /// Anthropic API key (required with --compare)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// Override the Bedrock runtime endpoint
    #[arg(long)]
    pub bedrock_endpoint: Option<String>,

    /// Override the Anthropic API base URL
    #[arg(long)]
    pub direct_base_url: Option<String>,

    /// Directory for JSON and Markdown results
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Markdown file to append this run to
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Summary format on stdout
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the report command
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Directory with saved benchmark results
    pub results: PathBuf,

    /// Markdown file to append to
    #[arg(short, long, default_value = "performance.md")]
    pub output: PathBuf,
}

/// Summary output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum FormatArg {
    /// Human-readable tables
    #[default]
    Text,
    /// The full run report as JSON
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::ColorChoice;
    use crate::output::OutputFormat;

    fn run_args(cli: Cli) -> RunArgs {
        match cli.command {
            Commands::Run(args) => args,
            Commands::Report(_) => panic!("expected Run command"),
        }
    }

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_run_defaults() {
            let args = run_args(Cli::parse_from(["latbench", "run"]));
            assert!(!args.compare);
            assert!(args.iterations.is_none());
            assert!(args.config.is_none());
            assert!(matches!(args.format, FormatArg::Text));
        }

        #[test]
        fn test_parse_run_with_options() {
            let args = run_args(Cli::parse_from([
                "latbench",
                "run",
                "--compare",
                "--iterations",
                "3",
                "--pause-ms",
                "0",
                "--target-region",
                "us-west-2",
                "--format",
                "json",
            ]));
            assert!(args.compare);
            assert_eq!(args.iterations, Some(3));
            assert_eq!(args.pause_ms, Some(0));
            assert_eq!(args.target_region.as_deref(), Some("us-west-2"));
            assert!(matches!(args.format, FormatArg::Json));
        }

        #[test]
        fn test_parse_api_key_flag() {
            let args = run_args(Cli::parse_from([
                "latbench",
                "run",
                "--bedrock-api-key",
                "abc",
            ]));
            assert_eq!(args.bedrock_api_key.as_deref(), Some("abc"));
        }

        #[test]
        fn test_parse_report_command() {
            let cli = Cli::parse_from(["latbench", "report", "benchmark_results"]);
            if let Commands::Report(args) = cli.command {
                assert_eq!(args.results, PathBuf::from("benchmark_results"));
                assert_eq!(args.output, PathBuf::from("performance.md"));
            } else {
                panic!("expected Report command");
            }
        }

        #[test]
        fn test_global_flags() {
            let cli = Cli::parse_from(["latbench", "-vv", "--log-json", "--color", "never", "run"]);
            assert_eq!(cli.verbose, 2);
            assert!(cli.log_json);
            assert!(matches!(cli.color, ColorArg::Never));
        }

        #[test]
        fn test_global_quiet_flag() {
            let cli = Cli::parse_from(["latbench", "run", "-q"]);
            assert!(cli.quiet);
        }

        #[test]
        fn test_verify_cli() {
            use clap::CommandFactory;
            Cli::command().debug_assert();
        }
    }

    mod conversion_tests {
        use super::*;

        #[test]
        fn test_color_arg_conversion() {
            assert!(matches!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto));
            assert!(matches!(ColorChoice::from(ColorArg::Always), ColorChoice::Always));
            assert!(matches!(ColorChoice::from(ColorArg::Never), ColorChoice::Never));
        }

        #[test]
        fn test_format_arg_conversion() {
            assert_eq!(OutputFormat::from(FormatArg::Text), OutputFormat::Text);
            assert_eq!(OutputFormat::from(FormatArg::Json), OutputFormat::Json);
        }
    }
}
