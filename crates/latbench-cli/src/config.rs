//! CLI configuration
//!
//! Run settings resolve in three layers: command-line flags (and their
//! environment variables) win over the YAML config file, which wins over
//! built-in defaults.

use crate::commands::RunArgs;
use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;
use latbench::Prompt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the Bedrock API key
pub const BEDROCK_KEY_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Environment variable holding the Anthropic API key
pub const ANTHROPIC_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Default region the benchmark runs from
pub const DEFAULT_SOURCE_REGION: &str = "eu-north-1";

/// Default results directory
pub const DEFAULT_OUTPUT_DIR: &str = "benchmark_results";

/// Default pause between requests, in milliseconds
pub const DEFAULT_PAUSE_MS: u64 = 1000;

/// Default per-request timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - per-request progress
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Map `-v` count and `-q` to a level
    #[must_use]
    pub const fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default log filter directive for this level
    #[must_use]
    pub const fn log_level(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

/// Global CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Log events as JSON
    pub log_json: bool,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set JSON logging
    #[must_use]
    pub const fn with_log_json(mut self, log_json: bool) -> Self {
        self.log_json = log_json;
        self
    }
}

/// Benchmark settings loaded from a YAML file.
///
/// Every field is optional. API keys are deliberately absent; they come from
/// flags or the environment only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchFile {
    /// Also benchmark the direct API
    pub compare: Option<bool>,
    /// Region the benchmark is run from
    pub source_region: Option<String>,
    /// Bedrock region
    pub target_region: Option<String>,
    /// Bedrock model id
    pub model_id: Option<String>,
    /// Direct API model id
    pub direct_model_id: Option<String>,
    /// Requests per backend
    pub iterations: Option<usize>,
    /// Pause between requests
    pub pause_ms: Option<u64>,
    /// Prompt text
    pub prompt: Option<String>,
    /// Token budget
    pub max_tokens: Option<u32>,
    /// Bedrock timeout
    pub bedrock_timeout_secs: Option<u64>,
    /// Direct API timeout
    pub direct_timeout_secs: Option<u64>,
    /// Bedrock endpoint override
    pub bedrock_endpoint: Option<String>,
    /// Direct API base URL override
    pub direct_base_url: Option<String>,
    /// Results directory
    pub output_dir: Option<PathBuf>,
    /// History file
    pub history: Option<PathBuf>,
}

impl BenchFile {
    /// Parse YAML text
    pub fn from_yaml(yaml: &str) -> CliResult<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| CliError::config(format!("invalid config: {e}")))
    }

    /// Load from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }
}

/// An API key that never appears in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// The key itself
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn from_option(value: Option<String>) -> Option<Self> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Self)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Fully resolved settings for one `run` invocation.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Also benchmark the direct API
    pub compare: bool,
    /// Region the benchmark is run from
    pub source_region: String,
    /// Bedrock region
    pub target_region: String,
    /// Bedrock model id
    pub model_id: String,
    /// Direct API model id
    pub direct_model_id: String,
    /// Requests per backend
    pub iterations: usize,
    /// Pause between requests
    pub pause: Duration,
    /// Prompt payload
    pub prompt: Prompt,
    /// Bedrock per-request timeout
    pub bedrock_timeout: Duration,
    /// Direct API per-request timeout
    pub direct_timeout: Duration,
    /// Bedrock endpoint override
    pub bedrock_endpoint: Option<String>,
    /// Direct API base URL override
    pub direct_base_url: Option<String>,
    /// Results directory
    pub output_dir: PathBuf,
    /// History file
    pub history: Option<PathBuf>,
    /// Summary format
    pub format: OutputFormat,
    /// Bedrock credential
    pub bedrock_api_key: ApiKey,
    /// Direct API credential, present whenever `compare` is set
    pub anthropic_api_key: Option<ApiKey>,
}

impl RunSettings {
    /// Resolve flags over file over defaults, then validate.
    pub fn resolve(args: RunArgs, file: BenchFile) -> CliResult<Self> {
        let compare = args.compare || file.compare.unwrap_or(false);

        let iterations = args
            .iterations
            .or(file.iterations)
            .unwrap_or(latbench::runner::DEFAULT_TRIALS);
        if iterations == 0 {
            return Err(CliError::invalid_argument(
                "iterations must be at least 1",
            ));
        }

        let max_tokens = args
            .max_tokens
            .or(file.max_tokens)
            .unwrap_or(latbench::backend::DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(CliError::invalid_argument("max tokens must be at least 1"));
        }
        let prompt = Prompt::new(
            args.prompt
                .or(file.prompt)
                .unwrap_or_else(|| latbench::backend::DEFAULT_PROMPT.to_string()),
        )
        .with_max_tokens(max_tokens);

        let bedrock_api_key = ApiKey::from_option(args.bedrock_api_key).ok_or_else(|| {
            CliError::config(format!(
                "missing Bedrock API key: set {BEDROCK_KEY_ENV} or pass --bedrock-api-key"
            ))
        })?;
        let anthropic_api_key = ApiKey::from_option(args.anthropic_api_key);
        if compare && anthropic_api_key.is_none() {
            return Err(CliError::config(format!(
                "--compare needs an Anthropic API key: set {ANTHROPIC_KEY_ENV} or pass --anthropic-api-key"
            )));
        }

        Ok(Self {
            compare,
            source_region: args
                .source_region
                .or(file.source_region)
                .unwrap_or_else(|| DEFAULT_SOURCE_REGION.to_string()),
            target_region: args
                .target_region
                .or(file.target_region)
                .unwrap_or_else(|| latbench::backend::bedrock::DEFAULT_TARGET_REGION.to_string()),
            model_id: args
                .model_id
                .or(file.model_id)
                .unwrap_or_else(|| latbench::backend::bedrock::DEFAULT_MODEL_ID.to_string()),
            direct_model_id: args
                .direct_model_id
                .or(file.direct_model_id)
                .unwrap_or_else(|| latbench::backend::anthropic::DEFAULT_MODEL.to_string()),
            iterations,
            pause: Duration::from_millis(
                args.pause_ms.or(file.pause_ms).unwrap_or(DEFAULT_PAUSE_MS),
            ),
            prompt,
            bedrock_timeout: timeout(args.bedrock_timeout_secs.or(file.bedrock_timeout_secs))?,
            direct_timeout: timeout(args.direct_timeout_secs.or(file.direct_timeout_secs))?,
            bedrock_endpoint: args.bedrock_endpoint.or(file.bedrock_endpoint),
            direct_base_url: args.direct_base_url.or(file.direct_base_url),
            output_dir: args
                .output_dir
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            history: args.history.or(file.history),
            format: args.format.into(),
            bedrock_api_key,
            anthropic_api_key,
        })
    }
}

fn timeout(secs: Option<u64>) -> CliResult<Duration> {
    match secs.unwrap_or(DEFAULT_TIMEOUT_SECS) {
        0 => Err(CliError::invalid_argument("timeout must be at least 1 second")),
        s => Ok(Duration::from_secs(s)),
    }
}
