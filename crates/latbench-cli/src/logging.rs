//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the level follows `-q`/`-v`.
//! Events always go to stderr.

use crate::config::CliConfig;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
#[must_use]
pub fn default_filter(config: &CliConfig) -> String {
    let level = config.verbosity.log_level();
    format!("latbench={level},latbench_cli={level}")
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.color.should_color());

    let _ = if config.log_json {
        builder.json().with_ansi(false).try_init()
    } else {
        builder.with_target(false).try_init()
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Verbosity;

    #[test]
    fn test_default_filter_follows_verbosity() {
        let quiet = CliConfig::new().with_verbosity(Verbosity::Quiet);
        assert_eq!(default_filter(&quiet), "latbench=error,latbench_cli=error");

        let debug = CliConfig::new().with_verbosity(Verbosity::Debug);
        assert!(default_filter(&debug).contains("latbench=debug"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = CliConfig::new();
        init(&config);
        init(&config.with_log_json(true));
    }
}
