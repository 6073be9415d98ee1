//! Output formatting and progress reporting

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use latbench::{BackendId, BenchEvent, Summary, Trial};
use serde::{Deserialize, Serialize};

/// Output format for the run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Progress reporter for benchmark execution.
///
/// Everything goes to stderr so stdout stays clean for the summary.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Route a benchmark event to the matching display update
    pub fn on_event(&mut self, event: BenchEvent<'_>) {
        match event {
            BenchEvent::BackendStarted { backend, trials } => {
                self.start_backend(backend, trials);
            }
            BenchEvent::TrialFinished { trial, .. } => self.trial_finished(trial),
            BenchEvent::BackendFinished { summary } => self.finish_backend(summary),
        }
    }

    /// Start a progress bar for one backend
    pub fn start_backend(&mut self, backend: BackendId, trials: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(trials as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix:>10} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_prefix(backend.label());
        self.progress_bar = Some(pb);
    }

    /// Advance the bar by one finished trial
    pub fn trial_finished(&self, trial: &Trial) {
        if let Some(ref pb) = self.progress_bar {
            let message = match trial.error() {
                None => format!("{:.2}s", trial.elapsed_secs()),
                Some(error) => format!("failed: {}", truncate(error, 60)),
            };
            pb.set_message(message);
            pb.inc(1);
        }
    }

    /// Close the bar with the backend's tally
    pub fn finish_backend(&mut self, summary: &Summary) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_with_message(format!(
                "{} ok, {} failed",
                summary.success_count(),
                summary.failure_count()
            ));
        }
        if summary.success_count() == 0 {
            self.warning(&format!(
                "{}: no successful requests, latency metrics unavailable",
                summary.backend().label()
            ));
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
