//! Trial Runner: N sequential calls against one backend.
//!
//! Calls are awaited one at a time. Concurrent requests would let one
//! call's network contention or rate limiting leak into another's latency,
//! so there is no parallel mode.

use crate::backend::Prompt;
use crate::caller::{BackendCaller, Trial};
use crate::result::{BenchError, BenchResult};
use std::time::Duration;

/// Default number of trials per backend.
pub const DEFAULT_TRIALS: usize = 10;

/// Default pause between consecutive calls.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// Trial runner settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Calls per backend
    pub trials: usize,
    /// Pause between consecutive calls (none after the last)
    pub pause: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            pause: DEFAULT_PAUSE,
        }
    }
}

impl RunnerConfig {
    /// Set the trial count
    #[must_use]
    pub const fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Set the pause between calls
    #[must_use]
    pub const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Reject settings that cannot produce a measurement
    pub fn validate(&self) -> BenchResult<()> {
        if self.trials == 0 {
            return Err(BenchError::configuration("trial count must be at least 1"));
        }
        Ok(())
    }
}

/// Runs trials sequentially.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrialRunner {
    config: RunnerConfig,
}

impl TrialRunner {
    /// Create a runner
    pub fn new(config: RunnerConfig) -> BenchResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runner settings
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run all trials against one backend
    pub async fn run(&self, caller: &BackendCaller, prompt: &Prompt) -> Vec<Trial> {
        self.run_observed(caller, prompt, |_, _| {}).await
    }

    /// Run all trials, notifying `observer` with the 1-based index after each
    pub async fn run_observed<F>(
        &self,
        caller: &BackendCaller,
        prompt: &Prompt,
        mut observer: F,
    ) -> Vec<Trial>
    where
        F: FnMut(usize, &Trial),
    {
        let backend = caller.backend_id();
        let total = self.config.trials;
        let mut trials = Vec::with_capacity(total);

        tracing::info!(%backend, model = caller.model(), trials = total, "starting trials");

        for index in 1..=total {
            let trial = caller.call(prompt).await;
            let elapsed_ms = trial.elapsed_secs() * 1000.0;
            match trial.error() {
                None => tracing::info!(%backend, trial = index, elapsed_ms, "trial succeeded"),
                Some(error) => {
                    tracing::warn!(%backend, trial = index, elapsed_ms, error, "trial failed");
                }
            }
            observer(index, &trial);
            trials.push(trial);

            if index < total && !self.config.pause.is_zero() {
                tokio::time::sleep(self.config.pause).await;
            }
        }

        trials
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::backend::{BackendId, ScriptedBackend};

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.trials, 10);
        assert_eq!(config.pause, Duration::from_secs(1));
    }

    #[test]
    fn test_zero_trials_rejected() {
        let err = TrialRunner::new(RunnerConfig::default().with_trials(0)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_n_trials_in_order() {
        let backend = ScriptedBackend::new(BackendId::Bedrock)
            .succeed_after_secs(1.0)
            .fail_with_status(500)
            .succeed_after_secs(3.0);
        let caller = BackendCaller::new(backend);
        let runner = TrialRunner::new(RunnerConfig::default().with_trials(3)).unwrap();

        let trials = runner.run(&caller, &Prompt::default()).await;

        assert_eq!(trials.len(), 3);
        assert!(trials[0].is_success());
        assert!(!trials[1].is_success());
        assert!(trials[2].is_success());
        assert!((trials[0].elapsed_secs() - 1.0).abs() < 0.01);
        assert!((trials[2].elapsed_secs() - 3.0).abs() < 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_only_between_calls() {
        let backend = ScriptedBackend::new(BackendId::Anthropic)
            .succeed_after_secs(0.0)
            .succeed_after_secs(0.0)
            .succeed_after_secs(0.0);
        let caller = BackendCaller::new(backend);
        let runner = TrialRunner::new(
            RunnerConfig::default()
                .with_trials(3)
                .with_pause(Duration::from_secs(5)),
        )
        .unwrap();

        let start = tokio::time::Instant::now();
        runner.run(&caller, &Prompt::default()).await;
        let waited = start.elapsed();

        // Two pauses for three calls.
        assert!(waited >= Duration::from_secs(10));
        assert!(waited < Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_observer_sees_every_trial() {
        let backend = ScriptedBackend::new(BackendId::Bedrock)
            .succeed_after_secs(0.0)
            .succeed_after_secs(0.0);
        let caller = BackendCaller::new(backend);
        let runner = TrialRunner::new(
            RunnerConfig::default()
                .with_trials(2)
                .with_pause(Duration::ZERO),
        )
        .unwrap();

        let mut seen = Vec::new();
        runner
            .run_observed(&caller, &Prompt::default(), |i, t| seen.push((i, t.is_success())))
            .await;
        assert_eq!(seen, vec![(1, true), (2, true)]);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_run() {
        let backend = ScriptedBackend::new(BackendId::Bedrock);
        let caller = BackendCaller::new(backend);
        let runner = TrialRunner::new(
            RunnerConfig::default()
                .with_trials(4)
                .with_pause(Duration::ZERO),
        )
        .unwrap();

        let trials = runner.run(&caller, &Prompt::default()).await;
        assert_eq!(trials.len(), 4);
        assert!(trials.iter().all(|t| !t.is_success()));
    }
}
