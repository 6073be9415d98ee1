//! Benchmark orchestration: run every backend, aggregate, compare.
//!
//! Backends run one after another in the order they were added. Nothing
//! is sent until the whole configuration has been validated.

use crate::backend::{BackendId, Prompt};
use crate::caller::{BackendCaller, Trial};
use crate::compare::{compare, Comparison};
use crate::result::{BenchError, BenchResult};
use crate::runner::TrialRunner;
use crate::stats::Summary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// When the first request was sent
    pub started_at: DateTime<Utc>,
    /// Wall time for the whole run, seconds
    pub elapsed_secs: f64,
    /// Trials attempted per backend
    pub trials_per_backend: usize,
    /// Prompt sent on every trial
    pub prompt: Prompt,
    /// Model identifier per backend
    pub models: BTreeMap<BackendId, String>,
    /// Aggregated results per backend
    pub summaries: BTreeMap<BackendId, Summary>,
    /// Present only when two backends were compared
    pub comparison: Option<Comparison>,
}

impl RunReport {
    /// Summary for one backend
    #[must_use]
    pub fn summary(&self, backend: BackendId) -> Option<&Summary> {
        self.summaries.get(&backend)
    }

    /// Requests sent across all backends
    #[must_use]
    pub fn total_requests(&self) -> usize {
        self.summaries.values().map(Summary::trial_count).sum()
    }

    /// First eight hex digits of the run id, used in file names and history rows
    #[must_use]
    pub fn short_id(&self) -> String {
        let mut id = self.run_id.simple().to_string();
        id.truncate(8);
        id
    }
}

/// Progress notifications emitted while a benchmark runs.
#[derive(Debug, Clone, Copy)]
pub enum BenchEvent<'a> {
    /// A backend is about to receive its first trial
    BackendStarted {
        /// Backend
        backend: BackendId,
        /// Trials that will be sent
        trials: usize,
    },
    /// One trial finished
    TrialFinished {
        /// 1-based trial index
        index: usize,
        /// The trial
        trial: &'a Trial,
    },
    /// All trials for a backend finished and were aggregated
    BackendFinished {
        /// The aggregate
        summary: &'a Summary,
    },
}

/// A configured benchmark run.
#[derive(Debug)]
pub struct Benchmark {
    runner: TrialRunner,
    prompt: Prompt,
    callers: Vec<BackendCaller>,
    pair: Option<(BackendId, BackendId)>,
}

impl Benchmark {
    /// Create a benchmark with no backends
    #[must_use]
    pub fn new(runner: TrialRunner, prompt: Prompt) -> Self {
        Self {
            runner,
            prompt,
            callers: Vec::new(),
            pair: None,
        }
    }

    /// Add a backend; backends run in insertion order
    #[must_use]
    pub fn with_backend(mut self, caller: BackendCaller) -> Self {
        self.callers.push(caller);
        self
    }

    /// Compare `comparand` against `baseline` after the run
    #[must_use]
    pub const fn compare(mut self, baseline: BackendId, comparand: BackendId) -> Self {
        self.pair = Some((baseline, comparand));
        self
    }

    /// Backends in run order
    #[must_use]
    pub fn backends(&self) -> Vec<BackendId> {
        self.callers.iter().map(BackendCaller::backend_id).collect()
    }

    /// Check the configuration without sending anything
    pub fn validate(&self) -> BenchResult<()> {
        self.runner.config().validate()?;

        let backends = self.backends();
        if backends.is_empty() {
            return Err(BenchError::configuration("no backends to benchmark"));
        }
        for (i, id) in backends.iter().enumerate() {
            if backends[..i].contains(id) {
                return Err(BenchError::configuration(format!(
                    "backend {id} added more than once"
                )));
            }
        }

        if let Some((baseline, comparand)) = self.pair {
            if baseline == comparand {
                return Err(BenchError::configuration(format!(
                    "comparison needs two distinct backends, got {baseline} twice"
                )));
            }
            for id in [baseline, comparand] {
                if !backends.contains(&id) {
                    return Err(BenchError::configuration(format!(
                        "cannot compare {id}: it is not being benchmarked"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Run the benchmark
    pub async fn run(&self) -> BenchResult<RunReport> {
        self.run_observed(|_| {}).await
    }

    /// Run the benchmark, reporting progress to `observer`
    pub async fn run_observed<F>(&self, mut observer: F) -> BenchResult<RunReport>
    where
        F: FnMut(BenchEvent<'_>),
    {
        self.validate()?;

        let started_at = Utc::now();
        let clock = tokio::time::Instant::now();
        let trials = self.runner.config().trials;
        let mut summaries = BTreeMap::new();
        let mut models = BTreeMap::new();

        for caller in &self.callers {
            let backend = caller.backend_id();
            observer(BenchEvent::BackendStarted { backend, trials });

            let results = self
                .runner
                .run_observed(caller, &self.prompt, |index, trial| {
                    observer(BenchEvent::TrialFinished { index, trial });
                })
                .await;

            let summary = Summary::from_trials(backend, &results)?;
            tracing::info!(
                %backend,
                succeeded = summary.success_count(),
                failed = summary.failure_count(),
                average_ms = summary.latency().map(|l| l.average * 1000.0),
                "backend finished"
            );
            observer(BenchEvent::BackendFinished { summary: &summary });

            models.insert(backend, caller.model().to_string());
            summaries.insert(backend, summary);
        }

        let comparison = match self.pair {
            Some((baseline, comparand)) => Some(compare(
                lookup(&summaries, baseline)?,
                lookup(&summaries, comparand)?,
            )?),
            None => None,
        };

        Ok(RunReport {
            run_id: Uuid::new_v4(),
            started_at,
            elapsed_secs: clock.elapsed().as_secs_f64(),
            trials_per_backend: trials,
            prompt: self.prompt.clone(),
            models,
            summaries,
            comparison,
        })
    }
}

fn lookup(summaries: &BTreeMap<BackendId, Summary>, id: BackendId) -> BenchResult<&Summary> {
    summaries
        .get(&id)
        .ok_or_else(|| BenchError::configuration(format!("no summary for backend {id}")))
}
