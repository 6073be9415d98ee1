//! Backend Caller: one timed request, one [`Trial`].
//!
//! Failures are data. Whatever goes wrong during a call (transport error,
//! error status, undecodable body, timeout) comes back as a failed trial so
//! the runner never has to special-case it.

use crate::backend::{BackendId, InferenceBackend, Prompt, TransportError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Outcome of one call attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TrialOutcome {
    /// Full response received
    Success,
    /// Call failed
    Failure {
        /// Error detail
        error: String,
    },
}

/// One timed call attempt against one backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    backend: BackendId,
    elapsed_secs: f64,
    outcome: TrialOutcome,
}

impl Trial {
    /// A successful trial. Negative or non-finite durations are clamped to zero.
    #[must_use]
    pub fn success(backend: BackendId, elapsed_secs: f64) -> Self {
        Self {
            backend,
            elapsed_secs: sanitize(elapsed_secs),
            outcome: TrialOutcome::Success,
        }
    }

    /// A failed trial with its error detail
    #[must_use]
    pub fn failure(backend: BackendId, elapsed_secs: f64, error: impl Into<String>) -> Self {
        Self {
            backend,
            elapsed_secs: sanitize(elapsed_secs),
            outcome: TrialOutcome::Failure {
                error: error.into(),
            },
        }
    }

    /// Backend the call went to
    #[must_use]
    pub const fn backend(&self) -> BackendId {
        self.backend
    }

    /// Wall-clock time from send to full response (or failure), seconds
    #[must_use]
    pub const fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Outcome
    #[must_use]
    pub const fn outcome(&self) -> &TrialOutcome {
        &self.outcome
    }

    /// Whether the call succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, TrialOutcome::Success)
    }

    /// Error detail, present iff the call failed
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            TrialOutcome::Success => None,
            TrialOutcome::Failure { error } => Some(error),
        }
    }
}

fn sanitize(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        secs
    } else {
        0.0
    }
}

/// Issues single timed requests to one backend.
#[derive(Debug)]
pub struct BackendCaller {
    backend: Box<dyn InferenceBackend>,
    timeout: Duration,
}

impl BackendCaller {
    /// Wrap a backend with the default timeout
    #[must_use]
    pub fn new(backend: impl InferenceBackend + 'static) -> Self {
        Self::boxed(Box::new(backend))
    }

    /// Wrap an already boxed backend
    #[must_use]
    pub fn boxed(backend: Box<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-call timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Backend identifier
    #[must_use]
    pub fn backend_id(&self) -> BackendId {
        self.backend.id()
    }

    /// Model requests are sent to
    #[must_use]
    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Per-call timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one request and time it. Never fails; no retries.
    pub async fn call(&self, prompt: &Prompt) -> Trial {
        let id = self.backend.id();
        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.backend.invoke(prompt)).await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(Ok(completion)) => {
                tracing::debug!(
                    backend = %id,
                    output_tokens = ?completion.output_tokens,
                    chars = completion.text.len(),
                    "response received"
                );
                Trial::success(id, elapsed)
            }
            Ok(Err(err)) => Trial::failure(id, elapsed, err.to_string()),
            Err(_) => {
                let err = TransportError::Timeout {
                    ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                };
                Trial::failure(id, elapsed, err.to_string())
            }
        }
    }
}
