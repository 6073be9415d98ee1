//! Scripted backend for unit testing and dry runs.
//!
//! Replays a queue of canned responses, each after a fixed delay. Delays
//! use the Tokio clock, so tests running with paused time see exact
//! elapsed durations without actually waiting.

use super::{BackendId, Completion, InferenceBackend, Prompt, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// One canned response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedResponse {
    /// Complete successfully after the delay
    Success {
        /// Simulated latency
        after: Duration,
    },
    /// Fail with an API status after the delay
    ApiError {
        /// Simulated latency
        after: Duration,
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
    /// Return an undecodable response after the delay
    Malformed {
        /// Simulated latency
        after: Duration,
        /// What was wrong with the body
        detail: String,
    },
}

impl ScriptedResponse {
    const fn delay(&self) -> Duration {
        match self {
            Self::Success { after }
            | Self::ApiError { after, .. }
            | Self::Malformed { after, .. } => *after,
        }
    }
}

/// Backend that replays [`ScriptedResponse`]s in order.
///
/// Once the script is exhausted every further call fails with a malformed
/// response.
#[derive(Debug)]
pub struct ScriptedBackend {
    id: BackendId,
    model: String,
    script: Mutex<VecDeque<ScriptedResponse>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    /// Create a backend with an empty script
    #[must_use]
    pub fn new(id: BackendId) -> Self {
        Self {
            id,
            model: format!("scripted-{id}"),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a response
    #[must_use]
    pub fn then(self, response: ScriptedResponse) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    /// Queue a success after `secs` seconds
    #[must_use]
    pub fn succeed_after_secs(self, secs: f64) -> Self {
        self.then(ScriptedResponse::Success {
            after: Duration::from_secs_f64(secs),
        })
    }

    /// Queue an API failure with the given status
    #[must_use]
    pub fn fail_with_status(self, status: u16) -> Self {
        self.then(ScriptedResponse::ApiError {
            after: Duration::ZERO,
            status,
            body: format!("scripted status {status}"),
        })
    }

    /// Set the reported model identifier
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Number of invocations so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Responses not yet consumed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, prompt: &Prompt) -> Result<Completion, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        let Some(response) = next else {
            return Err(TransportError::MalformedResponse(
                "scripted backend has no responses left".to_string(),
            ));
        };

        tokio::time::sleep(response.delay()).await;

        match response {
            ScriptedResponse::Success { .. } => Ok(Completion {
                text: format!("echo: {}", prompt.text),
                output_tokens: Some(prompt.max_tokens.min(8)),
            }),
            ScriptedResponse::ApiError { status, body, .. } => {
                Err(TransportError::Api { status, body })
            }
            ScriptedResponse::Malformed { detail, .. } => {
                Err(TransportError::MalformedResponse(detail))
            }
        }
    }
}
