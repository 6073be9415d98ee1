//! Inference backends under benchmark.
//!
//! A backend sends one prompt to an inference provider and reports whether a
//! complete response came back. Timing is not the backend's concern: the
//! [`crate::caller::BackendCaller`] wraps every invocation with the clock and
//! the per-call timeout.
//!
//! # Implementations
//!
//! - `BedrockBackend` - managed gateway, Bedrock `InvokeModel` (feature `http`)
//! - `AnthropicBackend` - direct vendor API, Anthropic Messages (feature `http`)
//! - `ScriptedBackend` - replays canned responses, for tests and dry runs

#[cfg(feature = "http")]
pub mod anthropic;
#[cfg(feature = "http")]
pub mod bedrock;
pub mod scripted;

use crate::result::BenchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "http")]
pub use anthropic::{AnthropicBackend, AnthropicConfig};
#[cfg(feature = "http")]
pub use bedrock::{BedrockBackend, BedrockConfig, BedrockModelFamily};
pub use scripted::{ScriptedBackend, ScriptedResponse};

/// Default prompt sent to every backend.
pub const DEFAULT_PROMPT: &str = "Write a paragraph starting with: 'Once upon a time...'";

/// Default generation budget per request.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Recognized backend identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// Managed cloud gateway (AWS Bedrock)
    Bedrock,
    /// Direct vendor API (Anthropic)
    Anthropic,
}

impl BackendId {
    /// Every recognized backend
    pub const ALL: [Self; 2] = [Self::Bedrock, Self::Anthropic];

    /// Machine name, as used in config files and JSON
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bedrock => "bedrock",
            Self::Anthropic => "anthropic",
        }
    }

    /// Human label for report columns
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bedrock => "Bedrock",
            Self::Anthropic => "Direct API",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendId {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bedrock" => Ok(Self::Bedrock),
            "anthropic" | "direct" => Ok(Self::Anthropic),
            other => Err(BenchError::configuration(format!(
                "unrecognized backend '{other}' (expected one of: bedrock, anthropic)"
            ))),
        }
    }
}

/// The prompt payload sent on every trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// User message text
    pub text: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl Default for Prompt {
    fn default() -> Self {
        Self {
            text: DEFAULT_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl Prompt {
    /// Create a prompt with the default token budget
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the token budget
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A complete response from a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Generated text (concatenated text blocks)
    pub text: String,
    /// Output tokens, when the provider reports usage
    pub output_tokens: Option<u32>,
}

/// Failure of a single call. Recorded on the trial, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed before a response arrived
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Call exceeded its timeout
    #[error("Request timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Response arrived but could not be understood
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// One inference provider reachable with a single request per call.
#[async_trait]
pub trait InferenceBackend: Send + Sync + fmt::Debug {
    /// Which backend this is
    fn id(&self) -> BackendId;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    /// Send the prompt and wait for the full response
    async fn invoke(&self, prompt: &Prompt) -> Result<Completion, TransportError>;
}

#[async_trait]
impl<T: InferenceBackend + ?Sized> InferenceBackend for Arc<T> {
    fn id(&self) -> BackendId {
        (**self).id()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn invoke(&self, prompt: &Prompt) -> Result<Completion, TransportError> {
        (**self).invoke(prompt).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_id_parse() {
        assert_eq!("bedrock".parse::<BackendId>().unwrap(), BackendId::Bedrock);
        assert_eq!("Anthropic".parse::<BackendId>().unwrap(), BackendId::Anthropic);
        assert_eq!(" direct ".parse::<BackendId>().unwrap(), BackendId::Anthropic);
    }

    #[test]
    fn test_backend_id_parse_unrecognized() {
        let err = "openai".parse::<BackendId>().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("openai"));
    }

    #[test]
    fn test_backend_id_serialization() {
        let json = serde_json::to_string(&BackendId::Anthropic).unwrap();
        assert_eq!(json, "\"anthropic\"");
        let back: BackendId = serde_json::from_str("\"bedrock\"").unwrap();
        assert_eq!(back, BackendId::Bedrock);
    }

    #[test]
    fn test_backend_id_display_and_label() {
        assert_eq!(BackendId::Bedrock.to_string(), "bedrock");
        assert_eq!(BackendId::Anthropic.label(), "Direct API");
    }

    #[test]
    fn test_default_prompt() {
        let prompt = Prompt::default();
        assert!(prompt.text.starts_with("Write a paragraph"));
        assert_eq!(prompt.max_tokens, 1000);
    }

    #[test]
    fn test_prompt_builder() {
        let prompt = Prompt::new("Hi").with_max_tokens(16);
        assert_eq!(prompt.text, "Hi");
        assert_eq!(prompt.max_tokens, 16);
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Api {
            status: 429,
            body: "throttled".to_string(),
        };
        assert_eq!(err.to_string(), "API error 429: throttled");
        assert_eq!(
            TransportError::Timeout { ms: 1500 }.to_string(),
            "Request timed out after 1500ms"
        );
    }
}
