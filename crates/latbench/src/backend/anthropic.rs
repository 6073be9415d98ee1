//! Direct Anthropic Messages API backend.
//!
//! `POST {base_url}/v1/messages`, authenticated with `x-api-key`.

use super::{BackendId, Completion, InferenceBackend, Prompt, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default direct model identifier.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Connection settings for the direct API.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Base URL (override for proxies or tests)
    pub base_url: String,
}

impl AnthropicConfig {
    /// Create a config for the default model and endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// A text content block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextBlock {
    /// Block type (always "text" on requests)
    #[serde(rename = "type")]
    pub kind: String,
    /// Block text; absent on non-text blocks
    #[serde(default)]
    pub text: String,
}

impl TextBlock {
    /// Build a text block
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// A single user or assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageTurn {
    /// "user" or "assistant"
    pub role: String,
    /// Content blocks
    pub content: Vec<TextBlock>,
}

impl MessageTurn {
    /// Single-block user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![TextBlock::text(text)],
        }
    }
}

/// Body of a Messages API request.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    /// Model identifier
    pub model: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Conversation
    pub messages: Vec<MessageTurn>,
}

/// Token usage as reported by the API.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct MessagesUsage {
    /// Prompt tokens
    pub input_tokens: u32,
    /// Generated tokens
    pub output_tokens: u32,
}

/// Body of a Messages API response.
///
/// Shared by the Bedrock backend: Anthropic models on Bedrock return the
/// same shape.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessagesResponse {
    /// Generated content blocks
    pub content: Vec<TextBlock>,
    /// Why generation stopped
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Token usage
    #[serde(default)]
    pub usage: Option<MessagesUsage>,
}

impl MessagesResponse {
    /// Collapse into a [`Completion`]
    #[must_use]
    pub fn into_completion(self) -> Completion {
        let text = self
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");
        Completion {
            text,
            output_tokens: self.usage.map(|u| u.output_tokens),
        }
    }
}

/// Backend for the direct vendor API.
#[derive(Debug, Clone)]
pub struct AnthropicBackend {
    config: AnthropicConfig,
    client: reqwest::Client,
}

impl AnthropicBackend {
    /// Create a backend with a default HTTP client.
    ///
    /// The client has no request timeout of its own; the caller enforces
    /// the per-call timeout.
    pub fn new(config: AnthropicConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self::with_client(config, client)
    }

    /// Create a backend with a custom reqwest client
    pub fn with_client(mut config: AnthropicConfig, client: reqwest::Client) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self { config, client }
    }

    /// Returns the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Request body for a prompt
    pub fn request_for(&self, prompt: &Prompt) -> MessagesRequest {
        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: prompt.max_tokens,
            messages: vec![MessageTurn::user(&prompt.text)],
        }
    }
}

#[async_trait]
impl InferenceBackend for AnthropicBackend {
    fn id(&self) -> BackendId {
        BackendId::Anthropic
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, prompt: &Prompt) -> Result<Completion, TransportError> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_for(prompt))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        let response: MessagesResponse = serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;
        Ok(response.into_completion())
    }
}
