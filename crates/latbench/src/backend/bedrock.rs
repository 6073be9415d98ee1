//! AWS Bedrock `InvokeModel` backend.
//!
//! `POST {endpoint}/model/{model_id}/invoke`, authenticated with a Bedrock
//! API key sent as a bearer token. The request body depends on the model
//! family encoded in the model id.

use super::anthropic::{MessageTurn, MessagesResponse};
use super::{BackendId, Completion, InferenceBackend, Prompt, TransportError};
use crate::result::{BenchError, BenchResult};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Bedrock model (cross-region inference profile).
pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-20250514-v1:0";

/// Default region requests are sent to.
pub const DEFAULT_TARGET_REGION: &str = "us-east-1";

/// `anthropic_version` value Bedrock expects for Anthropic models.
pub const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Generation cap for Titan text models. Smaller prompt budgets still apply.
pub const TITAN_MAX_TOKEN_COUNT: u32 = 50;

/// Model families with a known request schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedrockModelFamily {
    /// Anthropic Claude (Messages schema)
    Anthropic,
    /// Amazon Titan Text
    Titan,
}

impl BedrockModelFamily {
    /// Detect the family from a model id or ARN
    pub fn detect(model_id: &str) -> BenchResult<Self> {
        if model_id.contains("anthropic") {
            Ok(Self::Anthropic)
        } else if model_id.contains("amazon.titan") {
            Ok(Self::Titan)
        } else {
            Err(BenchError::configuration(format!(
                "unsupported Bedrock model: {model_id}"
            )))
        }
    }
}

/// Connection settings for Bedrock.
#[derive(Debug, Clone)]
pub struct BedrockConfig {
    /// Bedrock API key (bearer token)
    pub api_key: String,
    /// Model id, inference profile id or ARN
    pub model_id: String,
    /// Region hosting the runtime endpoint
    pub target_region: String,
    /// Explicit endpoint, overriding the regional default
    pub endpoint: Option<String>,
}

impl BedrockConfig {
    /// Create a config for the default model in the default region
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            target_region: DEFAULT_TARGET_REGION.to_string(),
            endpoint: None,
        }
    }

    /// Set the model id
    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Set the target region
    #[must_use]
    pub fn with_target_region(mut self, region: impl Into<String>) -> Self {
        self.target_region = region.into();
        self
    }

    /// Set an explicit endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Runtime endpoint requests go to
    #[must_use]
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            format!("https://bedrock-runtime.{}.amazonaws.com", self.target_region)
        })
    }
}

/// Body for Anthropic models on Bedrock.
#[derive(Debug, Clone, Serialize)]
struct AnthropicInvokeBody {
    anthropic_version: &'static str,
    max_tokens: u32,
    messages: Vec<MessageTurn>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TitanGenerationConfig {
    max_token_count: u32,
}

/// Body for Titan text models.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TitanInvokeBody {
    input_text: String,
    text_generation_config: TitanGenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitanResult {
    #[serde(default)]
    token_count: Option<u32>,
    output_text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TitanResponse {
    results: Vec<TitanResult>,
}

/// Backend for the managed gateway.
#[derive(Debug, Clone)]
pub struct BedrockBackend {
    config: BedrockConfig,
    family: BedrockModelFamily,
    invoke_url: Url,
    client: reqwest::Client,
}

impl BedrockBackend {
    /// Create a backend with a default HTTP client.
    ///
    /// Fails when the endpoint is not a valid base URL or the model family
    /// is unsupported.
    pub fn new(config: BedrockConfig) -> BenchResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self::with_client(config, client)
    }

    /// Create a backend with a custom reqwest client
    pub fn with_client(config: BedrockConfig, client: reqwest::Client) -> BenchResult<Self> {
        let family = BedrockModelFamily::detect(&config.model_id)?;
        let invoke_url = invoke_url(&config.resolved_endpoint(), &config.model_id)?;
        Ok(Self {
            config,
            family,
            invoke_url,
            client,
        })
    }

    /// Detected model family
    pub const fn family(&self) -> BedrockModelFamily {
        self.family
    }

    /// Full `InvokeModel` URL
    pub fn invoke_url(&self) -> &Url {
        &self.invoke_url
    }

    /// Serialized request body for a prompt
    pub fn body_for(&self, prompt: &Prompt) -> serde_json::Value {
        let body = match self.family {
            BedrockModelFamily::Anthropic => serde_json::to_value(AnthropicInvokeBody {
                anthropic_version: BEDROCK_ANTHROPIC_VERSION,
                max_tokens: prompt.max_tokens,
                messages: vec![MessageTurn::user(&prompt.text)],
            }),
            BedrockModelFamily::Titan => serde_json::to_value(TitanInvokeBody {
                input_text: prompt.text.clone(),
                text_generation_config: TitanGenerationConfig {
                    max_token_count: prompt.max_tokens.min(TITAN_MAX_TOKEN_COUNT),
                },
            }),
        };
        // Plain structs of strings and integers always serialize.
        body.unwrap_or_default()
    }

    fn decode(&self, bytes: &[u8]) -> Result<Completion, TransportError> {
        let malformed = |e: serde_json::Error| TransportError::MalformedResponse(e.to_string());
        match self.family {
            BedrockModelFamily::Anthropic => serde_json::from_slice::<MessagesResponse>(bytes)
                .map(MessagesResponse::into_completion)
                .map_err(malformed),
            BedrockModelFamily::Titan => {
                let resp: TitanResponse = serde_json::from_slice(bytes).map_err(malformed)?;
                let first = resp.results.into_iter().next().ok_or_else(|| {
                    TransportError::MalformedResponse("Titan response has no results".to_string())
                })?;
                Ok(Completion {
                    text: first.output_text,
                    output_tokens: first.token_count,
                })
            }
        }
    }
}

fn invoke_url(endpoint: &str, model_id: &str) -> BenchResult<Url> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| BenchError::configuration(format!("invalid Bedrock endpoint {endpoint}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| {
            BenchError::configuration(format!("Bedrock endpoint cannot be a base URL: {endpoint}"))
        })?
        .pop_if_empty()
        .push("model")
        .push(model_id)
        .push("invoke");
    Ok(url)
}

#[async_trait]
impl InferenceBackend for BedrockBackend {
    fn id(&self) -> BackendId {
        BackendId::Bedrock
    }

    fn model(&self) -> &str {
        &self.config.model_id
    }

    async fn invoke(&self, prompt: &Prompt) -> Result<Completion, TransportError> {
        let resp = self
            .client
            .post(self.invoke_url.clone())
            .bearer_auth(&self.config.api_key)
            .header("accept", "application/json")
            .json(&self.body_for(prompt))
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
        self.decode(&bytes)
    }
}
