use std::time::Duration;

use async_trait::async_trait;
use crivo_core::{CrivoError, LlmConfig};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Why a model request failed.
///
/// # Examples
///
/// ```
/// use crivo_review::llm::ModelError;
/// use reqwest::StatusCode;
///
/// let err = ModelError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into());
/// assert!(matches!(err, ModelError::RateLimited(_)));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Connection, TLS, timeout, or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API rejected the credential (HTTP 401/403).
    #[error("authentication failed ({status}): {body}")]
    Auth {
        /// HTTP status returned.
        status: StatusCode,
        /// Response body, for the operator.
        body: String,
    },

    /// The API asked us to slow down (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success status.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status returned.
        status: StatusCode,
        /// Response body, for the operator.
        body: String,
    },

    /// A success status without usable text content.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ModelError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ModelError::Auth { status, body },
            StatusCode::TOO_MANY_REQUESTS => ModelError::RateLimited(body),
            _ => ModelError::Api { status, body },
        }
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        ModelError::Transport(e.to_string())
    }
}

/// A model that answers one prompt with one text reply.
///
/// The runner takes any implementation, so tests can substitute a canned
/// model for [`LlmClient`].
#[async_trait]
pub trait ReviewModel: Send + Sync {
    /// Send `prompt` as a single user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

/// Anthropic Messages API client.
///
/// Sends one non-streaming request per call with the configured model,
/// token budget, and temperature.
///
/// # Examples
///
/// ```
/// use crivo_core::LlmConfig;
/// use crivo_review::llm::LlmClient;
///
/// let client = LlmClient::new(&LlmConfig::default(), "test-key".into()).unwrap();
/// assert_eq!(client.model(), "claude-sonnet-4-20250514");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: String,
}

impl LlmClient {
    /// Create a new client with an already resolved API key.
    ///
    /// # Errors
    ///
    /// Returns [`CrivoError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, CrivoError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CrivoError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    /// Create a client, resolving the API key from config or environment.
    ///
    /// # Errors
    ///
    /// Returns [`CrivoError::MissingCredential`] when no key is available.
    pub fn from_config(config: &LlmConfig) -> Result<Self, CrivoError> {
        let api_key = config.resolve_api_key()?;
        Self::new(config, api_key)
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{base_url}/v1/messages")
    }
}

#[async_trait]
impl ReviewModel for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(
            model = %self.config.model,
            prompt_chars = prompt.chars().count(),
            "sending review request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ModelError::from_status(status, body_text));
        }

        let raw = response.text().await?;
        let parsed: MessagesResponse = serde_json::from_str(&raw)
            .map_err(|e| ModelError::MalformedResponse(format!("invalid response body: {e}")))?;

        let text = parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| ModelError::MalformedResponse("response has no text content".into()))?;

        debug!(reply_chars = text.chars().count(), "received review reply");
        Ok(text)
    }
}
