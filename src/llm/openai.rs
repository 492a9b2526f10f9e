//! `OpenAI`-compatible chat completion client.

use super::{LlmHttpConfig, SuggestionProvider, build_http_client};
use crate::config::LlmConfig;
use crate::{Error, Result};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Chat completion client for tag suggestions.
pub struct OpenAiClient {
    /// Bearer credential; empty means not configured.
    api_key: SecretString,
    /// API base URL, without the `/chat/completions` suffix.
    endpoint: String,
    /// Model to use.
    model: String,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-3.5-turbo";

    /// Upper bound on reply tokens.
    pub const MAX_TOKENS: u32 = 150;

    /// Sampling temperature, kept low for stable tag lists.
    pub const TEMPERATURE: f32 = 0.2;

    /// Creates a client with no credential and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_key: SecretString::from(String::new()),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            client: build_http_client(LlmHttpConfig::default()),
        }
    }

    /// Creates a client from configuration.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new()
            .with_api_key(config.api_credential.expose_secret())
            .with_endpoint(&config.endpoint)
            .with_model(&config.model)
            .with_http_config(LlmHttpConfig::from_config(config))
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = SecretString::from(key.into());
        self
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets HTTP timeouts.
    #[must_use]
    pub fn with_http_config(mut self, config: LlmHttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    /// The configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    /// Parses a non-success response into an `Api` error.
    fn api_error(status: StatusCode, body: &str) -> Error {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error)
            .and_then(|error| error.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map_or_else(|| status.to_string(), str::to_string)
            });
        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    /// Extracts `choices[0].message.content` from a success body.
    fn reply_content(body: &str) -> Result<String> {
        let response: ChatCompletionResponse = serde_json::from_str(body)
            .map_err(|e| Error::MalformedResponse(format!("invalid JSON: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedResponse("no choices in response".to_string()))?
            .message
            .and_then(|message| message.content)
            .ok_or_else(|| Error::MalformedResponse("choice has no message content".to_string()))
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SuggestionProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn validate(&self) -> Result<()> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(Error::MissingCredential);
        }
        Ok(())
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    fn complete(&self, prompt: &str) -> Result<String> {
        self.validate()?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: Self::MAX_TOKENS,
            temperature: Self::TEMPERATURE,
        };

        let response = self
            .client
            .post(self.chat_url())
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::Transport(e.to_string()))?;

        if !status.is_success() {
            let err = Self::api_error(status, &body);
            tracing::warn!(status = status.as_u16(), "completion request rejected");
            return Err(err);
        }

        Self::reply_content(&body)
    }
}

/// Request to the Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

/// A message in the request.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response from the Chat Completions API.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ResponseMessage>,
}

/// The message of a choice.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Best-effort error body.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}
