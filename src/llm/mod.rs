//! Suggestion provider abstraction.
//!
//! A provider turns a prompt into raw reply text with exactly one request.
//! [`SuggestionProvider::fetch_tags`] wires prompt building, the request, and
//! normalization together.

mod openai;
pub mod prompt;

pub use openai::OpenAiClient;
pub use prompt::{DateTags, build_prompt, french_month_name};

use crate::Result;
use crate::models::{TagSet, normalize};
use chrono::NaiveDate;
use std::time::Duration;

/// Trait for tag suggestion providers.
pub trait SuggestionProvider: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Checks that the provider can make a request.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` if no credential is configured.
    fn validate(&self) -> Result<()>;

    /// Sends one prompt and returns the raw reply text.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential`, `Api`, `MalformedResponse`, or
    /// `Transport`. No retries are attempted.
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Requests tags for `content` as of `date`.
    ///
    /// The reply is normalized but not checked for emptiness; an empty
    /// [`TagSet`] is a valid result.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`validate`](Self::validate) and
    /// [`complete`](Self::complete).
    fn fetch_tags(&self, content: &str, date: NaiveDate) -> Result<TagSet> {
        self.validate()?;
        let prompt = build_prompt(content, date);
        tracing::debug!(
            provider = self.name(),
            prompt_chars = prompt.chars().count(),
            "requesting tag suggestions"
        );
        let reply = self.complete(&prompt)?;
        let tags = normalize(&reply);
        tracing::debug!(provider = self.name(), tags = %tags, "reply normalized");
        Ok(tags)
    }
}

/// HTTP client configuration for suggestion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl LlmHttpConfig {
    /// Loads HTTP configuration from config file settings.
    #[must_use]
    pub const fn from_config(config: &crate::config::LlmConfig) -> Self {
        Self {
            timeout_ms: config.timeout_ms,
            connect_timeout_ms: config.connect_timeout_ms,
        }
    }
}

/// Builds a blocking HTTP client with configured timeouts.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}
