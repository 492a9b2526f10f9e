//! Configuration management.
//!
//! Configuration is resolved once at startup (defaults, then the TOML file,
//! then environment variables) and passed into the pipeline as a value.

use crate::llm::OpenAiClient;
use crate::services::extraction::DEFAULT_MAX_PAGE_CHARS;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the API credential.
pub const ENV_API_CREDENTIAL: &str = "AUTOTAG_API_CREDENTIAL";
/// Fallback environment variable for the API credential.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable overriding the API endpoint.
pub const ENV_ENDPOINT: &str = "AUTOTAG_ENDPOINT";
/// Environment variable overriding the model.
pub const ENV_MODEL: &str = "AUTOTAG_MODEL";
/// Environment variable overriding the request timeout.
pub const ENV_TIMEOUT_MS: &str = "AUTOTAG_TIMEOUT_MS";
/// Environment variable overriding the connect timeout.
pub const ENV_CONNECT_TIMEOUT_MS: &str = "AUTOTAG_CONNECT_TIMEOUT_MS";
/// Environment variable overriding the page content ceiling.
pub const ENV_MAX_PAGE_CHARS: &str = "AUTOTAG_MAX_PAGE_CHARS";

/// Main configuration for autotag.
#[derive(Debug, Clone, Default)]
pub struct AutotagConfig {
    /// Completion API settings.
    pub llm: LlmConfig,
    /// Content extraction settings.
    pub extraction: ExtractionConfig,
    /// Logging settings from the config file.
    pub logging: LoggingSettings,
}

/// Completion API configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Bearer credential. Empty means not configured.
    pub api_credential: SecretString,
    /// API base URL.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_credential: SecretString::from(String::new()),
            endpoint: OpenAiClient::DEFAULT_ENDPOINT.to_string(),
            model: OpenAiClient::DEFAULT_MODEL.to_string(),
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl LlmConfig {
    /// Whether a non-empty credential is configured.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        !self.api_credential.expose_secret().trim().is_empty()
    }
}

/// Content extraction configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Ceiling for page content, in characters.
    pub max_page_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_page_chars: DEFAULT_MAX_PAGE_CHARS,
        }
    }
}

/// Logging section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Default filter directive, e.g. `info` or `autotag=debug`.
    pub level: Option<String>,
    /// Log file; stderr when unset.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Completion API section.
    pub llm: Option<ConfigFileLlm>,
    /// Extraction section.
    pub extraction: Option<ConfigFileExtraction>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// LLM section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLlm {
    /// API credential.
    pub api_credential: Option<String>,
    /// API base URL.
    pub endpoint: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

/// Extraction section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileExtraction {
    /// Page content ceiling.
    pub max_page_chars: Option<usize>,
}

impl AutotagConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration TOML.
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Path of the default config file (`<config dir>/autotag/config.toml`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("autotag").join("config.toml"))
    }

    /// Loads configuration from the default location.
    ///
    /// Returns default configuration if no config file is found or it
    /// cannot be parsed.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config file {}: {e}", path.display());
                Self::default()
            },
        }
    }

    /// Converts a `ConfigFile` to `AutotagConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(llm) = file.llm {
            if let Some(credential) = llm.api_credential {
                config.llm.api_credential = SecretString::from(credential);
            }
            if let Some(endpoint) = llm.endpoint {
                config.llm.endpoint = endpoint;
            }
            if let Some(model) = llm.model {
                config.llm.model = model;
            }
            if let Some(timeout_ms) = llm.timeout_ms {
                config.llm.timeout_ms = timeout_ms;
            }
            if let Some(connect_timeout_ms) = llm.connect_timeout_ms {
                config.llm.connect_timeout_ms = connect_timeout_ms;
            }
        }
        if let Some(extraction) = file.extraction {
            if let Some(max_page_chars) = extraction.max_page_chars {
                config.extraction.max_page_chars = max_page_chars;
            }
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    /// Applies process environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(credential) =
            non_empty(ENV_API_CREDENTIAL).or_else(|| non_empty(ENV_OPENAI_API_KEY))
        {
            self.llm.api_credential = SecretString::from(credential);
        }
        if let Some(endpoint) = non_empty(ENV_ENDPOINT) {
            self.llm.endpoint = endpoint;
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            self.llm.model = model;
        }
        if let Some(v) = parse_env(ENV_TIMEOUT_MS, non_empty(ENV_TIMEOUT_MS)) {
            self.llm.timeout_ms = v;
        }
        if let Some(v) = parse_env(ENV_CONNECT_TIMEOUT_MS, non_empty(ENV_CONNECT_TIMEOUT_MS)) {
            self.llm.connect_timeout_ms = v;
        }
        if let Some(v) = parse_env(ENV_MAX_PAGE_CHARS, non_empty(ENV_MAX_PAGE_CHARS)) {
            self.extraction.max_page_chars = v;
        }
        self
    }

    /// Human-readable summary with the credential redacted.
    #[must_use]
    pub fn display_summary(&self) -> String {
        let credential = if self.llm.has_credential() {
            "[REDACTED]"
        } else {
            "<unset>"
        };
        format!(
            "[llm]\n\
             api_credential = {credential}\n\
             endpoint = {}\n\
             model = {}\n\
             timeout_ms = {}\n\
             connect_timeout_ms = {}\n\
             \n\
             [extraction]\n\
             max_page_chars = {}\n",
            self.llm.endpoint,
            self.llm.model,
            self.llm.timeout_ms,
            self.llm.connect_timeout_ms,
            self.extraction.max_page_chars,
        )
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: Option<String>) -> Option<T> {
    let value = value?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {key}: {value}");
            None
        },
    }
}
