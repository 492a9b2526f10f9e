//! # Autotag
//!
//! LLM-suggested keyword tags for outliner notes.
//!
//! Autotag sends the text of a block, a page, or a selection to a
//! chat-completion API and writes the returned keyword tags back into the
//! document as a `tags::` property block.
//!
//! ## Pipeline
//!
//! - Content extraction strips property lines and earlier tag lines
//! - The prompt asks for 3-10 topical tags plus calendar tags for the reference date
//! - One request to the completion API, no retries
//! - The comma-separated reply is normalized into an ordered, uppercase [`TagSet`]
//! - Placement updates or inserts the tags block through a [`DocumentHost`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use autotag::{AutotagConfig, TaggingService};
//! use autotag::llm::OpenAiClient;
//!
//! let config = AutotagConfig::load_default();
//! let client = OpenAiClient::from_config(&config.llm);
//! let service = TaggingService::new(client, host, notifier);
//! let outcome = service.tag_block(&block_id);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod commands;
pub mod config;
pub mod host;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;

// Re-exports for convenience
pub use commands::{CommandContext, CommandOutcome, CommandRegistry, register_default_commands};
pub use config::{AutotagConfig, ExtractionConfig, LlmConfig};
pub use host::{DocumentHost, InsertPosition, Notifier, Severity};
pub use llm::SuggestionProvider;
pub use models::{ContentNode, NodeId, PageRef, TagSet};
pub use services::TaggingService;

/// Error type for autotag operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When | Severity |
/// |---------|-------------|----------|
/// | `MissingCredential` | No API credential configured | error |
/// | `EmptyContent` | Nothing left to analyze after filtering | warning |
/// | `Api` | Completion API answered with a non-success status | error |
/// | `MalformedResponse` | Success status but unexpected JSON shape | warning |
/// | `Transport` | DNS, TLS, timeout, connection reset | error |
/// | `NoUsableTags` | Reply normalized to an empty tag set | warning |
/// | `InvalidInput` | Unknown block, unknown command, bad CLI input | error |
/// | `OperationFailed` | Host edits, config files, log files | error |
#[derive(Debug, ThisError)]
pub enum Error {
    /// No API credential is configured.
    ///
    /// Raised before any network call is made.
    #[error("no API credential configured")]
    MissingCredential,

    /// Nothing left to analyze after extraction.
    ///
    /// Raised when:
    /// - A block contains only property lines
    /// - A page has no text outside property and tag lines
    /// - The selection is empty or whitespace
    #[error("no content to analyze")]
    EmptyContent,

    /// The completion API returned a non-success HTTP status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the status text.
        message: String,
    },

    /// The completion API answered successfully but the body had an
    /// unexpected shape.
    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The reply contained no usable tags.
    #[error("no usable tags in the API reply")]
    NoUsableTags,

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A block identifier does not resolve to a node
    /// - A command name is not registered
    /// - A block path or date argument cannot be parsed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - A host document edit fails
    /// - Configuration or log files cannot be read or opened
    /// - Logging was already initialized
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Severity of the notification that reports this error to the user.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::EmptyContent | Self::MalformedResponse(_) | Self::NoUsableTags => {
                Severity::Warning
            },
            Self::MissingCredential
            | Self::Api { .. }
            | Self::Transport(_)
            | Self::InvalidInput(_)
            | Self::OperationFailed { .. } => Severity::Error,
        }
    }

    /// Short stable label used for metrics and log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::EmptyContent => "empty_content",
            Self::Api { .. } => "api_error",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Transport(_) => "transport_error",
            Self::NoUsableTags => "no_usable_tags",
            Self::InvalidInput(_) => "invalid_input",
            Self::OperationFailed { .. } => "operation_failed",
        }
    }
}

/// Result type alias for autotag operations.
pub type Result<T> = std::result::Result<T, Error>;
