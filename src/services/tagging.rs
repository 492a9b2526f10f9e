//! Tagging service.
//!
//! Runs the full pipeline for one command: extract, suggest, normalize,
//! place. Each failure is reported with exactly one notification and the
//! command ends without touching the document.

use super::extraction::{extract_block, extract_page, extract_selection};
use super::placement::{
    Placement, PlacementMode, place_block_tags, place_page_tags, place_selection_tags,
};
use crate::config::ExtractionConfig;
use crate::host::{DocumentHost, Notifier, Severity};
use crate::llm::SuggestionProvider;
use crate::models::{NodeId, PageRef, TagSet};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Display time of the advisory progress notification.
pub const PROGRESS_NOTICE_DURATION: Duration = Duration::from_secs(3);

/// Tags written by a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggingResult {
    /// Mode the tags were produced in.
    pub mode: PlacementMode,
    /// Where they were written.
    pub placement: Placement,
    /// The tags.
    pub tags: TagSet,
}

/// Service running tag suggestion commands against a host.
pub struct TaggingService<P: SuggestionProvider> {
    /// Suggestion provider.
    provider: P,
    /// Host document.
    host: Arc<dyn DocumentHost>,
    /// User notifications.
    notifier: Arc<dyn Notifier>,
    /// Extraction settings.
    extraction: ExtractionConfig,
    /// Fixed reference date; today when unset.
    reference_date: Option<NaiveDate>,
}

impl<P: SuggestionProvider> TaggingService<P> {
    /// Creates a new tagging service.
    #[must_use]
    pub fn new(provider: P, host: Arc<dyn DocumentHost>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            provider,
            host,
            notifier,
            extraction: ExtractionConfig::default(),
            reference_date: None,
        }
    }

    /// Sets extraction settings.
    #[must_use]
    pub const fn with_extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = extraction;
        self
    }

    /// Pins the reference date used for calendar tags.
    #[must_use]
    pub const fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// The host this service writes to.
    #[must_use]
    pub fn host(&self) -> &Arc<dyn DocumentHost> {
        &self.host
    }

    /// Tags one block and reports the outcome to the user.
    ///
    /// Returns `None` when the command was aborted; the reason has already
    /// been shown.
    pub fn tag_block(&self, block: &NodeId) -> Option<TaggingResult> {
        self.report(PlacementMode::Block, self.try_tag_block(block))
    }

    /// Tags the current page and reports the outcome to the user.
    pub fn tag_page(&self) -> Option<TaggingResult> {
        self.report(PlacementMode::Page, self.try_tag_page())
    }

    /// Tags the current selection and reports the outcome to the user.
    ///
    /// `selection` overrides the host's selection when given.
    pub fn tag_selection(
        &self,
        anchor: &NodeId,
        selection: Option<&str>,
    ) -> Option<TaggingResult> {
        self.report(
            PlacementMode::Selection,
            self.try_tag_selection(anchor, selection),
        )
    }

    /// Tags one block without reporting failures.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` or `EmptyContent` before any request,
    /// `InvalidInput` for an unknown block, the provider's errors,
    /// `NoUsableTags`, or the host's error if writing fails.
    #[instrument(skip(self), fields(mode = "block"))]
    pub fn try_tag_block(&self, block: &NodeId) -> Result<TaggingResult> {
        self.provider.validate()?;

        let node = self
            .host
            .block(block, false)?
            .ok_or_else(|| Error::InvalidInput(format!("block not found: {block}")))?;
        let content = extract_block(&node.text);
        let tags = self.suggest(&content)?;

        let placement = place_block_tags(self.host.as_ref(), block, &tags)?;
        Ok(TaggingResult {
            mode: PlacementMode::Block,
            placement,
            tags,
        })
    }

    /// Tags the current page without reporting failures.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when no page is open, otherwise the errors of
    /// [`Self::try_tag_page_of`].
    pub fn try_tag_page(&self) -> Result<TaggingResult> {
        self.provider.validate()?;
        let page = self
            .host
            .current_page()?
            .ok_or_else(|| Error::InvalidInput("no page is open".to_string()))?;
        self.try_tag_page_of(&page)
    }

    /// Tags `page` and reports the outcome to the user.
    pub fn tag_page_of(&self, page: &PageRef) -> Option<TaggingResult> {
        self.report(PlacementMode::Page, self.try_tag_page_of(page))
    }

    /// Tags `page` without reporting failures.
    ///
    /// A truncated page is announced with a warning and still analyzed.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` or `EmptyContent` before any request,
    /// the provider's errors, `NoUsableTags`, or the host's error if a read
    /// or write fails.
    #[instrument(skip(self, page), fields(mode = "page", page = %page))]
    pub fn try_tag_page_of(&self, page: &PageRef) -> Result<TaggingResult> {
        self.provider.validate()?;

        let blocks = self.host.page_blocks(page)?;
        let extracted = extract_page(&blocks, self.extraction.max_page_chars);
        if extracted.truncated && !extracted.is_empty() {
            self.notifier.notify(
                Severity::Warning,
                &format!(
                    "Page is longer than {} characters; only the beginning is analyzed.",
                    self.extraction.max_page_chars
                ),
                None,
            );
        }
        let tags = self.suggest(&extracted.text)?;

        let placement = place_page_tags(self.host.as_ref(), page, &blocks, &tags)?;
        Ok(TaggingResult {
            mode: PlacementMode::Page,
            placement,
            tags,
        })
    }

    /// Tags a selection without reporting failures.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential`, `InvalidInput` for an unknown anchor, or
    /// `EmptyContent` before any request, the provider's errors,
    /// `NoUsableTags`, or the host's error if writing fails.
    #[instrument(skip(self, selection), fields(mode = "selection"))]
    pub fn try_tag_selection(
        &self,
        anchor: &NodeId,
        selection: Option<&str>,
    ) -> Result<TaggingResult> {
        self.provider.validate()?;
        self.host
            .block(anchor, false)?
            .ok_or_else(|| Error::InvalidInput(format!("block not found: {anchor}")))?;

        let selection = match selection {
            Some(text) => Some(text.to_string()),
            None => self.host.selection()?,
        };
        let content = selection.as_deref().map(extract_selection).unwrap_or_default();
        let tags = self.suggest(&content)?;

        let placement = place_selection_tags(self.host.as_ref(), anchor, &tags)?;
        Ok(TaggingResult {
            mode: PlacementMode::Selection,
            placement,
            tags,
        })
    }

    /// Requests and checks tags for already-extracted content.
    fn suggest(&self, content: &str) -> Result<TagSet> {
        if content.is_empty() {
            return Err(Error::EmptyContent);
        }

        self.notifier.notify(
            Severity::Info,
            "Generating tags...",
            Some(PROGRESS_NOTICE_DURATION),
        );
        let tags = self.provider.fetch_tags(content, self.today())?;
        if tags.is_empty() {
            return Err(Error::NoUsableTags);
        }
        Ok(tags)
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Emits the single closing notification of a command.
    pub(crate) fn report(
        &self,
        mode: PlacementMode,
        result: Result<TaggingResult>,
    ) -> Option<TaggingResult> {
        match result {
            Ok(done) => {
                metrics::counter!(
                    "autotag_commands_total",
                    "command" => mode.as_str(),
                    "outcome" => "tagged"
                )
                .increment(1);
                metrics::counter!("autotag_tags_written_total", "mode" => mode.as_str())
                    .increment(done.tags.len() as u64);
                tracing::info!(mode = mode.as_str(), tags = %done.tags, "tags written");
                self.notifier.notify(
                    Severity::Success,
                    &format!("Tags added: {}", done.tags),
                    None,
                );
                Some(done)
            },
            Err(err) => {
                metrics::counter!(
                    "autotag_commands_total",
                    "command" => mode.as_str(),
                    "outcome" => err.kind()
                )
                .increment(1);
                tracing::warn!(mode = mode.as_str(), error = %err, "tagging aborted");
                self.notifier
                    .notify(err.severity(), &user_message(&err), None);
                None
            },
        }
    }
}

/// User-facing text for an aborted command.
#[must_use]
pub fn user_message(err: &Error) -> String {
    match err {
        Error::MissingCredential => {
            "No API key configured. Set the API credential in the settings.".to_string()
        },
        Error::EmptyContent => "Nothing to analyze: the content is empty.".to_string(),
        Error::Api { status, message } => format!("API error ({status}): {message}"),
        Error::MalformedResponse(_) => "Unexpected response from the API.".to_string(),
        Error::Transport(cause) => format!("Could not reach the API: {cause}"),
        Error::NoUsableTags => "The API returned no usable tags.".to_string(),
        Error::InvalidInput(_) | Error::OperationFailed { .. } => err.to_string(),
    }
}
