//! Content extraction.
//!
//! Turns node text into the string sent for analysis: property lines
//! (`key:: value`) are dropped everywhere, earlier tag lines are dropped in
//! page mode, and page text is capped at a character ceiling.

use crate::models::ContentNode;
use regex::Regex;
use std::sync::LazyLock;

/// Default ceiling for page content, in characters.
pub const DEFAULT_MAX_PAGE_CHARS: usize = 15_000;

/// Marker appended to truncated page content.
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// A single token followed by `::` and then whitespace or the end of the line.
static PROPERTY_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*[^\s:]+::(\s|$)").ok());

/// Lower-cased prefixes of lines written by earlier tagging runs.
const TAG_LINE_PREFIXES: &[&str] = &["tags::", "page tags::", "selection tags::"];

/// Text ready for the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedContent {
    /// Filtered text, possibly ending with [`TRUNCATION_MARKER`].
    pub text: String,
    /// Whether the page ceiling cut the text.
    pub truncated: bool,
}

impl ExtractedContent {
    /// Whether there is nothing to analyze.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Whether a line has the `key:: value` property shape.
#[must_use]
pub fn is_property_line(line: &str) -> bool {
    PROPERTY_LINE.as_ref().is_some_and(|re| re.is_match(line))
}

/// Whether a line holds tags written by an earlier run.
#[must_use]
pub fn is_tag_line(line: &str) -> bool {
    let lowered = line.trim().to_lowercase();
    TAG_LINE_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
}

/// Extracts the analyzable text of one block.
///
/// Drops property lines and trims the rest. An empty result means there is
/// nothing to analyze.
#[must_use]
pub fn extract_block(text: &str) -> String {
    text.lines()
        .filter(|line| !is_property_line(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Extracts the analyzable text of a page from its top-level blocks.
///
/// Children are not visited. Property and tag lines are dropped, empty
/// blocks skipped, and surviving blocks joined by a blank line. Text longer
/// than `max_chars` characters is cut and marked.
#[must_use]
pub fn extract_page(blocks: &[ContentNode], max_chars: usize) -> ExtractedContent {
    let text = blocks
        .iter()
        .map(|block| {
            block
                .text
                .lines()
                .filter(|line| !is_property_line(line) && !is_tag_line(line))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    truncate(text, max_chars)
}

/// Extracts the analyzable text of a user selection.
#[must_use]
pub fn extract_selection(selection: &str) -> String {
    selection.trim().to_string()
}

fn truncate(text: String, max_chars: usize) -> ExtractedContent {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            tracing::debug!(max_chars, "page content truncated");
            let mut text = text[..cut].to_string();
            text.push_str(TRUNCATION_MARKER);
            ExtractedContent {
                text,
                truncated: true,
            }
        },
        None => ExtractedContent {
            text,
            truncated: false,
        },
    }
}
