//! Host application boundary.
//!
//! The tagging pipeline never owns the document. It reads nodes and requests
//! edits through [`DocumentHost`], and reports to the user through
//! [`Notifier`]. The crate ships an in-memory host backed by Markdown outline
//! files for the CLI and for tests.

mod memory;
mod notify;
pub mod outline;

pub use memory::InMemoryHost;
pub use notify::{ConsoleNotifier, Notification, RecordingNotifier};

use crate::Result;
use crate::models::{ContentNode, NodeId, PageRef};
use std::fmt;
use std::time::Duration;

/// Where a new node goes relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Appended as the last child of the anchor.
    Child,
    /// Inserted directly after the anchor, under the same parent.
    Sibling,
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Progress or neutral information.
    Info,
    /// Nothing was written, but nothing went wrong either.
    Warning,
    /// The command failed.
    Error,
    /// Tags were written.
    Success,
}

impl Severity {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document capabilities the host application provides.
///
/// Every call is a blocking round trip to the host. The host serializes its
/// own edits; this trait makes no atomicity promises across calls.
pub trait DocumentHost: Send + Sync {
    /// Reads a node by identifier.
    ///
    /// With `include_children`, the returned node carries its direct
    /// children. Returns `Ok(None)` when the identifier is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be read.
    fn block(&self, id: &NodeId, include_children: bool) -> Result<Option<ContentNode>>;

    /// The page currently open in the host, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be read.
    fn current_page(&self) -> Result<Option<PageRef>>;

    /// Top-level nodes of a page, each with its direct children.
    ///
    /// # Errors
    ///
    /// Returns an error if the page does not exist or cannot be read.
    fn page_blocks(&self, page: &PageRef) -> Result<Vec<ContentNode>>;

    /// The user's current text selection, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be read.
    fn selection(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Inserts a new node relative to `anchor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the anchor does not exist or the edit fails.
    fn insert_block(
        &self,
        anchor: &NodeId,
        text: &str,
        position: InsertPosition,
    ) -> Result<NodeId>;

    /// Appends a new top-level node to a page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page does not exist or the edit fails.
    fn insert_page_block(&self, page: &PageRef, text: &str) -> Result<NodeId>;

    /// Replaces the text of a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist or the edit fails.
    fn update_block(&self, id: &NodeId, text: &str) -> Result<()>;
}

/// Transient user-facing messages.
pub trait Notifier: Send + Sync {
    /// Shows a message. `duration` is advisory and never aborts anything.
    fn notify(&self, severity: Severity, message: &str, duration: Option<Duration>);
}
