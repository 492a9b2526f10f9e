//! CLI support.
//!
//! The binary stands in for a host application: it loads a page from an
//! outline file, runs a command against it, and writes the page back.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `block` | Tag one block of an outline file |
//! | `page` | Tag the whole page |
//! | `selection` | Tag a text selection, anchored after a block |
//! | `prompt` | Print the prompt that would be sent |
//! | `config` | Show the effective configuration |
//!
//! # Example Usage
//!
//! ```bash
//! autotag block notes/2025-06-10.md --block 2.1
//! autotag page notes/trip.md --dry-run
//! echo "ownership and borrowing" | autotag selection notes/rust.md --block 1 --stdin
//! ```

use crate::host::{InMemoryHost, outline::OutlineParser};
use crate::models::{NodeId, PageRef};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A page loaded from an outline file.
#[derive(Debug)]
pub struct OutlineDocument {
    path: PathBuf,
    host: Arc<InMemoryHost>,
    page: PageRef,
}

impl OutlineDocument {
    /// Loads and parses an outline file.
    ///
    /// The page is named after the file stem.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_outline".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        let name = path
            .file_stem()
            .map_or_else(|| "page".to_string(), |s| s.to_string_lossy().into_owned());
        let (host, page) = OutlineParser::parse(&name, &content)?;
        tracing::debug!(path = %path.display(), page = %page, "loaded outline");
        Ok(Self {
            path: path.to_path_buf(),
            host: Arc::new(host),
            page,
        })
    }

    /// The document host.
    #[must_use]
    pub fn host(&self) -> Arc<InMemoryHost> {
        Arc::clone(&self.host)
    }

    /// The page.
    #[must_use]
    pub const fn page(&self) -> &PageRef {
        &self.page
    }

    /// Resolves a dotted block path such as `2.1`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the path is malformed or out of range.
    pub fn resolve(&self, path: &str) -> Result<NodeId> {
        OutlineParser::resolve_path(&self.host, &self.page, path)
    }

    /// Renders the page as outline text.
    ///
    /// # Errors
    ///
    /// Returns the host's error if the page cannot be read.
    pub fn render(&self) -> Result<String> {
        OutlineParser::render(&self.host, &self.page)
    }

    /// Writes the page back to its file.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let content = self.render()?;
        std::fs::write(&self.path, content).map_err(|e| Error::OperationFailed {
            operation: "write_outline".to_string(),
            cause: format!("{}: {e}", self.path.display()),
        })?;
        tracing::debug!(path = %self.path.display(), "saved outline");
        Ok(())
    }
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `InvalidInput` for any other format.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("invalid date '{s}': {e}")))
}

/// Reads all of standard input.
///
/// # Errors
///
/// Returns `OperationFailed` if stdin cannot be read.
pub fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| Error::OperationFailed {
            operation: "read_stdin".to_string(),
            cause: e.to_string(),
        })?;
    Ok(buf)
}
