//! Markdown outline pages.
//!
//! Parses and renders the bullet-outline page format used by outliner note
//! apps:
//! ```text
//! title:: Weekly review
//! - Shipped the importer
//!   second line of the same block
//!	- child block
//!	  tags:: IMPORTER
//! - Next top-level block
//! ```
//! Each level is indented by one tab or two spaces. Lines before the first
//! bullet form a leading pre-block.

use super::InMemoryHost;
use crate::models::{NodeId, PageRef};
use crate::{Error, Result};

/// Parser and renderer for outline page files.
pub struct OutlineParser;

#[derive(Debug)]
struct ParsedBlock {
    level: usize,
    lines: Vec<String>,
}

impl ParsedBlock {
    fn text(&self) -> String {
        let end = self
            .lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(0, |pos| pos + 1);
        self.lines[..end].join("\n")
    }
}

impl OutlineParser {
    /// Bullet marker.
    const BULLET: &'static str = "- ";

    /// Indentation emitted per level when rendering.
    const INDENT: &'static str = "\t";

    /// Indentation of continuation lines relative to their bullet.
    const CONTINUATION: &'static str = "  ";

    /// Parses an outline into a fresh host holding a single page.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects an edit.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use autotag::host::outline::OutlineParser;
    /// use autotag::DocumentHost;
    ///
    /// let (host, page) = OutlineParser::parse("notes", "- a\n\t- b\n- c\n").unwrap();
    /// let blocks = host.page_blocks(&page).unwrap();
    /// assert_eq!(blocks.len(), 2);
    /// assert_eq!(blocks[0].children[0].text, "b");
    /// ```
    pub fn parse(page_name: &str, content: &str) -> Result<(InMemoryHost, PageRef)> {
        let host = InMemoryHost::new();
        let page = host.add_page(page_name)?;
        let mut stack: Vec<(usize, NodeId)> = Vec::new();

        for block in Self::split_blocks(content) {
            while stack.last().is_some_and(|(level, _)| *level >= block.level) {
                stack.pop();
            }
            let parent = stack.last().map(|(_, id)| id.clone());
            let id = host.append_block(&page, parent.as_ref(), &block.text())?;
            stack.push((block.level, id));
        }

        Ok((host, page))
    }

    /// Renders a page of `host` back into outline text.
    ///
    /// # Errors
    ///
    /// Returns an error if the page or one of its nodes cannot be read.
    pub fn render(host: &InMemoryHost, page: &PageRef) -> Result<String> {
        let mut out = String::new();
        for id in host.root_ids(page)? {
            Self::render_block(host, &id, 0, &mut out)?;
        }
        Ok(out)
    }

    /// Resolves a 1-based dotted path such as `"2.1"` to a node id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the path is malformed or points past the
    /// end of the outline.
    pub fn resolve_path(host: &InMemoryHost, page: &PageRef, path: &str) -> Result<NodeId> {
        let mut candidates = host.root_ids(page)?;
        let mut found: Option<NodeId> = None;

        for segment in path.trim().split('.') {
            let index = segment
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| Error::InvalidInput(format!("invalid block path: {path}")))?;
            let id = candidates
                .get(index - 1)
                .cloned()
                .ok_or_else(|| Error::InvalidInput(format!("no block at path: {path}")))?;
            candidates = host.child_ids(&id)?;
            found = Some(id);
        }

        found.ok_or_else(|| Error::InvalidInput(format!("invalid block path: {path}")))
    }

    fn render_block(
        host: &InMemoryHost,
        id: &NodeId,
        level: usize,
        out: &mut String,
    ) -> Result<()> {
        let indent = Self::INDENT.repeat(level);
        let text = host.text(id)?;
        let mut lines = text.lines();

        out.push_str(&indent);
        out.push_str(Self::BULLET.trim_end());
        if let Some(first) = lines.next().filter(|line| !line.is_empty()) {
            out.push(' ');
            out.push_str(first);
        }
        out.push('\n');
        for line in lines {
            if !line.is_empty() {
                out.push_str(&indent);
                out.push_str(Self::CONTINUATION);
                out.push_str(line);
            }
            out.push('\n');
        }

        for child in host.child_ids(id)? {
            Self::render_block(host, &child, level + 1, out)?;
        }
        Ok(())
    }

    fn split_blocks(content: &str) -> Vec<ParsedBlock> {
        let mut blocks: Vec<ParsedBlock> = Vec::new();
        let mut preamble: Vec<String> = Vec::new();

        for line in content.lines() {
            let (level, rest) = Self::indentation(line);
            if let Some(first) = Self::bullet_text(rest) {
                blocks.push(ParsedBlock {
                    level,
                    lines: vec![first.to_string()],
                });
                continue;
            }
            match blocks.last_mut() {
                Some(block) => {
                    let text = Self::strip_continuation(line, block.level);
                    block.lines.push(text.to_string());
                },
                None => preamble.push(line.trim_end().to_string()),
            }
        }

        if preamble.iter().any(|line| !line.trim().is_empty()) {
            let first = preamble
                .iter()
                .position(|line| !line.trim().is_empty())
                .unwrap_or(0);
            blocks.insert(
                0,
                ParsedBlock {
                    level: 0,
                    lines: preamble.split_off(first),
                },
            );
        }
        blocks
    }

    /// Returns the indentation level and the text after it.
    fn indentation(line: &str) -> (usize, &str) {
        let mut level = 0;
        let mut spaces = 0;
        let mut offset = 0;
        for (i, c) in line.char_indices() {
            match c {
                '\t' => {
                    level += 1;
                    spaces = 0;
                },
                ' ' => {
                    spaces += 1;
                    if spaces == 2 {
                        level += 1;
                        spaces = 0;
                    }
                },
                _ => break,
            }
            offset = i + c.len_utf8();
        }
        (level, &line[offset..])
    }

    fn bullet_text(rest: &str) -> Option<&str> {
        if rest == Self::BULLET.trim_end() {
            return Some("");
        }
        rest.strip_prefix(Self::BULLET)
    }

    /// Removes the block's indentation plus the continuation offset.
    fn strip_continuation(line: &str, level: usize) -> &str {
        let mut rest = line;
        for _ in 0..level {
            rest = rest
                .strip_prefix('\t')
                .or_else(|| rest.strip_prefix("  "))
                .unwrap_or(rest);
        }
        rest.strip_prefix(Self::CONTINUATION)
            .unwrap_or_else(|| rest.trim_start())
    }
}
