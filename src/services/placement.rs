//! Tag placement.
//!
//! Writes a [`TagSet`] into the document. Block mode updates an existing
//! `tags::` child in place or adds one; page and selection modes always
//! append a new node.

use crate::host::{DocumentHost, InsertPosition};
use crate::models::{ContentNode, NodeId, PageRef, TagSet};
use crate::{Error, Result};

/// Property prefix of block-mode tag nodes, matched case-insensitively.
pub const TAGS_PREFIX: &str = "tags::";

/// Label of page-mode tag nodes.
pub const PAGE_TAGS_LABEL: &str = "Page Tags::";

/// Label of selection-mode tag nodes.
pub const SELECTION_TAGS_LABEL: &str = "Selection Tags::";

/// Which command produced the tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    /// Tags for one block, kept in a `tags::` child.
    Block,
    /// Tags for a whole page, appended after its last top-level block.
    Page,
    /// Tags for a text selection, appended after the edited block.
    Selection,
}

impl PlacementMode {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Page => "page",
            Self::Selection => "selection",
        }
    }

    /// Node text holding `tags` in this mode.
    #[must_use]
    pub fn render(self, tags: &TagSet) -> String {
        let label = match self {
            Self::Block => TAGS_PREFIX,
            Self::Page => PAGE_TAGS_LABEL,
            Self::Selection => SELECTION_TAGS_LABEL,
        };
        format!("{label} {}", tags.joined())
    }
}

/// Where tags ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// An existing node was overwritten.
    Updated(NodeId),
    /// A new node was inserted.
    Inserted(NodeId),
}

impl Placement {
    /// The node holding the tags.
    #[must_use]
    pub const fn node(&self) -> &NodeId {
        match self {
            Self::Updated(id) | Self::Inserted(id) => id,
        }
    }
}

/// Finds the first direct child whose text starts with `tags::`, ignoring case.
#[must_use]
pub fn find_tags_child(node: &ContentNode) -> Option<&ContentNode> {
    node.children.iter().find(|child| is_tags_node(&child.text))
}

fn is_tags_node(text: &str) -> bool {
    text.get(..TAGS_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(TAGS_PREFIX))
}

/// Writes block tags under `target`.
///
/// Overwrites the first `tags::` child if there is one, otherwise appends a
/// new last child.
///
/// # Errors
///
/// Returns `InvalidInput` if `target` does not exist, or the host's error if
/// an edit fails.
pub fn place_block_tags(
    host: &dyn DocumentHost,
    target: &NodeId,
    tags: &TagSet,
) -> Result<Placement> {
    let node = host
        .block(target, true)?
        .ok_or_else(|| Error::InvalidInput(format!("block not found: {target}")))?;
    let text = PlacementMode::Block.render(tags);

    if let Some(existing) = find_tags_child(&node) {
        host.update_block(&existing.id, &text)?;
        tracing::debug!(block = %target, tags_block = %existing.id, "updated tags block");
        return Ok(Placement::Updated(existing.id.clone()));
    }

    let id = host.insert_block(target, &text, InsertPosition::Child)?;
    tracing::debug!(block = %target, tags_block = %id, "inserted tags block");
    Ok(Placement::Inserted(id))
}

/// Writes page tags after the last top-level block of `page`.
///
/// Falls back to a new top-level node when the page is empty. Existing
/// page tag nodes are left alone.
///
/// # Errors
///
/// Returns the host's error if a read or edit fails.
pub fn place_page_tags(
    host: &dyn DocumentHost,
    page: &PageRef,
    blocks: &[ContentNode],
    tags: &TagSet,
) -> Result<Placement> {
    let text = PlacementMode::Page.render(tags);
    let id = match blocks.last() {
        Some(last) => host.insert_block(&last.id, &text, InsertPosition::Sibling)?,
        None => host.insert_page_block(page, &text)?,
    };
    tracing::debug!(page = %page, tags_block = %id, "inserted page tags block");
    Ok(Placement::Inserted(id))
}

/// Writes selection tags right after the block being edited.
///
/// # Errors
///
/// Returns the host's error if the edit fails.
pub fn place_selection_tags(
    host: &dyn DocumentHost,
    anchor: &NodeId,
    tags: &TagSet,
) -> Result<Placement> {
    let text = PlacementMode::Selection.render(tags);
    let id = host.insert_block(anchor, &text, InsertPosition::Sibling)?;
    tracing::debug!(block = %anchor, tags_block = %id, "inserted selection tags block");
    Ok(Placement::Inserted(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;

    fn host_with_block(text: &str) -> (InMemoryHost, PageRef, NodeId) {
        let host = InMemoryHost::new();
        let page = host.add_page("Notes").unwrap();
        let id = host.append_block(&page, None, text).unwrap();
        (host, page, id)
    }

    #[test]
    fn test_find_tags_child_case_insensitive() {
        let node = ContentNode::new("p", "parent")
            .with_child(ContentNode::new("a", "no tags here"))
            .with_child(ContentNode::new("b", "TAGS:: OLD"))
            .with_child(ContentNode::new("c", "tags:: LATER"));
        assert_eq!(find_tags_child(&node).map(|n| n.id.as_str()), Some("b"));
    }

    #[test]
    fn test_find_tags_child_ignores_descendants_and_lookalikes() {
        let node = ContentNode::new("p", "parent")
            .with_child(ContentNode::new("a", "Page Tags:: X"))
            .with_child(ContentNode::new("b", " tags:: indented"))
            .with_child(ContentNode::new("é", "é"));
        assert!(find_tags_child(&node).is_none());
    }

    #[test]
    fn test_block_updates_existing_tags_child() {
        let (host, page, target) = host_with_block("Quarterly planning");
        let existing = host.append_block(&page, Some(&target), "tags:: OLD").unwrap();

        let placement =
            place_block_tags(&host, &target, &TagSet::from_tags(["NEW1", "NEW2"])).unwrap();

        assert_eq!(placement, Placement::Updated(existing.clone()));
        assert_eq!(host.text(&existing).unwrap(), "tags:: NEW1, NEW2");
        assert_eq!(host.child_ids(&target).unwrap(), vec![existing]);
        assert_eq!(host.root_ids(&page).unwrap().len(), 1);
    }

    #[test]
    fn test_block_inserts_last_child() {
        let (host, page, target) = host_with_block("Quarterly planning");
        let first = host.append_block(&page, Some(&target), "detail").unwrap();

        let placement = place_block_tags(&host, &target, &TagSet::from_tags(["A", "B"])).unwrap();

        let Placement::Inserted(id) = placement else {
            panic!("expected insert");
        };
        assert_eq!(host.text(&id).unwrap(), "tags:: A, B");
        assert_eq!(host.child_ids(&target).unwrap(), vec![first, id]);
    }

    #[test]
    fn test_block_unknown_target() {
        let (host, _, _) = host_with_block("x");
        let result = place_block_tags(&host, &NodeId::new("missing"), &TagSet::from_tags(["A"]));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_page_appends_after_last_block() {
        let (host, page, first) = host_with_block("first");
        host.append_block(&page, None, "Page Tags:: OLD").unwrap();
        let blocks = host.page_blocks(&page).unwrap();

        let placement =
            place_page_tags(&host, &page, &blocks, &TagSet::from_tags(["AI", "2025"])).unwrap();

        let roots = host.root_ids(&page).unwrap();
        assert_eq!(roots.len(), 3);
        assert_eq!(roots[0], first);
        assert_eq!(&roots[2], placement.node());
        assert_eq!(host.text(placement.node()).unwrap(), "Page Tags:: AI, 2025");
    }

    #[test]
    fn test_page_without_blocks_inserts_top_level() {
        let host = InMemoryHost::new();
        let page = host.add_page("Empty").unwrap();

        let placement = place_page_tags(&host, &page, &[], &TagSet::from_tags(["A"])).unwrap();

        assert_eq!(host.root_ids(&page).unwrap(), vec![placement.node().clone()]);
        assert_eq!(host.text(placement.node()).unwrap(), "Page Tags:: A");
    }

    #[test]
    fn test_selection_inserts_sibling() {
        let (host, page, anchor) = host_with_block("editing");
        let after = host.append_block(&page, None, "after").unwrap();

        let placement =
            place_selection_tags(&host, &anchor, &TagSet::from_tags(["X", "Y"])).unwrap();

        let roots = host.root_ids(&page).unwrap();
        assert_eq!(roots, vec![anchor, placement.node().clone(), after]);
        assert_eq!(host.text(placement.node()).unwrap(), "Selection Tags:: X, Y");
    }
}
