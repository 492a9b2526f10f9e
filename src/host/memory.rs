//! In-memory document host.

use super::{DocumentHost, InsertPosition};
use crate::models::{ContentNode, NodeId, PageRef};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct NodeRecord {
    text: String,
    page: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Document {
    /// Page names in creation order, with their top-level node ids.
    pages: Vec<(String, Vec<NodeId>)>,
    nodes: HashMap<NodeId, NodeRecord>,
    current_page: Option<String>,
    selection: Option<String>,
}

impl Document {
    fn roots(&self, page: &str) -> Option<&Vec<NodeId>> {
        self.pages
            .iter()
            .find(|(name, _)| name == page)
            .map(|(_, roots)| roots)
    }

    fn roots_mut(&mut self, page: &str) -> Option<&mut Vec<NodeId>> {
        self.pages
            .iter_mut()
            .find(|(name, _)| name == page)
            .map(|(_, roots)| roots)
    }

    fn node(&self, id: &NodeId, include_children: bool) -> Option<ContentNode> {
        let record = self.nodes.get(id)?;
        let children = if include_children {
            record
                .children
                .iter()
                .filter_map(|child| self.node(child, false))
                .collect()
        } else {
            Vec::new()
        };
        Some(ContentNode {
            id: id.clone(),
            text: record.text.clone(),
            children,
        })
    }

    fn attach(
        &mut self,
        page: &str,
        parent: Option<&NodeId>,
        after: Option<&NodeId>,
        text: &str,
    ) -> Result<NodeId> {
        let id = NodeId::generate();
        let siblings = match parent {
            Some(parent_id) => {
                &mut self
                    .nodes
                    .get_mut(parent_id)
                    .ok_or_else(|| unknown_node("attach_block", parent_id))?
                    .children
            },
            None => self
                .roots_mut(page)
                .ok_or_else(|| unknown_page("attach_block", page))?,
        };
        let index = after
            .and_then(|anchor| siblings.iter().position(|s| s == anchor))
            .map_or(siblings.len(), |pos| pos + 1);
        siblings.insert(index, id.clone());

        self.nodes.insert(
            id.clone(),
            NodeRecord {
                text: text.to_string(),
                page: page.to_string(),
                parent: parent.cloned(),
                children: Vec::new(),
            },
        );
        Ok(id)
    }
}

/// A [`DocumentHost`] holding pages and nodes in memory.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    doc: Mutex<Document>,
}

impl InMemoryHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page, or returns the existing one with that name.
    ///
    /// The first page added becomes the current page.
    ///
    /// # Errors
    ///
    /// Returns an error if the document lock is poisoned.
    pub fn add_page(&self, name: &str) -> Result<PageRef> {
        let mut doc = self.lock()?;
        if doc.roots(name).is_none() {
            doc.pages.push((name.to_string(), Vec::new()));
        }
        if doc.current_page.is_none() {
            doc.current_page = Some(name.to_string());
        }
        Ok(PageRef::new(name))
    }

    /// Appends a node to a page, under `parent` or at the top level.
    ///
    /// # Errors
    ///
    /// Returns an error if the page or parent does not exist.
    pub fn append_block(
        &self,
        page: &PageRef,
        parent: Option<&NodeId>,
        text: &str,
    ) -> Result<NodeId> {
        self.lock()?.attach(&page.name, parent, None, text)
    }

    /// Switches the current page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page does not exist.
    pub fn set_current_page(&self, page: &PageRef) -> Result<()> {
        let mut doc = self.lock()?;
        if doc.roots(&page.name).is_none() {
            return Err(unknown_page("set_current_page", &page.name));
        }
        doc.current_page = Some(page.name.clone());
        Ok(())
    }

    /// Sets or clears the user's text selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the document lock is poisoned.
    pub fn set_selection(&self, selection: Option<String>) -> Result<()> {
        self.lock()?.selection = selection;
        Ok(())
    }

    /// Top-level node ids of a page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page does not exist.
    pub fn root_ids(&self, page: &PageRef) -> Result<Vec<NodeId>> {
        self.lock()?
            .roots(&page.name)
            .cloned()
            .ok_or_else(|| unknown_page("root_ids", &page.name))
    }

    /// Direct child ids of a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist.
    pub fn child_ids(&self, id: &NodeId) -> Result<Vec<NodeId>> {
        self.lock()?
            .nodes
            .get(id)
            .map(|record| record.children.clone())
            .ok_or_else(|| unknown_node("child_ids", id))
    }

    /// Text of a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist.
    pub fn text(&self, id: &NodeId) -> Result<String> {
        self.lock()?
            .nodes
            .get(id)
            .map(|record| record.text.clone())
            .ok_or_else(|| unknown_node("text", id))
    }

    /// Total number of nodes across all pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the document lock is poisoned.
    pub fn node_count(&self) -> Result<usize> {
        Ok(self.lock()?.nodes.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Document>> {
        self.doc.lock().map_err(|e| Error::OperationFailed {
            operation: "lock_document".to_string(),
            cause: e.to_string(),
        })
    }
}

impl DocumentHost for InMemoryHost {
    fn block(&self, id: &NodeId, include_children: bool) -> Result<Option<ContentNode>> {
        Ok(self.lock()?.node(id, include_children))
    }

    fn current_page(&self) -> Result<Option<PageRef>> {
        Ok(self.lock()?.current_page.clone().map(PageRef::new))
    }

    fn page_blocks(&self, page: &PageRef) -> Result<Vec<ContentNode>> {
        let doc = self.lock()?;
        let roots = doc
            .roots(&page.name)
            .ok_or_else(|| unknown_page("page_blocks", &page.name))?;
        Ok(roots.iter().filter_map(|id| doc.node(id, true)).collect())
    }

    fn selection(&self) -> Result<Option<String>> {
        Ok(self.lock()?.selection.clone())
    }

    fn insert_block(
        &self,
        anchor: &NodeId,
        text: &str,
        position: InsertPosition,
    ) -> Result<NodeId> {
        let mut doc = self.lock()?;
        let record = doc
            .nodes
            .get(anchor)
            .cloned()
            .ok_or_else(|| unknown_node("insert_block", anchor))?;
        match position {
            InsertPosition::Child => doc.attach(&record.page, Some(anchor), None, text),
            InsertPosition::Sibling => {
                doc.attach(&record.page, record.parent.as_ref(), Some(anchor), text)
            },
        }
    }

    fn insert_page_block(&self, page: &PageRef, text: &str) -> Result<NodeId> {
        self.lock()?.attach(&page.name, None, None, text)
    }

    fn update_block(&self, id: &NodeId, text: &str) -> Result<()> {
        let mut doc = self.lock()?;
        let record = doc
            .nodes
            .get_mut(id)
            .ok_or_else(|| unknown_node("update_block", id))?;
        record.text = text.to_string();
        Ok(())
    }
}

fn unknown_node(operation: &str, id: &NodeId) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!("unknown block: {id}"),
    }
}

fn unknown_page(operation: &str, page: &str) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!("unknown page: {page}"),
    }
}
