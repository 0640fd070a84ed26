//! Global page index
//!
//! Flattens an ordered list of documents into one contiguous, 1-based
//! global page space. Document A with 3 pages and document B with 2 pages
//! become global pages 1..=3 (A1..A3) and 4..=5 (B1..B2).
//!
//! The index is immutable. A new document set means a new index.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::engine::DocumentHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("No documents to index")]
    EmptyDocumentSet,
}

/// Location of one global page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPageEntry {
    /// 1-based position in the flattened page space
    pub global_page: usize,
    /// Index into the ordered document list
    pub document_index: usize,
    /// 1-based page within the owning document
    pub local_page: usize,
    pub document_name: String,
}

/// Per-document summary, one per indexed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSlot {
    pub document_index: usize,
    pub name: String,
    pub page_count: usize,
    /// Global page of the document's local page 1
    pub start_page: usize,
}

#[derive(Clone, Default)]
pub struct GlobalPageIndex {
    documents: Vec<Arc<dyn DocumentHandle>>,
    slots: Vec<DocumentSlot>,
    entries: Vec<GlobalPageEntry>,
}

impl fmt::Debug for GlobalPageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalPageIndex")
            .field("documents", &self.slots)
            .field("total_pages", &self.entries.len())
            .finish()
    }
}

impl GlobalPageIndex {
    /// Index with no documents; every lookup returns `None`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the index over `documents`, in order
    pub fn build(documents: Vec<Arc<dyn DocumentHandle>>) -> Result<Self, IndexError> {
        if documents.is_empty() {
            return Err(IndexError::EmptyDocumentSet);
        }

        let total: usize = documents.iter().map(|d| d.page_count()).sum();
        let mut entries = Vec::with_capacity(total);
        let mut slots = Vec::with_capacity(documents.len());

        for (document_index, document) in documents.iter().enumerate() {
            let start_page = entries.len() + 1;
            let page_count = document.page_count();

            for local_page in 1..=page_count {
                entries.push(GlobalPageEntry {
                    global_page: entries.len() + 1,
                    document_index,
                    local_page,
                    document_name: document.name().to_string(),
                });
            }

            slots.push(DocumentSlot {
                document_index,
                name: document.name().to_string(),
                page_count,
                start_page,
            });
        }

        Ok(Self {
            documents,
            slots,
            entries,
        })
    }

    /// Entry for a global page, or `None` when out of range
    pub fn resolve(&self, global_page: i64) -> Option<&GlobalPageEntry> {
        if global_page < 1 {
            return None;
        }
        let index = usize::try_from(global_page - 1).ok()?;
        self.entries.get(index)
    }

    /// Global page number of a document's first page
    pub fn find_start_page(&self, document_index: usize) -> Option<usize> {
        self.slots.get(document_index).map(|slot| slot.start_page)
    }

    /// Per-file jump list in document order
    pub fn slots(&self) -> &[DocumentSlot] {
        &self.slots
    }

    pub fn document(&self, document_index: usize) -> Option<&Arc<dyn DocumentHandle>> {
        self.documents.get(document_index)
    }

    pub fn entries(&self) -> &[GlobalPageEntry] {
        &self.entries
    }

    pub fn total_pages(&self) -> usize {
        self.entries.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clamp a requested page into `[1, total_pages]`; `None` when empty
    pub fn clamp(&self, global_page: i64) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let max = self.entries.len() as i64;
        Some(global_page.clamp(1, max) as usize)
    }
}
