//! Decoding a file set into document handles

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::engine::{is_pdf_candidate, DocumentHandle, PdfEngine};
use crate::index::DocumentSlot;
use crate::messages;
use crate::store::FileBlob;

/// Result of loading a file set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub documents: Vec<DocumentSlot>,
    pub total_pages: usize,
    /// Names of inputs that were not PDFs or failed to decode
    pub skipped: Vec<String>,
    pub message: String,
}

impl LoadReport {
    pub fn new(documents: Vec<DocumentSlot>, total_pages: usize, skipped: Vec<String>) -> Self {
        let message = messages::load_success(documents.len(), total_pages);
        Self {
            documents,
            total_pages,
            skipped,
            message,
        }
    }
}

/// Split `files` into PDF candidates and skipped names
pub fn partition_candidates(files: Vec<FileBlob>) -> (Vec<FileBlob>, Vec<String>) {
    let mut skipped = Vec::new();
    let candidates = files
        .into_iter()
        .filter(|file| {
            let keep = is_pdf_candidate(&file.name, &file.bytes);
            if !keep {
                tracing::debug!(file = %file.name, "Ignoring non-PDF input");
                skipped.push(file.name.clone());
            }
            keep
        })
        .collect();
    (candidates, skipped)
}

/// Decode every candidate concurrently, keeping input order
///
/// Failures are logged and reported by name.
pub async fn decode_all(
    engine: &dyn PdfEngine,
    files: &[FileBlob],
) -> (Vec<Arc<dyn DocumentHandle>>, Vec<String>) {
    let opened = join_all(
        files
            .iter()
            .map(|file| engine.open(&file.name, Arc::clone(&file.bytes))),
    )
    .await;

    let mut documents = Vec::with_capacity(files.len());
    let mut failed = Vec::new();
    for (file, result) in files.iter().zip(opened) {
        match result {
            Ok(document) => documents.push(document),
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "Skipping undecodable file");
                failed.push(file.name.clone());
            }
        }
    }
    (documents, failed)
}
