//! Cross-document full-text search
//!
//! Every page of every indexed document is scanned concurrently. Each page's
//! text runs are concatenated and tested against the compiled pattern; the
//! first match on a page becomes one [`SearchResult`]. Results are sorted by
//! global page once every page task has finished, so completion order never
//! leaks into the result order.

mod filter;
mod query;
mod summary;

use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::future::join_all;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use crate::engine::{EngineError, EngineResult, TextItem};
use crate::index::{GlobalPageEntry, GlobalPageIndex};
use crate::messages;
use crate::viewer::SessionId;

pub use filter::{document_names, filter_results, FileFilter};
pub use query::{compile_pattern, Query, SearchPattern};
pub use summary::{MatchSummary, CONTEXT_CHARS};

/// Separator placed between text runs when building a page's text
const RUN_SEPARATOR: &str = " ";

const DEFAULT_TEXT_CACHE_SIZE: usize = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("{prefix}{pattern}: {reason}", prefix = messages::INVALID_REGEX)]
    InvalidPattern { pattern: String, reason: String },
}

/// One matching page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub global_page: usize,
    pub document_index: usize,
    pub local_page: usize,
    pub document_name: String,
    pub summary: MatchSummary,
    /// "Page X: summary"
    pub label: String,
    /// "Page X (File: name)"
    pub location: String,
    /// Summary with the match wrapped in `<mark>`
    pub html: String,
}

impl SearchResult {
    pub fn new(entry: &GlobalPageEntry, summary: MatchSummary) -> Self {
        Self {
            global_page: entry.global_page,
            document_index: entry.document_index,
            local_page: entry.local_page,
            document_name: entry.document_name.clone(),
            label: messages::result_summary(entry.global_page, &summary.to_string()),
            location: messages::result_page_info(entry.global_page, &entry.document_name),
            html: summary.to_html(),
            summary,
        }
    }
}

type TextKey = (SessionId, usize, usize);

/// Page scanner with a per-session text cache
pub struct SearchEngine {
    text_cache: Mutex<LruCache<TextKey, Arc<String>>>,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_CACHE_SIZE)
    }
}

impl SearchEngine {
    pub fn new(cache_size: usize) -> Self {
        let size = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            text_cache: Mutex::new(LruCache::new(size)),
        }
    }

    /// Scan every page of `index` for `pattern`
    ///
    /// Pages whose text cannot be read are logged and skipped.
    pub async fn search(
        &self,
        pattern: &SearchPattern,
        index: &GlobalPageIndex,
        session: SessionId,
    ) -> Vec<SearchResult> {
        let tasks = index
            .entries()
            .iter()
            .map(|entry| self.scan_page(pattern, index, entry, session));

        let mut results: Vec<SearchResult> = join_all(tasks).await.into_iter().flatten().collect();
        results.sort_by_key(|r| r.global_page);

        tracing::debug!(
            pattern = pattern.as_str(),
            pages = index.total_pages(),
            matches = results.len(),
            "Search finished"
        );
        results
    }

    async fn scan_page(
        &self,
        pattern: &SearchPattern,
        index: &GlobalPageIndex,
        entry: &GlobalPageEntry,
        session: SessionId,
    ) -> Option<SearchResult> {
        let text = match self.page_text(index, entry, session).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    document = %entry.document_name,
                    page = entry.local_page,
                    error = %e,
                    "Skipping page in search"
                );
                return None;
            }
        };

        let (start, end) = pattern.find(&text)?;
        Some(SearchResult::new(entry, MatchSummary::around(&text, start, end)))
    }

    /// Concatenated text of one page, cached per session
    pub async fn page_text(
        &self,
        index: &GlobalPageIndex,
        entry: &GlobalPageEntry,
        session: SessionId,
    ) -> EngineResult<Arc<String>> {
        let key = (session, entry.document_index, entry.local_page);
        if let Some(text) = self.text_cache.lock().get(&key) {
            return Ok(Arc::clone(text));
        }

        let document = index
            .document(entry.document_index)
            .ok_or(EngineError::PageNotFound(entry.local_page))?;
        let page = document.get_page(entry.local_page).await?;
        let items = page.text_content().await?;
        let text = Arc::new(join_runs(&items));

        self.text_cache.lock().put(key, Arc::clone(&text));
        Ok(text)
    }

    /// Drop cached text for every session but `keep`
    pub fn retain_session(&self, keep: SessionId) {
        let mut cache = self.text_cache.lock();
        let stale: Vec<TextKey> = cache
            .iter()
            .filter(|((session, _, _), _)| *session != keep)
            .map(|(k, _)| *k)
            .collect();
        for key in stale {
            cache.pop(&key);
        }
    }

    pub fn cached_pages(&self) -> usize {
        self.text_cache.lock().len()
    }
}

/// Concatenate run strings into a page's searchable text
pub fn join_runs(items: &[TextItem]) -> String {
    items
        .iter()
        .map(|item| item.text.as_str())
        .collect::<Vec<_>>()
        .join(RUN_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{ScriptedEngine, ScriptedPage};
    use crate::engine::PdfEngine;

    async fn index_for(engine: &ScriptedEngine, names: &[&str]) -> GlobalPageIndex {
        let mut documents = Vec::new();
        for name in names {
            documents.push(engine.open(name, Arc::new(Vec::new())).await.unwrap());
        }
        GlobalPageIndex::build(documents).unwrap()
    }

    fn pattern(input: &str) -> SearchPattern {
        compile_pattern(input).unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_results_across_two_documents() {
        let engine = ScriptedEngine::new()
            .with_text_document("a.pdf", &[&["intro"], &["the keyword is here"], &["outro"]])
            .with_text_document("b.pdf", &[&["another keyword"], &["nothing"]]);
        let index = index_for(&engine, &["a.pdf", "b.pdf"]).await;

        let results = SearchEngine::default()
            .search(&pattern("keyword"), &index, SessionId::default())
            .await;

        let pages: Vec<usize> = results.iter().map(|r| r.global_page).collect();
        assert_eq!(pages, vec![2, 4]);
        assert_eq!(results[0].document_name, "a.pdf");
        assert_eq!(results[0].local_page, 2);
        assert_eq!(results[1].document_name, "b.pdf");
        assert_eq!(results[1].document_index, 1);
        assert_eq!(results[1].local_page, 1);
    }

    #[tokio::test]
    async fn test_order_is_independent_of_completion_order() {
        let engine = ScriptedEngine::new().with_document(
            "slow.pdf",
            vec![
                ScriptedPage::text(&["match one"]).delayed(50),
                ScriptedPage::text(&["match two"]).delayed(20),
                ScriptedPage::text(&["match three"]),
            ],
        );
        let index = index_for(&engine, &["slow.pdf"]).await;

        let results = SearchEngine::default()
            .search(&pattern("match"), &index, SessionId::default())
            .await;

        let pages: Vec<usize> = results.iter().map(|r| r.global_page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unreadable_page_is_skipped() {
        let engine = ScriptedEngine::new().with_document(
            "mixed.pdf",
            vec![
                ScriptedPage::text(&["keyword"]).failing_text(),
                ScriptedPage::text(&["keyword again"]),
            ],
        );
        let index = index_for(&engine, &["mixed.pdf"]).await;

        let results = SearchEngine::default()
            .search(&pattern("keyword"), &index, SessionId::default())
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].global_page, 2);
    }

    #[tokio::test]
    async fn test_only_first_match_per_page() {
        let engine = ScriptedEngine::new()
            .with_text_document("a.pdf", &[&["alpha keyword", "beta keyword"]]);
        let index = index_for(&engine, &["a.pdf"]).await;

        let results = SearchEngine::default()
            .search(&pattern("keyword"), &index, SessionId::default())
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].summary.before, "alpha ");
        assert_eq!(results[0].summary.after, " beta keyword");
    }

    #[tokio::test]
    async fn test_results_carry_labels_and_marked_html() {
        let engine = ScriptedEngine::new()
            .with_blank_document("a.pdf", 1)
            .with_text_document("b.pdf", &[&["x < y keyword"]]);
        let index = index_for(&engine, &["a.pdf", "b.pdf"]).await;

        let results = SearchEngine::default()
            .search(&pattern("keyword"), &index, SessionId::default())
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "Page 2: x < y keyword");
        assert_eq!(results[0].location, "Page 2 (File: b.pdf)");
        assert_eq!(results[0].html, "x &lt; y <mark>keyword</mark>");
    }

    #[tokio::test]
    async fn test_runs_join_with_space() {
        let engine = ScriptedEngine::new().with_text_document("a.pdf", &[&["foo", "bar"]]);
        let index = index_for(&engine, &["a.pdf"]).await;

        let results = SearchEngine::default()
            .search(&pattern("/foo bar/"), &index, SessionId::default())
            .await;

        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_text_cache_is_per_session() {
        let engine = ScriptedEngine::new().with_blank_document("a.pdf", 3);
        let index = index_for(&engine, &["a.pdf"]).await;
        let search = SearchEngine::default();
        let first = SessionId::default();
        let second = first.next();

        search.search(&pattern("page"), &index, first).await;
        search.search(&pattern("page"), &index, first).await;
        assert_eq!(engine.text_calls(), 3);
        assert_eq!(search.cached_pages(), 3);

        search.search(&pattern("page"), &index, second).await;
        assert_eq!(engine.text_calls(), 6);

        search.retain_session(second);
        assert_eq!(search.cached_pages(), 3);
    }
}
