//! Per-document result filtering

use serde::{Deserialize, Serialize};

use super::SearchResult;

/// Which documents' results are shown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "name", rename_all = "camelCase")]
pub enum FileFilter {
    #[default]
    All,
    Document(String),
}

impl FileFilter {
    /// `None` or `"all"` select every document
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("") | Some("all") => Self::All,
            Some(name) => Self::Document(name.to_string()),
        }
    }

    pub fn matches(&self, result: &SearchResult) -> bool {
        match self {
            Self::All => true,
            Self::Document(name) => result.document_name == *name,
        }
    }
}

/// Order-preserving subset of `results` selected by `filter`
pub fn filter_results(results: &[SearchResult], filter: &FileFilter) -> Vec<SearchResult> {
    results
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect()
}

/// Distinct document names in first-seen order
pub fn document_names(results: &[SearchResult]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for result in results {
        if !names.iter().any(|n| *n == result.document_name) {
            names.push(result.document_name.clone());
        }
    }
    names
}
