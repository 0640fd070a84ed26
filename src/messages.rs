//! User-facing message text

pub const NO_VALID_PDFS: &str = "No valid PDF files were selected.";
pub const LOAD_PDF_FIRST: &str = "Please load a PDF file first.";
pub const PAGE_RENDERING: &str = "Page is still rendering, please wait.";
pub const PAGE_INFO_ERROR: &str = "Could not get current page information.";
pub const HIGHLIGHTER_CLEARED: &str = "Highlighter marks have been cleared.";
pub const TEXT_COPIED: &str = "Page text copied to clipboard!";
pub const PARAGRAPH_COPIED: &str = "Paragraph copied!";
pub const LAST_RESULT: &str = "Reached the last result.";
pub const FIRST_RESULT: &str = "Reached the first result.";
pub const INVALID_REGEX: &str = "Invalid Regular Expression: ";
pub const KEYWORD_NOT_FOUND: &str = "Keyword not found";
pub const NO_MATCHES: &str = "No matching results found.";
pub const NO_RESULTS_IN_FILE: &str = "No search results in this file";
pub const STORE_UNAVAILABLE: &str = "Local storage is unavailable; files and notes will not be saved.";

pub fn load_success(documents: usize, pages: usize) -> String {
    format!(
        "Successfully loaded {} PDF(s) with a total of {} pages.",
        documents, pages
    )
}

pub fn matches_found(count: usize) -> String {
    format!("Found {} matching results.", count)
}

pub fn result_summary(page: usize, summary: &str) -> String {
    format!("Page {}: {}", page, summary)
}

pub fn result_page_info(page: usize, document: &str) -> String {
    format!("Page {} (File: {})", page, document)
}

pub fn page_indicator(current: usize, total: usize, document: Option<&str>) -> String {
    match document {
        Some(name) => format!("Page {} / {} (File: {})", current, total, name),
        None => format!("Page {} / {}", current, total),
    }
}

pub fn share_title(global_page: usize) -> String {
    format!("PDF Global Page {}", global_page)
}

pub fn share_text(local_page: usize, document: &str) -> String {
    format!("From page {} of {} (PDF Tool)", local_page, document)
}
