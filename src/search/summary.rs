//! Match context summaries

use serde::Serialize;

/// Characters of context kept on each side of a match
pub const CONTEXT_CHARS: usize = 40;

const ELLIPSIS: &str = "...";

/// Match plus surrounding context, split so the match can be highlighted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub before: String,
    pub matched: String,
    pub after: String,
    /// Context was cut before `before`
    pub truncated_start: bool,
    /// Context was cut after `after`
    pub truncated_end: bool,
}

impl MatchSummary {
    /// Summarize the match at byte span `start..end` of `text`
    pub fn around(text: &str, start: usize, end: usize) -> Self {
        let head = &text[..start];
        let tail = &text[end..];

        let before_start = head
            .char_indices()
            .rev()
            .nth(CONTEXT_CHARS - 1)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let after_end = tail
            .char_indices()
            .nth(CONTEXT_CHARS)
            .map(|(i, _)| i)
            .unwrap_or(tail.len());

        Self {
            before: flatten(&head[before_start..]),
            matched: flatten(&text[start..end]),
            after: flatten(&tail[..after_end]),
            truncated_start: before_start > 0,
            truncated_end: after_end < tail.len(),
        }
    }

    /// HTML with the match wrapped in `<mark>`
    pub fn to_html(&self) -> String {
        format!(
            "{}{}<mark>{}</mark>{}{}",
            if self.truncated_start { ELLIPSIS } else { "" },
            html_escape::encode_text(&self.before),
            html_escape::encode_text(&self.matched),
            html_escape::encode_text(&self.after),
            if self.truncated_end { ELLIPSIS } else { "" },
        )
    }
}

impl std::fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.truncated_start {
            f.write_str(ELLIPSIS)?;
        }
        write!(f, "{}{}{}", self.before, self.matched, self.after)?;
        if self.truncated_end {
            f.write_str(ELLIPSIS)?;
        }
        Ok(())
    }
}

/// Render line breaks as spaces
fn flatten(s: &str) -> String {
    s.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}
