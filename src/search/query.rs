//! Query parsing and pattern compilation
//!
//! A query is either a list of literal keywords or a delimited raw pattern:
//!
//! - `foo bar` matches "foo", then anything (non-greedy), then "bar",
//!   case-insensitively. Keyword order matters.
//! - `/^Chapter \d+/i` is compiled as written, with `i`, `m` and `s` flags
//!   honoured and `g`, `u`, `d` accepted as no-ops.

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use super::SearchError;

/// Connector placed between keywords
const KEYWORD_GAP: &str = ".*?";

/// Parsed search query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Query {
    /// Whitespace-separated literal keywords, matched in order
    Keywords { keywords: Vec<String> },
    /// `/body/flags` user pattern
    RawPattern { body: String, flags: String },
}

impl Query {
    /// Parse user input; `None` when there is nothing to search for
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some((body, flags)) = split_delimited(trimmed) {
            return Some(Self::RawPattern {
                body: body.to_string(),
                flags: flags.to_string(),
            });
        }

        let keywords: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
        Some(Self::Keywords { keywords })
    }

    /// Compile into a match pattern
    pub fn compile(&self) -> Result<SearchPattern, SearchError> {
        match self {
            Self::Keywords { keywords } => {
                let source = keywords
                    .iter()
                    .map(|k| regex::escape(k))
                    .collect::<Vec<_>>()
                    .join(KEYWORD_GAP);

                let regex = RegexBuilder::new(&source)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| SearchError::InvalidPattern {
                        pattern: source.clone(),
                        reason: e.to_string(),
                    })?;

                Ok(SearchPattern {
                    key: format!("/{}/i", source),
                    regex,
                })
            }
            Self::RawPattern { body, flags } => {
                let invalid = |reason: String| SearchError::InvalidPattern {
                    pattern: format!("/{}/{}", body, flags),
                    reason,
                };

                let mut builder = RegexBuilder::new(body);
                let mut seen = String::new();
                for flag in flags.chars() {
                    if seen.contains(flag) {
                        return Err(invalid(format!("duplicate flag '{}'", flag)));
                    }
                    seen.push(flag);

                    match flag {
                        'i' => {
                            builder.case_insensitive(true);
                        }
                        'm' => {
                            builder.multi_line(true);
                        }
                        's' => {
                            builder.dot_matches_new_line(true);
                        }
                        'g' | 'u' | 'd' => {}
                        other => return Err(invalid(format!("unsupported flag '{}'", other))),
                    }
                }

                let regex = builder.build().map_err(|e| invalid(e.to_string()))?;

                let mut sorted: Vec<char> = flags.chars().filter(|f| "ims".contains(*f)).collect();
                sorted.sort_unstable();
                Ok(SearchPattern {
                    key: format!("/{}/{}", body, sorted.into_iter().collect::<String>()),
                    regex,
                })
            }
        }
    }
}

/// Parse and compile in one step; `Ok(None)` for an empty query
pub fn compile_pattern(input: &str) -> Result<Option<SearchPattern>, SearchError> {
    Query::parse(input).map(|q| q.compile()).transpose()
}

/// Split `/body/flags`; flags must be ASCII letters and body non-empty
fn split_delimited(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    let (body, flags) = (&rest[..close], &rest[close + 1..]);

    if body.is_empty() || !flags.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((body, flags))
}

/// Compiled search pattern
///
/// Two patterns are equal when they match the same way, regardless of how
/// the query was typed (`foo  bar` and `foo bar` are equal).
#[derive(Debug, Clone)]
pub struct SearchPattern {
    key: String,
    regex: Regex,
}

impl SearchPattern {
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Byte span of the first match
    pub fn find(&self, text: &str) -> Option<(usize, usize)> {
        self.regex.find(text).map(|m| (m.start(), m.end()))
    }

    /// Canonical `/source/flags` form
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl PartialEq for SearchPattern {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for SearchPattern {}
