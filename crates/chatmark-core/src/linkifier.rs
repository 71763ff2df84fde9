use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

/// A configuration-time failure. Render-time linkifier application cannot
/// fail: every template placeholder is checked against the pattern's
/// capture groups before the linkifier is accepted into the table.
#[derive(Debug, Error)]
pub enum LinkifierError {
    #[error("invalid linkifier pattern `{pattern}`: {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("url template references {{{name}}} but the pattern has no capture group `{name}`")]
    UnboundPlaceholder { name: String },
}

#[derive(Clone, Debug)]
struct Linkifier {
    pattern: Regex,
    url_template: String,
}

impl Linkifier {
    fn expand(&self, caps: &Captures) -> String {
        let mut out = String::new();
        let template = self.url_template.as_str();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            match rest[open..].find('}') {
                Some(close) => {
                    let name = &rest[open + 1..open + close];
                    match caps.name(name) {
                        Some(group) => out.push_str(group.as_str()),
                        // Group did not participate in this match; the
                        // placeholder expands to nothing.
                        None => {}
                    }
                    rest = &rest[open + close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Realm linkifiers in priority order: the earlier a linkifier was added,
/// the higher its priority when candidate matches overlap.
#[derive(Clone, Debug, Default)]
pub struct LinkifierTable {
    linkifiers: Vec<Linkifier>,
}

impl LinkifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and appends a linkifier. Patterns use `(?P<name>...)` named
    /// capture groups; `url_template` binds them with `{name}` placeholders.
    pub fn add(&mut self, pattern: &str, url_template: &str) -> Result<(), LinkifierError> {
        let regex = Regex::new(pattern).map_err(|source| LinkifierError::BadPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let group_names: HashSet<&str> = regex.capture_names().flatten().collect();
        for name in template_placeholders(url_template) {
            if !group_names.contains(name.as_str()) {
                return Err(LinkifierError::UnboundPlaceholder { name });
            }
        }
        self.linkifiers.push(Linkifier {
            pattern: regex,
            url_template: url_template.to_string(),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.linkifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.linkifiers.is_empty()
    }
}

fn template_placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        match rest[open..].find('}') {
            Some(close) => {
                names.push(rest[open + 1..open + close].to_string());
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    names
}

/// An accepted link match over a source string, in byte offsets.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub url: String,
}

static RAW_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bhttps?://[^\s<>"'`]+"#).expect("static raw-url pattern"));

struct Candidate {
    priority: usize,
    start: usize,
    end: usize,
    url: String,
}

/// Scans `text` for all linkifier and raw-URL matches and resolves overlaps.
///
/// Overlap resolution is priority-first: candidates are considered in
/// (priority, start) order and a candidate sharing any character position
/// with an already-accepted span is dropped. The raw-URL detector sits at
/// implicit lowest priority. Accepted spans are then ordered by their start
/// position in the source, independent of which linkifier produced them.
pub(crate) fn link_spans(text: &str, table: &LinkifierTable) -> Vec<LinkSpan> {
    let mut candidates = Vec::new();
    for (priority, linkifier) in table.linkifiers.iter().enumerate() {
        for caps in linkifier.pattern.captures_iter(text) {
            let whole = match caps.get(0) {
                Some(whole) => whole,
                None => continue,
            };
            if whole.start() == whole.end() {
                continue;
            }
            candidates.push(Candidate {
                priority,
                start: whole.start(),
                end: whole.end(),
                url: linkifier.expand(&caps),
            });
        }
    }

    let raw_priority = table.linkifiers.len();
    for found in RAW_URL.find_iter(text) {
        let trimmed = trim_trailing_punctuation(found.as_str());
        if trimmed.is_empty() {
            continue;
        }
        candidates.push(Candidate {
            priority: raw_priority,
            start: found.start(),
            end: found.start() + trimmed.len(),
            url: trimmed.to_string(),
        });
    }

    candidates.sort_by(|a, b| {
        (a.priority, a.start, a.end).cmp(&(b.priority, b.start, b.end))
    });

    let mut accepted: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let overlaps = accepted
            .iter()
            .any(|kept| candidate.start < kept.end && kept.start < candidate.end);
        if !overlaps {
            accepted.push(candidate);
        }
    }
    accepted.sort_by_key(|candidate| candidate.start);

    accepted
        .into_iter()
        .map(|candidate| LinkSpan {
            start: candidate.start,
            end: candidate.end,
            text: text[candidate.start..candidate.end].to_string(),
            url: candidate.url,
        })
        .collect()
}

fn trim_trailing_punctuation(text: &str) -> &str {
    text.trim_end_matches(['.', ',', ';', ':', '!', '?', ')'])
}
