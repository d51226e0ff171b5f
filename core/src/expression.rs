//! Expression segmenter: splits `[Label] text [Other] more` into labelled runs.
//!
//! A tag marker is `[` followed by ASCII letters and whitespace, then `]`.
//! Anything else in brackets (`[1]`, `[]`, `[wow!]`) is plain text.
//!
//! The scanner keeps a current-label register that starts at
//! [`Expression::Default`], so an untagged prefix is labelled as if a
//! `[Default]` marker had been written in front of it. Each marker flushes the
//! span accumulated so far under the previous label and then replaces the
//! register. Spans that are empty after trimming are dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static TAG_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Za-z\s]+)\]").expect("tag marker pattern is valid"));

const DEFAULT_LABEL: &str = "Default";

/// Vocal delivery requested for a segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    /// Neutral delivery; no tone directive is sent upstream.
    #[default]
    Default,
    Named(String),
}

impl Expression {
    /// Build from raw tag contents. Whitespace is collapsed; `default` in any
    /// case (or a blank label) maps to the sentinel.
    pub fn from_label(label: &str) -> Self {
        let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
        if label.is_empty() || label.eq_ignore_ascii_case(DEFAULT_LABEL) {
            Expression::Default
        } else {
            Expression::Named(label)
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Expression::Default => DEFAULT_LABEL,
            Expression::Named(label) => label,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Expression::Default)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A run of text synthesized as one unit. `text` is trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub expression: Expression,
}

impl Segment {
    pub fn new(text: impl Into<String>, expression: Expression) -> Self {
        Self {
            text: text.into(),
            expression,
        }
    }
}

struct Scanner {
    current: Expression,
    segments: Vec<Segment>,
}

impl Scanner {
    fn new() -> Self {
        Self {
            current: Expression::Default,
            segments: Vec::new(),
        }
    }

    fn push_span(&mut self, span: &str) {
        let span = span.trim();
        if !span.is_empty() {
            self.segments.push(Segment::new(span, self.current.clone()));
        }
    }

    fn switch(&mut self, next: Expression) {
        self.current = next;
    }
}

/// Split annotated text into ordered segments.
///
/// Returns an empty list only for empty or whitespace-only input. Input made
/// up solely of markers (`"[Happy]"`) comes back whole as one `Default`
/// segment rather than vanishing.
pub fn segment(text: &str) -> Vec<Segment> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut scanner = Scanner::new();
    let mut cursor = 0;
    for caps in TAG_MARKER.captures_iter(text) {
        let (Some(marker), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        scanner.push_span(&text[cursor..marker.start()]);
        scanner.switch(Expression::from_label(label.as_str()));
        cursor = marker.end();
    }
    scanner.push_span(&text[cursor..]);

    if scanner.segments.is_empty() {
        return vec![Segment::new(text, Expression::Default)];
    }
    scanner.segments
}
