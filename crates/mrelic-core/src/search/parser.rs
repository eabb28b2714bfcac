//! Query tokenizer/parser.
//!
//! Turns a raw query string into an ordered list of [`SearchTerm`]s in a
//! single forward scan. The grammar, informally:
//!
//! ```text
//! query  := (space* term)*
//! term   := "-"? (keyed | text)
//! keyed  := key ":" ( "\"" .. "\"" | "*" .. "*" | word )
//! text   := "\"" .. "\"" | word
//! ```
//!
//! Parsing never fails. An unterminated quote runs to the end of the input,
//! and a `*` value with no closing `*` is kept as a literal key-value match
//! including the leading asterisk.
//!
//! Only ASCII delimiters are ever inspected, so byte offsets always fall on
//! UTF-8 character boundaries and slicing the input is safe.

use serde::Serialize;

const SPACE: u8 = b' ';
const QUOTE: u8 = b'"';
const COLON: u8 = b':';
const STAR: u8 = b'*';
const NEGATE: u8 = b'-';

/// What a [`SearchTerm`] tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TermKind {
    /// Unkeyed: substring of any field.
    Text,
    /// `key:value`: case-insensitive equality on one field.
    KeyValue { key: String },
    /// `key:*value*`: case-insensitive containment on one field.
    Wildcard { key: String },
}

/// One atomic predicate parsed from a query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchTerm {
    #[serde(flatten)]
    pub kind: TermKind,
    /// Literal or pattern, quotes stripped, original case preserved.
    pub value: String,
    pub negate: bool,
}

impl SearchTerm {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Text,
            value: value.into(),
            negate: false,
        }
    }

    pub fn key_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::KeyValue { key: key.into() },
            value: value.into(),
            negate: false,
        }
    }

    pub fn wildcard(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Wildcard { key: key.into() },
            value: value.into(),
            negate: false,
        }
    }

    /// Builder-style negation toggle.
    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// The field name for keyed kinds, `None` for text terms.
    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            TermKind::Text => None,
            TermKind::KeyValue { key } | TermKind::Wildcard { key } => Some(key),
        }
    }
}

/// Parse `query` into search terms. Empty or all-space input yields no terms.
pub fn parse(query: &str) -> Vec<SearchTerm> {
    let mut scanner = Scanner::new(query);
    let mut terms = Vec::new();

    while let Some(term) = scanner.next_term() {
        terms.push(term);
    }

    tracing::trace!(query, terms = terms.len(), "parsed search query");
    terms
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn next_term(&mut self) -> Option<SearchTerm> {
        while self.peek() == Some(SPACE) {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return None;
        }

        let negate = self.peek() == Some(NEGATE);
        if negate {
            self.pos += 1;
        }

        let term = match self.find_key_colon() {
            Some(colon) => {
                let key = self.src[self.pos..colon].trim().to_string();
                self.pos = colon + 1;
                self.keyed_value(key)
            }
            None => SearchTerm {
                kind: TermKind::Text,
                value: self.plain_or_quoted(),
                negate: false,
            },
        };

        Some(SearchTerm { negate, ..term })
    }

    /// Position of the first `:` outside quotes and before an unquoted space.
    fn find_key_colon(&self) -> Option<usize> {
        let mut in_quotes = false;
        for (i, &b) in self.bytes.iter().enumerate().skip(self.pos) {
            match b {
                QUOTE => in_quotes = !in_quotes,
                COLON if !in_quotes => return Some(i),
                SPACE if !in_quotes => return None,
                _ => {}
            }
        }
        None
    }

    fn keyed_value(&mut self, key: String) -> SearchTerm {
        match self.peek() {
            Some(QUOTE) => SearchTerm {
                kind: TermKind::KeyValue { key },
                value: self.quoted(),
                negate: false,
            },
            Some(STAR) => self.starred(key),
            _ => SearchTerm {
                kind: TermKind::KeyValue { key },
                value: self.word(),
                negate: false,
            },
        }
    }

    /// `*value*` is a wildcard; `*value` with no closing star is a literal.
    fn starred(&mut self, key: String) -> SearchTerm {
        let star = self.pos;
        self.pos += 1;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == SPACE || b == STAR {
                break;
            }
            self.pos += 1;
        }
        let end = self.pos;

        if self.peek() == Some(STAR) {
            self.pos += 1;
            SearchTerm {
                kind: TermKind::Wildcard { key },
                value: self.src[start..end].to_string(),
                negate: false,
            }
        } else {
            SearchTerm {
                kind: TermKind::KeyValue { key },
                value: self.src[star..end].to_string(),
                negate: false,
            }
        }
    }

    fn plain_or_quoted(&mut self) -> String {
        if self.peek() == Some(QUOTE) {
            self.quoted()
        } else {
            self.word()
        }
    }

    /// Consume `"..."`, returning the inner text. Runs to the end of the
    /// input when the closing quote is missing.
    fn quoted(&mut self) -> String {
        self.pos += 1;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == QUOTE {
                break;
            }
            self.pos += 1;
        }
        let value = self.src[start..self.pos].to_string();
        if self.peek() == Some(QUOTE) {
            self.pos += 1;
        }
        value
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == SPACE {
                break;
            }
            self.pos += 1;
        }
        self.src[start..self.pos].to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
