//! Mentions and their canonical keys.
//!
//! A mention is a half-open character span `[start, end)` in a document.
//! Across the whole system a mention is identified by its key, the string
//! `"<label>;<start>;<end>"` where `label` is the covered text. Two mentions
//! are the same occurrence iff their keys are equal, so every set lookup
//! (secondary selections, related-answer matching) compares keys, never
//! object identity.
//!
//! # Labels containing `;`
//!
//! The store format is a plain semicolon-delimited triple. Source documents
//! are not expected to produce labels containing `;`, but a key is parsed
//! from the right so that the two offsets are still recovered when one does.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::offset::{char_len, slice_chars};

// ============================================================================
// DocumentSide
// ============================================================================

/// Which document of the pair a mention belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSide {
    /// The news article.
    News,
    /// The scientific paper.
    Science,
}

impl DocumentSide {
    /// The other document of the pair.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            DocumentSide::News => DocumentSide::Science,
            DocumentSide::Science => DocumentSide::News,
        }
    }

    /// Name used in request paths and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentSide::News => "news",
            DocumentSide::Science => "science",
        }
    }
}

impl fmt::Display for DocumentSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(DocumentSide::News),
            "science" | "sci" => Ok(DocumentSide::Science),
            other => Err(Error::invalid_input(format!(
                "unknown document side '{other}' (expected news or science)"
            ))),
        }
    }
}

// ============================================================================
// MentionKey
// ============================================================================

/// Canonical identity of a mention: `"<label>;<start>;<end>"`.
///
/// The string is kept exactly as received so it round-trips bit-exact to the
/// store. Equality and hashing are on the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentionKey(String);

/// Borrowed view of the three fields of a [`MentionKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts<'a> {
    /// Covered text.
    pub label: &'a str,
    /// Start offset (chars, inclusive).
    pub start: usize,
    /// End offset (chars, exclusive).
    pub end: usize,
}

impl MentionKey {
    /// Format a key from its parts.
    #[must_use]
    pub fn new(label: &str, start: usize, end: usize) -> Self {
        Self(format!("{label};{start};{end}"))
    }

    /// Wrap a raw key string without validating it.
    ///
    /// Keys arriving from the store are compared as opaque strings, so a
    /// malformed key only becomes an error when something needs its offsets.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty key, which stands for "no mention" on a singleton side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split the key into label and offsets.
    pub fn parts(&self) -> Result<KeyParts<'_>> {
        let mut fields = self.0.rsplitn(3, ';');
        let (Some(end), Some(start), Some(label)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::parse(format!(
                "mention key '{}' is not of the form label;start;end",
                self.0
            )));
        };
        let start = start
            .trim()
            .parse::<usize>()
            .map_err(|e| Error::parse(format!("bad start offset in '{}': {e}", self.0)))?;
        let end = end
            .trim()
            .parse::<usize>()
            .map_err(|e| Error::parse(format!("bad end offset in '{}': {e}", self.0)))?;
        Ok(KeyParts { label, start, end })
    }

    /// The label part, or the whole key when it cannot be parsed.
    #[must_use]
    pub fn label(&self) -> &str {
        self.parts().map(|p| p.label).unwrap_or(&self.0)
    }

    /// Start and end offsets.
    pub fn offsets(&self) -> Result<(usize, usize)> {
        self.parts().map(|p| (p.start, p.end))
    }
}

impl fmt::Display for MentionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MentionKey {
    type Err = Error;

    /// Parse and validate a key string.
    fn from_str(s: &str) -> Result<Self> {
        let key = Self::from_raw(s);
        key.parts()?;
        Ok(key)
    }
}

impl From<&Mention> for MentionKey {
    fn from(mention: &Mention) -> Self {
        mention.key.clone()
    }
}

impl AsRef<str> for MentionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Mention
// ============================================================================

/// A span of document text believed to denote an entity.
///
/// Role flags (primary / secondary) are not part of a mention; they are
/// attached by whoever renders or judges it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mention {
    key: MentionKey,
    start: usize,
    end: usize,
}

impl Mention {
    /// Create a mention over `text[start..end)` (char offsets), deriving its key.
    pub fn new(text: &str, start: usize, end: usize) -> Result<Self> {
        let len = char_len(text);
        if start >= end || end > len {
            return Err(Error::out_of_bounds(start, end, len));
        }
        let label = slice_chars(text, start, end).ok_or(Error::out_of_bounds(start, end, len))?;
        Ok(Self {
            key: MentionKey::new(label, start, end),
            start,
            end,
        })
    }

    /// Resolve a stored key against its document.
    ///
    /// The key is kept verbatim. A label that disagrees with the text at the
    /// given offsets is logged, since the offsets are authoritative.
    pub fn from_key(text: &str, key: &MentionKey) -> Result<Self> {
        let parts = key.parts()?;
        let len = char_len(text);
        if parts.start >= parts.end || parts.end > len {
            return Err(Error::out_of_bounds(parts.start, parts.end, len));
        }
        if slice_chars(text, parts.start, parts.end) != Some(parts.label) {
            log::warn!(
                "mention key '{}' does not match document text at [{}, {})",
                key,
                parts.start,
                parts.end
            );
        }
        Ok(Self {
            key: key.clone(),
            start: parts.start,
            end: parts.end,
        })
    }

    /// Canonical key.
    #[must_use]
    pub fn key(&self) -> &MentionKey {
        &self.key
    }

    /// Covered text as recorded in the key.
    #[must_use]
    pub fn label(&self) -> &str {
        self.key.label()
    }

    /// Start offset (chars, inclusive).
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset (chars, exclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Span length in chars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false; mentions are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True when `other` lies within this span (bounds may coincide).
    #[must_use]
    pub fn contains(&self, other: &Mention) -> bool {
        span_contains((self.start, self.end), (other.start, other.end))
    }

    /// True when the two spans share at least one character.
    #[must_use]
    pub fn overlaps(&self, other: &Mention) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when the spans intersect but neither contains the other.
    #[must_use]
    pub fn crosses(&self, other: &Mention) -> bool {
        spans_cross((self.start, self.end), (other.start, other.end))
    }
}

/// `outer` contains `inner` (bounds may coincide).
#[must_use]
pub(crate) fn span_contains(outer: (usize, usize), inner: (usize, usize)) -> bool {
    outer.0 <= inner.0 && inner.1 <= outer.1
}

/// The spans intersect without either containing the other.
#[must_use]
pub(crate) fn spans_cross(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 < b.1 && b.0 < a.1 && !span_contains(a, b) && !span_contains(b, a)
}
