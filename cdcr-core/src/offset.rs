//! Character/byte offset conversion.
//!
//! Mention spans are stored as character offsets (what annotators and the
//! task store count), while Rust strings are sliced by byte. [`CharIndex`]
//! precomputes the mapping once per document so every slice is O(1).
//!
//! ```text
//! Text: "Café owner"
//!
//!   char:  C  a  f  é     o  w  n  e  r
//!          0  1  2  3  4  5  6  7  8  9
//!   byte:  0  1  2  3-4 5  6  7  8  9  10
//! ```

/// Build an offset mapping table from char to byte.
///
/// Returns a vec where `mapping[char_idx]` gives the byte index; the final
/// entry is `text.len()`.
#[must_use]
pub fn build_char_to_byte_map(text: &str) -> Vec<usize> {
    let mut map: Vec<usize> = text.char_indices().map(|(byte_idx, _)| byte_idx).collect();
    map.push(text.len());
    map
}

/// Number of characters in `text`.
#[must_use]
pub fn char_len(text: &str) -> usize {
    if text.is_ascii() {
        text.len()
    } else {
        text.chars().count()
    }
}

/// Slice `text` by character offsets, returning `None` when the range is
/// reversed or runs past the end.
#[must_use]
pub fn slice_chars(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    if text.is_ascii() {
        return text.get(start..end);
    }
    let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    let byte_start = indices.nth(start)?;
    let byte_end = if end == start {
        byte_start
    } else {
        indices.nth(end - start - 1)?
    };
    text.get(byte_start..byte_end)
}

/// Precomputed char-to-byte index for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharIndex {
    char_to_byte: Vec<usize>,
    len_chars: usize,
    is_ascii: bool,
}

impl CharIndex {
    /// Create an index for the given text.
    #[must_use]
    pub fn new(text: &str) -> Self {
        if text.is_ascii() {
            // Identity mapping, no table needed.
            Self {
                char_to_byte: Vec::new(),
                len_chars: text.len(),
                is_ascii: true,
            }
        } else {
            let char_to_byte = build_char_to_byte_map(text);
            Self {
                len_chars: char_to_byte.len() - 1,
                char_to_byte,
                is_ascii: false,
            }
        }
    }

    /// Document length in characters.
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.len_chars
    }

    /// Convert a char offset to a byte offset, clamping to the end of text.
    #[must_use]
    pub fn char_to_byte(&self, char_idx: usize) -> usize {
        if self.is_ascii {
            char_idx.min(self.len_chars)
        } else {
            let idx = char_idx.min(self.len_chars);
            self.char_to_byte[idx]
        }
    }

    /// Slice `text` (which must be the text this index was built from) by
    /// char offsets. Offsets are clamped to the document.
    #[must_use]
    pub fn slice<'t>(&self, text: &'t str, start: usize, end: usize) -> &'t str {
        let start = self.char_to_byte(start);
        let end = self.char_to_byte(end).max(start);
        text.get(start..end).unwrap_or_default()
    }
}
