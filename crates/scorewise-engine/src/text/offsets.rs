use std::ops::Range;

use crate::text::Span;

/// Number of chars in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Char-offset to byte-offset table for one text.
///
/// Built once per text (O(n)); every lookup afterwards is O(1), and byte to
/// char lookups are a binary search.
#[derive(Debug, Clone)]
pub struct CharIndex<'a> {
    text: &'a str,
    /// Byte offset of every char boundary, including the final `text.len()`.
    boundaries: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let boundaries = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        Self { text, boundaries }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Length of the text in chars.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Byte offset of the given char offset, `None` past the end.
    pub fn byte(&self, char_offset: usize) -> Option<usize> {
        self.boundaries.get(char_offset).copied()
    }

    /// Char offset of a byte offset, `None` if it is not on a char boundary.
    pub fn char_at_byte(&self, byte_offset: usize) -> Option<usize> {
        self.boundaries.binary_search(&byte_offset).ok()
    }

    /// Byte range for a char span, `None` when the span is reversed or out of bounds.
    pub fn byte_range(&self, span: Span) -> Option<Range<usize>> {
        if span.start > span.end {
            return None;
        }
        Some(self.byte(span.start)?..self.byte(span.end)?)
    }

    /// Slice the text by char span.
    pub fn slice(&self, span: Span) -> Option<&'a str> {
        let range = self.byte_range(span)?;
        Some(&self.text[range])
    }
}
