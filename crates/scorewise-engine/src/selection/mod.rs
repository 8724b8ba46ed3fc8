//! # Selection-to-Offset Mapper
//!
//! Resolves a selection made in a rendered essay view to a char span of the
//! plain-text source, so a correction can be anchored to it.
//!
//! ## Strategy
//!
//! 1. **Map** both selection ends through the [`RenderMap`] (a prefix-sum
//!    walk over rendered nodes; replacement text snaps to the replaced span).
//! 2. **Validate** the candidate span: the source text there must equal the
//!    live selected text, after trimming.
//! 3. **Fall back** to a literal search for the selected text when the
//!    candidate does not match, choosing the occurrence closest to the
//!    candidate so repeated phrases anchor where the teacher actually clicked.
//! 4. **Narrow** the span to exclude surrounding whitespace.
//!
//! Failure is explicit: callers get a [`SelectionError`] and decide how to
//! tell the user, rather than the correction being dropped silently.

use serde::{Deserialize, Serialize};

use crate::text::{CharIndex, Edge, RenderMap, Span};

pub use crate::text::RenderedPosition;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("selection could not be anchored to the essay text")]
    Unresolved,
    #[error("selection is empty")]
    EmptySelection,
    #[error("selection position {0:?} is outside the rendered text")]
    PositionOutOfRange(RenderedPosition),
}

/// A live selection: where the user started dragging and where they let go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedSelection {
    pub anchor: RenderedPosition,
    pub focus: RenderedPosition,
}

impl RenderedSelection {
    pub fn new(anchor: RenderedPosition, focus: RenderedPosition) -> Self {
        Self { anchor, focus }
    }

    /// Selection endpoints in document order.
    pub fn ordered(&self) -> (RenderedPosition, RenderedPosition) {
        if self.focus < self.anchor {
            (self.focus, self.anchor)
        } else {
            (self.anchor, self.focus)
        }
    }
}

/// A selection anchored to the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSelection {
    pub span: Span,
    /// Source text covered by `span`.
    pub text: String,
}

/// Maps rendered selections back to one essay's source text.
pub struct SelectionMapper<'a> {
    index: CharIndex<'a>,
    map: &'a RenderMap,
}

impl<'a> SelectionMapper<'a> {
    pub fn new(source: &'a str, map: &'a RenderMap) -> Self {
        Self {
            index: CharIndex::new(source),
            map,
        }
    }

    /// Resolve a node-addressed selection.
    pub fn resolve(
        &self,
        selection: &RenderedSelection,
        selected_text: &str,
    ) -> Result<ResolvedSelection, SelectionError> {
        let (from, to) = selection.ordered();
        let start = self
            .map
            .source_offset(from, Edge::Start)
            .ok_or(SelectionError::PositionOutOfRange(from))?;
        let end = self
            .map
            .source_offset(to, Edge::End)
            .ok_or(SelectionError::PositionOutOfRange(to))?;

        let rendered = self.map.rendered_between(from, to);
        // Both ends inside one replacement snap to the same boundary order.
        self.validate(
            Span::new(start, end.max(start)),
            rendered.as_deref(),
            selected_text,
        )
    }

    /// Resolve a selection described only by rendered text lengths: the
    /// number of chars before the selection and after it in the view.
    pub fn resolve_by_context(
        &self,
        preceding_len: usize,
        following_len: usize,
        selected_text: &str,
    ) -> Result<ResolvedSelection, SelectionError> {
        let rendered_len = self.map.rendered_len();
        let end = rendered_len
            .checked_sub(following_len)
            .filter(|end| *end >= preceding_len)
            .ok_or(SelectionError::Unresolved)?;

        let from = self
            .map
            .locate(preceding_len, Edge::Start)
            .ok_or(SelectionError::Unresolved)?;
        let to = self
            .map
            .locate(end, Edge::End)
            .ok_or(SelectionError::Unresolved)?;
        self.resolve(&RenderedSelection::new(from, to), selected_text)
    }

    /// Accept the candidate when the live selection matches either the
    /// source text under it or the rendered text it was mapped from.
    fn validate(
        &self,
        candidate: Span,
        rendered: Option<&str>,
        selected_text: &str,
    ) -> Result<ResolvedSelection, SelectionError> {
        let wanted = selected_text.trim();
        if wanted.is_empty() {
            return Err(SelectionError::EmptySelection);
        }

        // A rendered match only counts when the candidate is real source.
        if let Some(found) = self.index.slice(candidate)
            && !candidate.is_empty()
            && (found.trim() == wanted || rendered.is_some_and(|seen| seen.trim() == wanted))
        {
            return self.narrow(candidate);
        }

        log::debug!("selection at {candidate} does not match selected text, searching source");
        let span = self
            .search_nearest(wanted, candidate.start)
            .ok_or(SelectionError::Unresolved)?;
        self.narrow(span)
    }

    /// Occurrence of `needle` whose start is closest to `hint`; ties go to
    /// the earlier one. Overlapping occurrences are all candidates.
    fn search_nearest(&self, needle: &str, hint: usize) -> Option<Span> {
        let needle_len = needle.chars().count();
        let text = self.index.text();
        text.char_indices()
            .enumerate()
            .filter(|(_, (byte, _))| text[*byte..].starts_with(needle))
            .map(|(start, _)| start)
            .min_by_key(|start| start.abs_diff(hint))
            .map(|start| Span::new(start, start + needle_len))
    }

    /// Drop leading and trailing whitespace from a span of the source.
    fn narrow(&self, span: Span) -> Result<ResolvedSelection, SelectionError> {
        let text = self.index.slice(span).ok_or(SelectionError::Unresolved)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SelectionError::EmptySelection);
        }
        let leading = text.chars().take_while(|c| c.is_whitespace()).count();
        let start = span.start + leading;
        Ok(ResolvedSelection {
            span: Span::new(start, start + trimmed.chars().count()),
            text: trimmed.to_string(),
        })
    }
}
