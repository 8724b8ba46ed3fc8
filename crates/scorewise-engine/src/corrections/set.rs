use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Correction, CorrectionError, RangeProblem, normalize_note};
use crate::text::{CharIndex, Span};

/// Non-overlapping corrections of one essay, sorted by start offset.
///
/// Serialized as a plain list. Deserializing runs every item through
/// [`insert`](CorrectionSet::insert), so a list with empty spans, overlaps or
/// repeated ids is rejected. Bounds are checked once the text is known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Correction>", try_from = "Vec<Correction>")]
pub struct CorrectionSet {
    items: Vec<Correction>,
}

impl CorrectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from stored corrections, validating each against `original`.
    ///
    /// Order of the input does not matter; overlaps and out-of-range spans
    /// are rejected exactly as [`insert`](Self::insert) would.
    pub fn from_corrections(
        original: &str,
        corrections: impl IntoIterator<Item = Correction>,
    ) -> Result<Self, CorrectionError> {
        let index = CharIndex::new(original);
        let mut set = Self::new();
        for correction in corrections {
            if index.slice(correction.span()) != Some(correction.original_text.as_str()) {
                log::warn!(
                    "correction {} no longer matches the essay text at {}",
                    correction.id,
                    correction.span()
                );
            }
            set.insert(correction, index.char_len())?;
        }
        Ok(set)
    }

    /// Create a correction over `span` of `original` and insert it.
    ///
    /// The replaced source text is captured from `original`.
    pub fn create(
        &mut self,
        original: &str,
        span: Span,
        corrected_text: impl Into<String>,
        teacher_note: Option<String>,
    ) -> Result<&Correction, CorrectionError> {
        let index = CharIndex::new(original);
        let captured = index.slice(span).unwrap_or_default();
        let correction = Correction::new(span, captured, corrected_text, teacher_note);
        self.insert(correction, index.char_len())
    }

    /// Insert a correction into an essay of `text_len` chars.
    ///
    /// Rejects empty spans, spans past the end, reused ids, and any span that
    /// intersects an existing correction. Touching spans are allowed.
    pub fn insert(
        &mut self,
        correction: Correction,
        text_len: usize,
    ) -> Result<&Correction, CorrectionError> {
        correction.check_bounds(text_len)?;
        if self.get(correction.id).is_some() {
            return Err(CorrectionError::DuplicateId(correction.id));
        }

        let span = correction.span();
        let at = self.items.partition_point(|c| c.start_index < span.start);
        let neighbours = at.checked_sub(1).into_iter().chain(std::iter::once(at));
        for i in neighbours {
            if let Some(existing) = self.items.get(i)
                && existing.span().intersects(span)
            {
                return Err(CorrectionError::InvalidRange {
                    span,
                    problem: RangeProblem::Overlaps { other: existing.id },
                });
            }
        }

        self.items.insert(at, correction);
        Ok(&self.items[at])
    }

    /// Change the replacement text and note of an existing correction.
    /// The anchored span never moves.
    pub fn edit(
        &mut self,
        id: Uuid,
        corrected_text: impl Into<String>,
        teacher_note: Option<String>,
    ) -> Result<&Correction, CorrectionError> {
        let correction = self
            .items
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(CorrectionError::NotFound(id))?;
        correction.corrected_text = corrected_text.into();
        correction.teacher_note = normalize_note(teacher_note);
        Ok(correction)
    }

    /// Delete a correction, returning it.
    pub fn remove(&mut self, id: Uuid) -> Result<Correction, CorrectionError> {
        let at = self
            .items
            .iter()
            .position(|c| c.id == id)
            .ok_or(CorrectionError::NotFound(id))?;
        Ok(self.items.remove(at))
    }

    pub fn get(&self, id: Uuid) -> Option<&Correction> {
        self.items.iter().find(|c| c.id == id)
    }

    /// The correction covering source offset `offset`, if any.
    pub fn find_at(&self, offset: usize) -> Option<&Correction> {
        let at = self.items.partition_point(|c| c.start_index <= offset);
        let candidate = self.items.get(at.checked_sub(1)?)?;
        candidate.span().contains(offset).then_some(candidate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Correction> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Correction] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl TryFrom<Vec<Correction>> for CorrectionSet {
    type Error = CorrectionError;

    fn try_from(items: Vec<Correction>) -> Result<Self, Self::Error> {
        let mut set = Self::new();
        for correction in items {
            set.insert(correction, usize::MAX)?;
        }
        Ok(set)
    }
}

impl From<CorrectionSet> for Vec<Correction> {
    fn from(set: CorrectionSet) -> Self {
        set.items
    }
}

impl<'a> IntoIterator for &'a CorrectionSet {
    type Item = &'a Correction;
    type IntoIter = std::slice::Iter<'a, Correction>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
