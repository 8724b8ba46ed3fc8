//! # Corrections
//!
//! Teacher-authored replacements of char spans in a student's essay.
//!
//! Corrections for one essay form an interval set: [`CorrectionSet`] keeps
//! them sorted by start offset and rejects any insert that would overlap an
//! existing span, so rendering never has to guess how overlapping edits
//! combine.

mod set;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xi_rope::{Rope, delta::Builder};

use crate::text::{CharIndex, Span};

pub use set::CorrectionSet;

/// Why a correction span cannot be placed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeProblem {
    #[error("span is empty or reversed")]
    Empty,
    #[error("span ends past the end of the text ({len} chars)")]
    OutOfBounds { len: usize },
    #[error("span overlaps correction {other}")]
    Overlaps { other: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrectionError {
    #[error("invalid correction range {span}: {problem}")]
    InvalidRange { span: Span, problem: RangeProblem },
    #[error("correction not found: {0}")]
    NotFound(Uuid),
    #[error("duplicate correction id: {0}")]
    DuplicateId(Uuid),
}

/// A teacher-authored replacement of `[start_index, end_index)` of the essay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub id: Uuid,
    /// Source text of the span, captured when the correction was made.
    pub original_text: String,
    pub corrected_text: String,
    pub start_index: usize,
    pub end_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_note: Option<String>,
    pub created_at: Timestamp,
}

impl Correction {
    /// New correction with a fresh id, stamped now. Does not validate the span.
    pub fn new(
        span: Span,
        original_text: impl Into<String>,
        corrected_text: impl Into<String>,
        teacher_note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_text: original_text.into(),
            corrected_text: corrected_text.into(),
            start_index: span.start,
            end_index: span.end,
            teacher_note: normalize_note(teacher_note),
            created_at: Timestamp::now(),
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start_index, self.end_index)
    }

    /// Check the span is non-empty and inside a text of `text_len` chars.
    pub fn check_bounds(&self, text_len: usize) -> Result<(), CorrectionError> {
        let span = self.span();
        if span.is_empty() {
            return Err(CorrectionError::InvalidRange {
                span,
                problem: RangeProblem::Empty,
            });
        }
        if span.end > text_len {
            return Err(CorrectionError::InvalidRange {
                span,
                problem: RangeProblem::OutOfBounds { len: text_len },
            });
        }
        Ok(())
    }
}

/// Blank notes are stored as no note.
pub(crate) fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Splice every correction's replacement text into `original`.
///
/// The corrections compile to one rope delta, applied in a single pass.
/// Spans must be sorted and disjoint; anything else is reported as an
/// overlap with the preceding correction.
pub fn apply_corrections(original: &str, corrections: &CorrectionSet) -> Result<String, CorrectionError> {
    let index = CharIndex::new(original);
    let rope = Rope::from(original);
    let mut builder = Builder::new(rope.len());
    let mut previous: Option<&Correction> = None;

    for correction in corrections.iter() {
        correction.check_bounds(index.char_len())?;
        if let Some(before) = previous
            && correction.start_index < before.end_index
        {
            return Err(CorrectionError::InvalidRange {
                span: correction.span(),
                problem: RangeProblem::Overlaps { other: before.id },
            });
        }
        previous = Some(correction);
        let range = index
            .byte_range(correction.span())
            .ok_or(CorrectionError::InvalidRange {
                span: correction.span(),
                problem: RangeProblem::OutOfBounds {
                    len: index.char_len(),
                },
            })?;
        builder.replace(range, Rope::from(correction.corrected_text.as_str()));
    }

    let delta = builder.build();
    Ok(delta.apply(&rope).to_string())
}
