//! # Text Diff Engine
//!
//! Compares the student's original essay with the teacher-edited version and
//! produces labeled segments for rendering.
//!
//! ## Pipeline
//!
//! 1. **Tokenize** both texts (`tokenize`): runs of whitespace and runs of
//!    non-whitespace for word-level diffs, single chars for character-level.
//! 2. **Align** the token sequences with a Myers minimal diff (`similar`).
//! 3. **Normalize** the edit script (`chunks`): group edits between unchanged
//!    runs, slide pure insertions/deletions onto word starts, and fold
//!    whitespace-only gaps between two edits into the edit.
//! 4. **Coalesce** into [`DiffSegment`]s.
//!
//! ## Reconstruction Law
//!
//! Joining every segment's text except `Removed` yields `after`; joining every
//! segment's text except `Added` yields `before`.

mod chunks;
mod tokenize;

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag, capture_diff_slices};

use chunks::{Chunk, ChunkBuilder};
pub use tokenize::tokenize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DiffError {
    #[error("invalid argument: {side} text is not valid UTF-8: {source}")]
    InvalidArgument {
        side: &'static str,
        source: std::str::Utf8Error,
    },
}

/// Label of a diff segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Added,
    Removed,
    Unchanged,
}

/// A labeled chunk of text from comparing two versions of an essay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    pub text: String,
}

impl DiffSegment {
    pub fn new(kind: SegmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn added(text: impl Into<String>) -> Self {
        Self::new(SegmentKind::Added, text)
    }

    pub fn removed(text: impl Into<String>) -> Self {
        Self::new(SegmentKind::Removed, text)
    }

    pub fn unchanged(text: impl Into<String>) -> Self {
        Self::new(SegmentKind::Unchanged, text)
    }
}

/// Token size used when aligning texts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffGranularity {
    /// Whitespace-delimited words; avoids noisy micro-diffs in prose.
    #[default]
    Word,
    /// Individual chars.
    Character,
}

/// Word-level diff of `before` against `after`.
pub fn compute_diff(before: &str, after: &str) -> Vec<DiffSegment> {
    compute_diff_with(before, after, DiffGranularity::Word)
}

/// Diff at the given granularity. Total: every pair of strings has a result.
pub fn compute_diff_with(
    before: &str,
    after: &str,
    granularity: DiffGranularity,
) -> Vec<DiffSegment> {
    if before == after {
        return vec![DiffSegment::unchanged(before)];
    }
    if before.is_empty() {
        return vec![DiffSegment::added(after)];
    }
    if after.is_empty() {
        return vec![DiffSegment::removed(before)];
    }

    let old = tokenize(before, granularity);
    let new = tokenize(after, granularity);

    let mut builder = ChunkBuilder::default();
    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => builder.equal(&old[old_range]),
            DiffTag::Delete => builder.change(&old[old_range], &[]),
            DiffTag::Insert => builder.change(&[], &new[new_range]),
            DiffTag::Replace => builder.change(&old[old_range], &new[new_range]),
        }
    }

    let chunks = chunks::fold_whitespace_gaps(chunks::slide_pure_edits(builder.finish()));
    to_segments(chunks)
}

/// Diff raw bytes, rejecting input that is not UTF-8.
pub fn compute_diff_bytes(before: &[u8], after: &[u8]) -> Result<Vec<DiffSegment>, DiffError> {
    compute_diff_bytes_with(before, after, DiffGranularity::Word)
}

pub fn compute_diff_bytes_with(
    before: &[u8],
    after: &[u8],
    granularity: DiffGranularity,
) -> Result<Vec<DiffSegment>, DiffError> {
    let before = std::str::from_utf8(before).map_err(|source| DiffError::InvalidArgument {
        side: "before",
        source,
    })?;
    let after = std::str::from_utf8(after).map_err(|source| DiffError::InvalidArgument {
        side: "after",
        source,
    })?;
    Ok(compute_diff_with(before, after, granularity))
}

/// Rebuild the earlier text from a segment list.
pub fn reconstruct_before(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|s| s.kind != SegmentKind::Added)
        .map(|s| s.text.as_str())
        .collect()
}

/// Rebuild the later text from a segment list.
pub fn reconstruct_after(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|s| s.kind != SegmentKind::Removed)
        .map(|s| s.text.as_str())
        .collect()
}

fn to_segments(chunks: Vec<Chunk<'_>>) -> Vec<DiffSegment> {
    let mut segments: Vec<DiffSegment> = Vec::new();
    let mut push = |kind: SegmentKind, tokens: &[&str]| {
        if tokens.is_empty() {
            return;
        }
        let text: String = tokens.concat();
        match segments.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(&text),
            _ => segments.push(DiffSegment::new(kind, text)),
        }
    };

    for chunk in &chunks {
        match chunk {
            Chunk::Equal(tokens) => push(SegmentKind::Unchanged, tokens.as_slice()),
            Chunk::Change { removed, added } => {
                push(SegmentKind::Removed, removed.as_slice());
                push(SegmentKind::Added, added.as_slice());
            }
        }
    }
    segments
}

/// Word and segment counts over a diff, for review summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added_segments: usize,
    pub removed_segments: usize,
    pub added_words: usize,
    pub removed_words: usize,
}

impl DiffSummary {
    pub fn from_segments(segments: &[DiffSegment]) -> Self {
        segments
            .iter()
            .fold(Self::default(), |mut summary, segment| {
                let words = segment.text.split_whitespace().count();
                match segment.kind {
                    SegmentKind::Added => {
                        summary.added_segments += 1;
                        summary.added_words += words;
                    }
                    SegmentKind::Removed => {
                        summary.removed_segments += 1;
                        summary.removed_words += words;
                    }
                    SegmentKind::Unchanged => {}
                }
                summary
            })
    }

    pub fn is_unchanged(&self) -> bool {
        self.added_segments == 0 && self.removed_segments == 0
    }
}
