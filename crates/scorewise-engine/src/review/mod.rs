//! # Essay Review
//!
//! The review state of one essay: the write-once original submission, the
//! teacher's corrections anchored to it, and the resulting final text.
//!
//! All mutations go through [`EssayReview::apply`] with a [`ReviewCmd`], in
//! the same command/patch shape used for text editing: a command either
//! succeeds completely and bumps the version, or fails and leaves the review
//! as it was.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::corrections::{Correction, CorrectionError, CorrectionSet, apply_corrections};
use crate::diff::{DiffGranularity, DiffSegment, DiffSummary, compute_diff_with};
use crate::overlay::{OverlayError, OverlayOptions, RenderedOverlay, render_overlay};
use crate::selection::{RenderedSelection, ResolvedSelection, SelectionError, SelectionMapper};
use crate::text::{RenderMap, Span};

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Correction(#[from] CorrectionError),
    #[error(transparent)]
    Overlay(#[from] OverlayError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("review JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("final text was edited by hand; reset it before changing corrections")]
    FinalTextEdited,
}

/// Edits a teacher can make to a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewCmd {
    AddCorrection {
        span: Span,
        corrected_text: String,
        note: Option<String>,
    },
    EditCorrection {
        id: Uuid,
        corrected_text: String,
        note: Option<String>,
    },
    DeleteCorrection {
        id: Uuid,
    },
    /// Free-form edit of the final text. Corrections keep rendering over the
    /// original. Correction commands fail with
    /// [`ReviewError::FinalTextEdited`] until [`ReviewCmd::ResetFinalText`].
    ReplaceFinalText {
        text: String,
    },
    /// Drop a free-form edit and recompute the final text from the corrections.
    ResetFinalText,
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPatch {
    pub version: u64,
    /// Correction created, edited or deleted by the command.
    pub correction_id: Option<Uuid>,
}

/// Stored form of a review, validated on the way in.
#[derive(Deserialize)]
struct StoredReview {
    essay_id: String,
    original_text: String,
    #[serde(default)]
    final_text: Option<String>,
    #[serde(default)]
    corrections: Vec<Correction>,
    #[serde(default)]
    version: u64,
    #[serde(default)]
    updated_at: Option<Timestamp>,
}

impl TryFrom<StoredReview> for EssayReview {
    type Error = CorrectionError;

    fn try_from(stored: StoredReview) -> Result<Self, Self::Error> {
        let corrections =
            CorrectionSet::from_corrections(&stored.original_text, stored.corrections)?;
        let final_text = match stored.final_text {
            Some(text) => text,
            None => apply_corrections(&stored.original_text, &corrections)?,
        };
        Ok(Self {
            essay_id: stored.essay_id,
            original_text: stored.original_text,
            final_text,
            corrections,
            version: stored.version,
            updated_at: stored.updated_at.unwrap_or_else(Timestamp::now),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredReview")]
pub struct EssayReview {
    essay_id: String,
    original_text: String,
    final_text: String,
    corrections: CorrectionSet,
    version: u64,
    updated_at: Timestamp,
}

impl EssayReview {
    /// Fresh review of a submission: no corrections, final text equals the
    /// original.
    pub fn new(essay_id: impl Into<String>, original_text: impl Into<String>) -> Self {
        let original_text = original_text.into();
        Self {
            essay_id: essay_id.into(),
            final_text: original_text.clone(),
            original_text,
            corrections: CorrectionSet::new(),
            version: 0,
            updated_at: Timestamp::now(),
        }
    }

    /// Rebuild a review from stored pieces, validating every correction
    /// against the original text.
    pub fn from_parts(
        essay_id: impl Into<String>,
        original_text: impl Into<String>,
        final_text: Option<String>,
        corrections: Vec<Correction>,
    ) -> Result<Self, ReviewError> {
        let review = Self::try_from(StoredReview {
            essay_id: essay_id.into(),
            original_text: original_text.into(),
            final_text,
            corrections,
            version: 0,
            updated_at: None,
        })?;
        Ok(review)
    }

    pub fn from_json(json: &str) -> Result<Self, ReviewError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ReviewError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn essay_id(&self) -> &str {
        &self.essay_id
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn final_text(&self) -> &str {
        &self.final_text
    }

    pub fn corrections(&self) -> &CorrectionSet {
        &self.corrections
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Whether the final text differs from the corrections applied to the
    /// original, i.e. it was replaced by hand.
    pub fn has_free_form_edit(&self) -> bool {
        !apply_corrections(&self.original_text, &self.corrections)
            .is_ok_and(|computed| computed == self.final_text)
    }

    pub fn apply(&mut self, cmd: ReviewCmd) -> Result<ReviewPatch, ReviewError> {
        let changes_corrections = matches!(
            cmd,
            ReviewCmd::AddCorrection { .. }
                | ReviewCmd::EditCorrection { .. }
                | ReviewCmd::DeleteCorrection { .. }
        );
        if changes_corrections && self.has_free_form_edit() {
            return Err(ReviewError::FinalTextEdited);
        }

        let correction_id = match cmd {
            ReviewCmd::AddCorrection {
                span,
                corrected_text,
                note,
            } => {
                let id = self
                    .corrections
                    .create(&self.original_text, span, corrected_text, note)?
                    .id;
                self.refresh_final_text()?;
                Some(id)
            }
            ReviewCmd::EditCorrection {
                id,
                corrected_text,
                note,
            } => {
                self.corrections.edit(id, corrected_text, note)?;
                self.refresh_final_text()?;
                Some(id)
            }
            ReviewCmd::DeleteCorrection { id } => {
                self.corrections.remove(id)?;
                self.refresh_final_text()?;
                Some(id)
            }
            ReviewCmd::ReplaceFinalText { text } => {
                self.final_text = text;
                None
            }
            ReviewCmd::ResetFinalText => {
                self.refresh_final_text()?;
                None
            }
        };

        self.version += 1;
        self.updated_at = Timestamp::now();
        log::debug!("review {} now at version {}", self.essay_id, self.version);

        Ok(ReviewPatch {
            version: self.version,
            correction_id,
        })
    }

    fn refresh_final_text(&mut self) -> Result<(), CorrectionError> {
        self.final_text = apply_corrections(&self.original_text, &self.corrections)?;
        Ok(())
    }

    /// Teacher view: the original text with corrections highlighted.
    pub fn overlay(&self, options: &OverlayOptions) -> Result<RenderedOverlay, ReviewError> {
        Ok(render_overlay(&self.original_text, &self.corrections, options)?)
    }

    /// Student view: word-level diff of original against final text.
    pub fn diff(&self) -> Vec<DiffSegment> {
        self.diff_with(DiffGranularity::Word)
    }

    pub fn diff_with(&self, granularity: DiffGranularity) -> Vec<DiffSegment> {
        compute_diff_with(&self.original_text, &self.final_text, granularity)
    }

    pub fn diff_summary(&self) -> DiffSummary {
        DiffSummary::from_segments(&self.diff())
    }

    /// Anchor a selection made in a rendering of this review.
    pub fn select(
        &self,
        map: &RenderMap,
        selection: &RenderedSelection,
        selected_text: &str,
    ) -> Result<ResolvedSelection, ReviewError> {
        Ok(SelectionMapper::new(&self.original_text, map).resolve(selection, selected_text)?)
    }

    /// Save a selection-based edit: anchor the selection, then add a
    /// correction over it.
    pub fn correct_selection(
        &mut self,
        map: &RenderMap,
        selection: &RenderedSelection,
        selected_text: &str,
        corrected_text: impl Into<String>,
        note: Option<String>,
    ) -> Result<ReviewPatch, ReviewError> {
        let resolved = self.select(map, selection, selected_text)?;
        self.apply(ReviewCmd::AddCorrection {
            span: resolved.span,
            corrected_text: corrected_text.into(),
            note,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::SegmentKind;
    use crate::text::Edge;
    use pretty_assertions::assert_eq;

    const ESSAY: &str = "Technology have change the way student learns.";

    fn add(review: &mut EssayReview, start: usize, end: usize, text: &str) -> Uuid {
        review
            .apply(ReviewCmd::AddCorrection {
                span: Span::new(start, end),
                corrected_text: text.to_string(),
                note: None,
            })
            .unwrap()
            .correction_id
            .unwrap()
    }

    #[test]
    fn new_review_has_final_text_equal_to_original() {
        let review = EssayReview::new("essay-1", ESSAY);
        assert_eq!(review.final_text(), ESSAY);
        assert_eq!(review.version(), 0);
        assert_eq!(review.diff(), vec![DiffSegment::unchanged(ESSAY)]);
        assert!(review.diff_summary().is_unchanged());
    }

    #[test]
    fn corrections_recompute_final_text_and_bump_version() {
        let mut review = EssayReview::new("essay-1", ESSAY);
        let id = add(&mut review, 11, 22, "has changed");
        add(&mut review, 31, 38, "students");

        assert_eq!(
            review.final_text(),
            "Technology has changed the way students learns."
        );
        assert_eq!(review.version(), 2);
        assert_eq!(review.original_text(), ESSAY);

        let patch = review
            .apply(ReviewCmd::EditCorrection {
                id,
                corrected_text: "has transformed".into(),
                note: Some("tense".into()),
            })
            .unwrap();
        assert_eq!(patch.version, 3);
        assert_eq!(patch.correction_id, Some(id));
        assert_eq!(
            review.final_text(),
            "Technology has transformed the way students learns."
        );

        review.apply(ReviewCmd::DeleteCorrection { id }).unwrap();
        assert_eq!(
            review.final_text(),
            "Technology have change the way students learns."
        );
    }

    #[test]
    fn failed_command_leaves_review_untouched() {
        let mut review = EssayReview::new("essay-1", ESSAY);
        add(&mut review, 11, 22, "has changed");
        let before = review.clone();

        let err = review
            .apply(ReviewCmd::AddCorrection {
                span: Span::new(15, 26),
                corrected_text: "x".into(),
                note: None,
            })
            .unwrap_err();
        assert!(matches!(err, ReviewError::Correction(_)));

        let missing = review.apply(ReviewCmd::DeleteCorrection { id: Uuid::new_v4() });
        assert!(missing.is_err());
        assert_eq!(review, before);
    }

    #[test]
    fn free_form_final_text_drives_the_diff() {
        let mut review = EssayReview::new("essay-1", "I has a cat");
        review
            .apply(ReviewCmd::ReplaceFinalText {
                text: "I have a cat".into(),
            })
            .unwrap();

        assert!(review.corrections().is_empty());
        assert_eq!(
            review.diff(),
            vec![
                DiffSegment::unchanged("I "),
                DiffSegment::removed("has"),
                DiffSegment::added("have"),
                DiffSegment::unchanged(" a cat"),
            ]
        );
        // The overlay still shows the untouched original
        let overlay = review.overlay(&OverlayOptions::default()).unwrap();
        assert_eq!(overlay.markup, "I has a cat");
    }

    #[test]
    fn correct_selection_anchors_through_the_overlay() {
        let mut review = EssayReview::new("essay-1", "I has a apple.");
        add(&mut review, 2, 5, "have");

        let overlay = review.overlay(&OverlayOptions::default()).unwrap();
        // Rendered "I have a apple.", select "a" at 7..8
        let selection = RenderedSelection::new(
            overlay.map.locate(7, Edge::Start).unwrap(),
            overlay.map.locate(8, Edge::End).unwrap(),
        );
        let patch = review
            .correct_selection(&overlay.map, &selection, "a", "an", None)
            .unwrap();

        let added = review.corrections().get(patch.correction_id.unwrap()).unwrap();
        assert_eq!(added.span(), Span::new(6, 7));
        assert_eq!(review.final_text(), "I have an apple.");

        let summary = review.diff_summary();
        assert_eq!(summary.added_words, 2);
        assert_eq!(summary.removed_words, 2);
    }

    #[test]
    fn unresolvable_selection_is_reported() {
        let mut review = EssayReview::new("essay-1", "Short essay.");
        let map = RenderMap::plain(review.original_text());
        let selection = RenderedSelection::new(
            map.locate(0, Edge::Start).unwrap(),
            map.locate(5, Edge::End).unwrap(),
        );

        let err = review
            .correct_selection(&map, &selection, "missing", "x", None)
            .unwrap_err();
        assert!(matches!(
            err,
            ReviewError::Selection(SelectionError::Unresolved)
        ));
        assert_eq!(review.version(), 0);
    }

    #[test]
    fn json_round_trip_keeps_state() {
        let mut review = EssayReview::new("essay-7", ESSAY);
        add(&mut review, 11, 22, "has changed");

        let json = review.to_json().unwrap();
        let back = EssayReview::from_json(&json).unwrap();
        assert_eq!(back, review);
    }

    #[test]
    fn stored_review_without_final_text_is_recomputed() {
        let json = r#"{
            "essay_id": "essay-2",
            "original_text": "I has a cat",
            "corrections": [{
                "id": "6f1c6c1e-9d1a-4d47-9d8e-0d1b7c4c2b11",
                "original_text": "has",
                "corrected_text": "have",
                "start_index": 2,
                "end_index": 5,
                "created_at": "2026-03-01T09:30:00Z"
            }]
        }"#;

        let review = EssayReview::from_json(json).unwrap();
        assert_eq!(review.final_text(), "I have a cat");
        assert_eq!(review.version(), 0);
        assert_eq!(review.corrections().len(), 1);
    }

    #[test]
    fn stored_review_with_overlapping_corrections_is_rejected() {
        let first = Correction::new(Span::new(0, 5), "I has", "I have", None);
        let second = Correction::new(Span::new(2, 7), "has a", "have a", None);

        let err = EssayReview::from_parts("essay-3", "I has a cat", None, vec![first, second])
            .unwrap_err();
        assert!(matches!(err, ReviewError::Correction(_)));

        let json = r#"{"essay_id": "x", "original_text": "abc", "corrections": [
            {"id": "6f1c6c1e-9d1a-4d47-9d8e-0d1b7c4c2b11", "original_text": "",
             "corrected_text": "z", "start_index": 2, "end_index": 9,
             "created_at": "2026-03-01T09:30:00Z"}
        ]}"#;
        assert!(matches!(
            EssayReview::from_json(json),
            Err(ReviewError::Json(_))
        ));
    }

    #[test]
    fn cmd_serializes_with_type_tag() {
        let cmd = ReviewCmd::DeleteCorrection { id: Uuid::nil() };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "delete_correction");
        assert_eq!(serde_json::from_value::<ReviewCmd>(json).unwrap(), cmd);
    }

    #[test]
    fn correction_commands_keep_a_free_form_edit() {
        let mut review = EssayReview::new("essay-1", "I has a cat and a dog.");
        let edited = "I have a cat and a dog. Great essay overall.";
        review
            .apply(ReviewCmd::ReplaceFinalText {
                text: edited.into(),
            })
            .unwrap();
        assert!(review.has_free_form_edit());
        let before = review.clone();

        let result = review.apply(ReviewCmd::AddCorrection {
            span: Span::new(18, 21),
            corrected_text: "puppy".into(),
            note: None,
        });

        assert!(matches!(result, Err(ReviewError::FinalTextEdited)));
        assert_eq!(review, before);
        assert_eq!(review.final_text(), edited);
    }

    #[test]
    fn reset_final_text_allows_corrections_again() {
        let mut review = EssayReview::new("essay-1", "I has a cat and a dog.");
        review
            .apply(ReviewCmd::ReplaceFinalText {
                text: "Something else entirely.".into(),
            })
            .unwrap();

        let patch = review.apply(ReviewCmd::ResetFinalText).unwrap();
        assert_eq!(patch.version, 2);
        assert!(!review.has_free_form_edit());
        assert_eq!(review.final_text(), "I has a cat and a dog.");

        add(&mut review, 18, 21, "puppy");
        assert_eq!(review.final_text(), "I has a cat and a puppy.");
    }

    #[test]
    fn diff_granularity_is_selectable() {
        let mut review = EssayReview::new("essay-1", "colour");
        review
            .apply(ReviewCmd::ReplaceFinalText {
                text: "color".into(),
            })
            .unwrap();
        let kinds: Vec<SegmentKind> = review
            .diff_with(DiffGranularity::Character)
            .iter()
            .map(|s| s.kind)
            .collect();
        assert!(kinds.contains(&SegmentKind::Unchanged));
        assert_eq!(review.diff().len(), 2);
    }
}
