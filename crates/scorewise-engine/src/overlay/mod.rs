//! # Correction Overlay Renderer
//!
//! Turns an essay plus its corrections into HTML-safe markup, and records a
//! [`RenderMap`] of the produced text nodes so that later selections and
//! clicks in the rendered view can be mapped back to the source.
//!
//! The same highlighting convention is reused for the student-facing diff
//! view ([`render_diff`]).

use std::sync::OnceLock;

use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::corrections::{Correction, CorrectionSet, RangeProblem};
use crate::diff::{DiffSegment, SegmentKind};
use crate::text::{CharIndex, RenderMap, Span};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverlayError {
    #[error("invalid range {span} for correction {id}: {problem}")]
    InvalidCorrectionRange {
        id: Uuid,
        span: Span,
        problem: RangeProblem,
    },
    #[error("invalid overlay element name: {0:?}")]
    InvalidTag(String),
}

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("Invalid tag regex"))
}

/// Element and class names used in rendered markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayOptions {
    /// Element wrapping each correction.
    pub tag: String,
    pub correction_class: String,
    pub added_class: String,
    pub removed_class: String,
    /// Emit the teacher note as a `title` attribute.
    pub include_notes: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            tag: "mark".to_string(),
            correction_class: "correction".to_string(),
            added_class: "diff-added".to_string(),
            removed_class: "diff-removed".to_string(),
            include_notes: true,
        }
    }
}

impl OverlayOptions {
    /// The wrapping tag is written unescaped, so it must be a bare element
    /// name: a letter followed by letters, digits or `-`.
    pub fn validate(&self) -> Result<(), OverlayError> {
        if tag_regex().is_match(&self.tag) {
            Ok(())
        } else {
            Err(OverlayError::InvalidTag(self.tag.clone()))
        }
    }
}

/// Markup plus the text nodes it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOverlay {
    pub markup: String,
    pub map: RenderMap,
}

/// Render `original` with every correction of the set highlighted.
pub fn render_overlay(
    original: &str,
    corrections: &CorrectionSet,
    options: &OverlayOptions,
) -> Result<RenderedOverlay, OverlayError> {
    render_corrections(original, corrections.as_slice(), options)
}

/// Render `original` with an arbitrary list of corrections.
///
/// Corrections are applied left-to-right by start offset. Empty, reversed,
/// out-of-range and overlapping spans are reported instead of producing
/// corrupted markup, as is a tag that is not a plain element name.
pub fn render_corrections(
    original: &str,
    corrections: &[Correction],
    options: &OverlayOptions,
) -> Result<RenderedOverlay, OverlayError> {
    options.validate()?;
    let index = CharIndex::new(original);
    let mut ordered: Vec<&Correction> = corrections.iter().collect();
    ordered.sort_by_key(|c| (c.start_index, c.end_index));

    let mut markup = String::with_capacity(original.len() + corrections.len() * 48);
    let mut map = RenderMap::new();
    let mut cursor = 0;
    let mut previous: Option<Uuid> = None;

    for correction in ordered {
        let span = correction.span();
        let invalid = |problem| OverlayError::InvalidCorrectionRange {
            id: correction.id,
            span,
            problem,
        };

        if span.is_empty() {
            return Err(invalid(RangeProblem::Empty));
        }
        if span.start < cursor
            && let Some(other) = previous
        {
            return Err(invalid(RangeProblem::Overlaps { other }));
        }
        let (Some(plain), Some(_)) = (
            index.slice(Span::new(cursor, span.start)),
            index.byte_range(span),
        ) else {
            return Err(invalid(RangeProblem::OutOfBounds {
                len: index.char_len(),
            }));
        };

        markup.push_str(&encode_text(plain));
        map.push_source(plain, cursor);

        open_correction(&mut markup, correction, options);
        markup.push_str(&encode_text(&correction.corrected_text));
        markup.push_str(&format!("</{}>", options.tag));
        map.push_replacement(&correction.corrected_text, correction.id, span);

        cursor = span.end;
        previous = Some(correction.id);
    }

    let tail = index
        .slice(Span::new(cursor, index.char_len()))
        .unwrap_or_default();
    markup.push_str(&encode_text(tail));
    map.push_source(tail, cursor);

    Ok(RenderedOverlay { markup, map })
}

fn open_correction(markup: &mut String, correction: &Correction, options: &OverlayOptions) {
    markup.push_str(&format!(
        r#"<{} class="{}" data-id="{}""#,
        options.tag,
        encode_double_quoted_attribute(&options.correction_class),
        correction.id
    ));
    if options.include_notes
        && let Some(note) = &correction.teacher_note
    {
        markup.push_str(&format!(r#" title="{}""#, encode_double_quoted_attribute(note)));
    }
    markup.push('>');
}

/// Render a diff for the student view: additions in `<ins>`, removals in
/// `<del>`, everything escaped.
pub fn render_diff(segments: &[DiffSegment], options: &OverlayOptions) -> String {
    let mut markup = String::new();
    for segment in segments {
        let text = encode_text(&segment.text);
        match segment.kind {
            SegmentKind::Unchanged => markup.push_str(&text),
            SegmentKind::Added => {
                markup.push_str(&format!(
                    r#"<ins class="{}">{text}</ins>"#,
                    encode_double_quoted_attribute(&options.added_class)
                ));
            }
            SegmentKind::Removed => {
                markup.push_str(&format!(
                    r#"<del class="{}">{text}</del>"#,
                    encode_double_quoted_attribute(&options.removed_class)
                ));
            }
        }
    }
    markup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::compute_diff;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn no_corrections_returns_escaped_original() {
        let rendered =
            render_overlay("a < b && c > d", &CorrectionSet::new(), &OverlayOptions::default())
                .unwrap();
        assert_eq!(rendered.markup, "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(rendered.map, RenderMap::plain("a < b && c > d"));
    }

    #[test]
    fn no_corrections_on_plain_text_is_unchanged() {
        let original = "A plain essay without markup characters.";
        let rendered =
            render_overlay(original, &CorrectionSet::new(), &OverlayOptions::default()).unwrap();
        assert_eq!(rendered.markup, original);
    }

    #[test]
    fn one_correction_replaces_span_with_highlight() {
        let original = "I has a cat";
        let mut set = CorrectionSet::new();
        let id = set.create(original, Span::new(2, 5), "have", None).unwrap().id;

        let rendered = render_overlay(original, &set, &OverlayOptions::default()).unwrap();

        assert_eq!(
            rendered.markup,
            format!(r#"I <mark class="correction" data-id="{id}">have</mark> a cat"#)
        );
        assert!(!rendered.markup.contains("has"));
        assert_eq!(rendered.map.rendered_text(), "I have a cat");
        assert_eq!(rendered.map.correction_at(1), Some(id));
    }

    #[test]
    fn corrected_text_and_notes_are_escaped() {
        let original = "x";
        let mut set = CorrectionSet::new();
        let id = set
            .create(
                original,
                Span::new(0, 1),
                "<script>",
                Some(r#"use "quotes" & <tags>"#.into()),
            )
            .unwrap()
            .id;

        let rendered = render_overlay(original, &set, &OverlayOptions::default()).unwrap();
        assert!(
            rendered
                .markup
                .starts_with(&format!(r#"<mark class="correction" data-id="{id}" title=""#))
        );
        assert!(rendered.markup.contains("&quot;quotes&quot; &amp;"));
        assert!(rendered.markup.ends_with(">&lt;script&gt;</mark>"));
        assert!(!rendered.markup.contains("<script>"));
    }

    #[test]
    fn notes_can_be_left_out() {
        let original = "teh";
        let mut set = CorrectionSet::new();
        set.create(original, Span::new(0, 3), "the", Some("typo".into()))
            .unwrap();
        let options = OverlayOptions {
            include_notes: false,
            tag: "span".into(),
            ..OverlayOptions::default()
        };

        let rendered = render_overlay(original, &set, &options).unwrap();
        assert!(!rendered.markup.contains("title="));
        assert!(rendered.markup.starts_with("<span "));
        assert!(rendered.markup.ends_with("</span>"));
    }

    #[rstest]
    #[case::attribute(r#"mark onclick="alert(1)""#)]
    #[case::closing(r#"b><script>"#)]
    #[case::empty("")]
    #[case::leading_digit("1mark")]
    fn tags_that_are_not_element_names_are_rejected(#[case] tag: &str) {
        let original = "teh";
        let mut set = CorrectionSet::new();
        set.create(original, Span::new(0, 3), "the", None).unwrap();
        let options = OverlayOptions {
            tag: tag.into(),
            ..OverlayOptions::default()
        };

        assert_eq!(
            render_overlay(original, &set, &options).unwrap_err(),
            OverlayError::InvalidTag(tag.to_string())
        );
    }

    #[rstest]
    #[case("mark")]
    #[case("span")]
    #[case("essay-fix")]
    fn element_names_pass_validation(#[case] tag: &str) {
        let options = OverlayOptions {
            tag: tag.into(),
            ..OverlayOptions::default()
        };
        assert_eq!(options.validate(), Ok(()));
    }

    #[test]
    fn overlapping_corrections_are_reported() {
        let original = "one two three";
        let first = Correction::new(Span::new(0, 7), "one two", "1 2", None);
        let second = Correction::new(Span::new(4, 13), "two three", "2 3", None);

        let err = render_corrections(
            original,
            &[second.clone(), first.clone()],
            &OverlayOptions::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            OverlayError::InvalidCorrectionRange {
                id: second.id,
                span: Span::new(4, 13),
                problem: RangeProblem::Overlaps { other: first.id },
            }
        );
    }

    #[test]
    fn malformed_spans_are_reported() {
        let original = "short";
        let empty = Correction::new(Span::new(2, 2), "", "x", None);
        let past_end = Correction::new(Span::new(3, 9), "", "x", None);

        assert!(matches!(
            render_corrections(original, &[empty], &OverlayOptions::default()),
            Err(OverlayError::InvalidCorrectionRange {
                problem: RangeProblem::Empty,
                ..
            })
        ));
        assert!(matches!(
            render_corrections(original, &[past_end], &OverlayOptions::default()),
            Err(OverlayError::InvalidCorrectionRange {
                problem: RangeProblem::OutOfBounds { len: 5 },
                ..
            })
        ));
    }

    #[test]
    fn map_tracks_source_offsets_across_corrections() {
        let original = "Teh cat sat on teh mat";
        let mut set = CorrectionSet::new();
        set.create(original, Span::new(0, 3), "The", None).unwrap();
        set.create(original, Span::new(15, 18), "the", None).unwrap();

        let rendered = render_overlay(original, &set, &OverlayOptions::default()).unwrap();
        let origins: Vec<(&str, Option<usize>)> = rendered
            .map
            .nodes()
            .iter()
            .map(|node| match node.origin {
                crate::text::TextOrigin::Source { start } => (node.text.as_str(), Some(start)),
                crate::text::TextOrigin::Replacement { .. } => (node.text.as_str(), None),
            })
            .collect();

        assert_eq!(
            origins,
            vec![
                ("The", None),
                (" cat sat on ", Some(3)),
                ("the", None),
                (" mat", Some(18)),
            ]
        );
    }

    #[test]
    fn diff_markup_wraps_changes() {
        let segments = compute_diff("I has a cat", "I have a cat");
        insta::assert_snapshot!(
            render_diff(&segments, &OverlayOptions::default()),
            @r#"I <del class="diff-removed">has</del><ins class="diff-added">have</ins> a cat"#
        );
    }

    #[test]
    fn diff_markup_escapes_text() {
        let segments = compute_diff("a<b", "a<b & c");
        let markup = render_diff(&segments, &OverlayOptions::default());
        assert!(markup.contains("a&lt;b"));
        assert!(markup.contains("&amp; c"));
        assert!(!markup.contains("<b"));
    }
}
