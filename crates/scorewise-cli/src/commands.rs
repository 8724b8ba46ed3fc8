//! One-shot subcommands: `diff` and `render`.

use anyhow::{Context, Result};
use relative_path::RelativePath;
use scorewise_engine::{
    DiffGranularity, DiffSegment, DiffSummary, OverlayOptions, SegmentKind,
    compute_diff_bytes_with, io,
};
use std::fs;
use std::path::Path;

/// Diff two text files and format the result for a terminal.
pub fn diff_files(before: &Path, after: &Path, granularity: DiffGranularity) -> Result<String> {
    let before_bytes =
        fs::read(before).with_context(|| format!("Failed to read {}", before.display()))?;
    let after_bytes =
        fs::read(after).with_context(|| format!("Failed to read {}", after.display()))?;

    let segments = compute_diff_bytes_with(&before_bytes, &after_bytes, granularity)?;
    let mut out = format_segments(&segments);
    out.push('\n');
    out.push_str(&format_summary(&DiffSummary::from_segments(&segments)));
    Ok(out)
}

/// Load a review file and render its correction overlay markup.
pub fn render_review_file(path: &Path, options: &OverlayOptions) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Not a review file: {}", path.display()))?;
    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let review = io::read_review(RelativePath::new(file_name), root)?;
    log::info!(
        "rendering review {} with {} corrections",
        review.essay_id(),
        review.corrections().len()
    );
    Ok(review.overlay(options)?.markup)
}

/// Inline markers: `[+added+]`, `[-removed-]`.
pub fn format_segments(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .map(|segment| match segment.kind {
            SegmentKind::Unchanged => segment.text.clone(),
            SegmentKind::Added => format!("[+{}+]", segment.text),
            SegmentKind::Removed => format!("[-{}-]", segment.text),
        })
        .collect()
}

pub fn format_summary(summary: &DiffSummary) -> String {
    if summary.is_unchanged() {
        return "No changes".to_string();
    }
    format!(
        "{} words added in {} places, {} words removed in {} places",
        summary.added_words,
        summary.added_segments,
        summary.removed_words,
        summary.removed_segments
    )
}
