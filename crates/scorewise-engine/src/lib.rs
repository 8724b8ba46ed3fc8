pub mod corrections;
pub mod diff;
pub mod io;
pub mod overlay;
pub mod review;
pub mod selection;
pub mod text;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use corrections::{Correction, CorrectionError, CorrectionSet, apply_corrections};
pub use diff::{
    DiffError, DiffGranularity, DiffSegment, DiffSummary, SegmentKind, compute_diff,
    compute_diff_bytes, compute_diff_bytes_with, compute_diff_with,
};
pub use io::*;
pub use overlay::{
    OverlayError, OverlayOptions, RenderedOverlay, render_corrections, render_diff, render_overlay,
};
pub use review::{EssayReview, ReviewCmd, ReviewError, ReviewPatch};
pub use selection::{
    RenderedPosition, RenderedSelection, ResolvedSelection, SelectionError, SelectionMapper,
};
pub use text::{RenderMap, RenderNode, Span, TextOrigin};
