//! # Text Primitives
//!
//! Building blocks shared by the diff, overlay and selection modules.
//!
//! ## Offsets
//!
//! Every public offset in the engine is a zero-based index counted in `char`s
//! (Unicode scalar values) into the plain-text essay source. Rust strings are
//! indexed by byte, so all slicing goes through [`CharIndex`], which converts
//! char offsets to byte offsets once per text instead of rescanning.
//!
//! ## Modules
//!
//! - **`span`**: half-open `[start, end)` char ranges
//! - **`offsets`**: char ↔ byte conversion for a single text
//! - **`render_map`**: rendered text nodes and their source origins, the
//!   toolkit-independent replacement for DOM ranges

pub mod offsets;
pub mod render_map;
pub mod span;

pub use offsets::{CharIndex, char_len};
pub use render_map::{Edge, RenderMap, RenderNode, RenderedPosition, TextOrigin};
pub use span::Span;
