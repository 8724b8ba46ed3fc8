use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text::{Span, char_len};

/// Where a rendered text node's content came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextOrigin {
    /// Verbatim run of the source text beginning at char offset `start`.
    Source { start: usize },
    /// Replacement text of a correction covering `span` of the source.
    Replacement { correction_id: Uuid, span: Span },
}

/// One rendered text node: what the reader sees, plus its source origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderNode {
    pub text: String,
    pub origin: TextOrigin,
}

impl RenderNode {
    /// Rendered length in chars.
    pub fn char_len(&self) -> usize {
        char_len(&self.text)
    }
}

/// A caret position inside a rendered view: node index plus char offset
/// within that node's rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RenderedPosition {
    pub node: usize,
    pub offset: usize,
}

impl RenderedPosition {
    pub fn new(node: usize, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Which end of a selection a position represents.
///
/// Positions on a node boundary, or inside replacement text, resolve
/// differently depending on whether they open or close the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// Ordered rendered text nodes of one essay view.
///
/// The render map is the abstract "rendered position → source offset"
/// interface: any UI that can report which node and which char within it a
/// caret sits in can be mapped back to the plain-text source, with no
/// dependency on a particular toolkit's selection API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderMap {
    nodes: Vec<RenderNode>,
}

impl RenderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map for a markup-free rendering of `source`: one verbatim node.
    pub fn plain(source: &str) -> Self {
        let mut map = Self::new();
        map.push_source(source, 0);
        map
    }

    /// Append a verbatim source run. Empty runs are skipped.
    pub fn push_source(&mut self, text: &str, start: usize) {
        if text.is_empty() {
            return;
        }
        self.nodes.push(RenderNode {
            text: text.to_string(),
            origin: TextOrigin::Source { start },
        });
    }

    /// Append a correction's replacement text. Kept even when empty so the
    /// correction stays addressable.
    pub fn push_replacement(&mut self, text: &str, correction_id: Uuid, span: Span) {
        self.nodes.push(RenderNode {
            text: text.to_string(),
            origin: TextOrigin::Replacement {
                correction_id,
                span,
            },
        });
    }

    pub fn nodes(&self) -> &[RenderNode] {
        &self.nodes
    }

    pub fn get(&self, node: usize) -> Option<&RenderNode> {
        self.nodes.get(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Concatenated rendered text, as the reader sees it.
    pub fn rendered_text(&self) -> String {
        self.nodes.iter().map(|n| n.text.as_str()).collect()
    }

    /// Total rendered length in chars.
    pub fn rendered_len(&self) -> usize {
        self.nodes.iter().map(RenderNode::char_len).sum()
    }

    /// Translate a rendered position into a source char offset.
    ///
    /// Inside a verbatim node this is `node.start + offset`. Inside replacement
    /// text there is no 1:1 mapping, so the position snaps to the replaced
    /// span: an opening edge snaps to its start (unless it sits at the very
    /// end of the replacement), a closing edge to its end (unless it sits at
    /// the very beginning).
    pub fn source_offset(&self, position: RenderedPosition, edge: Edge) -> Option<usize> {
        let node = self.nodes.get(position.node)?;
        let len = node.char_len();
        if position.offset > len {
            return None;
        }

        let offset = match (&node.origin, edge) {
            (TextOrigin::Source { start }, _) => start + position.offset,
            (TextOrigin::Replacement { span, .. }, Edge::Start) => {
                if len > 0 && position.offset == len {
                    span.end
                } else {
                    span.start
                }
            }
            (TextOrigin::Replacement { span, .. }, Edge::End) => {
                if position.offset == 0 {
                    span.start
                } else {
                    span.end
                }
            }
        };
        Some(offset)
    }

    /// Find the node position of a flat rendered char offset.
    ///
    /// On a boundary between two nodes an opening edge lands at the start of
    /// the following node and a closing edge at the end of the preceding one.
    pub fn locate(&self, rendered_offset: usize, edge: Edge) -> Option<RenderedPosition> {
        let mut consumed = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            let len = node.char_len();
            let inside = match edge {
                Edge::Start => rendered_offset < consumed + len,
                Edge::End => rendered_offset <= consumed + len,
            };
            if inside && rendered_offset >= consumed {
                return Some(RenderedPosition::new(index, rendered_offset - consumed));
            }
            consumed += len;
        }

        // An opening edge at the very end belongs to the last node.
        if rendered_offset == consumed {
            let last = self.nodes.len().checked_sub(1)?;
            return Some(RenderedPosition::new(last, self.nodes[last].char_len()));
        }
        None
    }

    /// Rendered text between two positions, as the reader saw it selected.
    pub fn rendered_between(&self, from: RenderedPosition, to: RenderedPosition) -> Option<String> {
        if to < from {
            return None;
        }
        let mut text = String::new();
        for index in from.node..=to.node {
            let node = self.nodes.get(index)?;
            let len = node.char_len();
            let start = if index == from.node { from.offset } else { 0 };
            let end = if index == to.node { to.offset } else { len };
            if start > len || end > len {
                return None;
            }
            text.extend(node.text.chars().skip(start).take(end.saturating_sub(start)));
        }
        Some(text)
    }

    /// Correction id rendered at a node, for resolving clicks.
    pub fn correction_at(&self, node: usize) -> Option<Uuid> {
        match self.nodes.get(node)?.origin {
            TextOrigin::Replacement { correction_id, .. } => Some(correction_id),
            TextOrigin::Source { .. } => None,
        }
    }
}
