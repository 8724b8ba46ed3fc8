//! Edit-script normalization over token chunks.

use std::collections::VecDeque;

/// A run of the edit script: tokens common to both texts, or one change
/// region between two common runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Chunk<'a> {
    Equal(Vec<&'a str>),
    Change {
        removed: Vec<&'a str>,
        added: Vec<&'a str>,
    },
}

impl Chunk<'_> {
    fn is_change(&self) -> bool {
        matches!(self, Chunk::Change { .. })
    }
}

/// Accumulates diff ops into alternating equal/change chunks.
#[derive(Debug, Default)]
pub(crate) struct ChunkBuilder<'a> {
    chunks: Vec<Chunk<'a>>,
}

impl<'a> ChunkBuilder<'a> {
    pub fn equal(&mut self, tokens: &[&'a str]) {
        push_chunk(&mut self.chunks, Chunk::Equal(tokens.to_vec()));
    }

    pub fn change(&mut self, removed: &[&'a str], added: &[&'a str]) {
        push_chunk(
            &mut self.chunks,
            Chunk::Change {
                removed: removed.to_vec(),
                added: added.to_vec(),
            },
        );
    }

    pub fn finish(self) -> Vec<Chunk<'a>> {
        self.chunks
    }
}

/// Append a chunk, merging it into the previous chunk of the same kind.
/// Empty chunks are dropped.
fn push_chunk<'a>(out: &mut Vec<Chunk<'a>>, chunk: Chunk<'a>) {
    match chunk {
        Chunk::Equal(tokens) => {
            if tokens.is_empty() {
                return;
            }
            if let Some(Chunk::Equal(last)) = out.last_mut() {
                last.extend(tokens);
            } else {
                out.push(Chunk::Equal(tokens));
            }
        }
        Chunk::Change { removed, added } => {
            if removed.is_empty() && added.is_empty() {
                return;
            }
            if let Some(Chunk::Change {
                removed: last_removed,
                added: last_added,
            }) = out.last_mut()
            {
                last_removed.extend(removed);
                last_added.extend(added);
            } else {
                out.push(Chunk::Change { removed, added });
            }
        }
    }
}

/// Slide pure insertions and deletions to the right while their first token
/// equals the token after them.
///
/// Myers may place an inserted `" big"` after `"The"` or an inserted
/// `"big "` after `"The "`; both are minimal. Sliding picks the second, so
/// edits start on a word rather than on the space before it.
pub(crate) fn slide_pure_edits(chunks: Vec<Chunk<'_>>) -> Vec<Chunk<'_>> {
    let mut out: Vec<Chunk<'_>> = Vec::with_capacity(chunks.len());
    let mut rest: VecDeque<Chunk<'_>> = chunks.into();

    while let Some(chunk) = rest.pop_front() {
        match chunk {
            Chunk::Change {
                mut removed,
                mut added,
            } if removed.is_empty() != added.is_empty()
                && !out.last().is_some_and(Chunk::is_change) =>
            {
                let pure = if removed.is_empty() {
                    &mut added
                } else {
                    &mut removed
                };

                while let Some(Chunk::Equal(next)) = rest.front_mut() {
                    if next.first() != pure.first() {
                        break;
                    }
                    let moved = pure.remove(0);
                    push_chunk(&mut out, Chunk::Equal(vec![moved]));
                    pure.push(next.remove(0));
                    if next.is_empty() {
                        rest.pop_front();
                    }
                }

                push_chunk(&mut out, Chunk::Change { removed, added });
            }
            other => push_chunk(&mut out, other),
        }
    }
    out
}

/// Fold whitespace-only equal runs that sit between two changes into the
/// change, so `"foo bar"` → `"baz qux"` reads as one replacement.
pub(crate) fn fold_whitespace_gaps(chunks: Vec<Chunk<'_>>) -> Vec<Chunk<'_>> {
    let mut out: Vec<Chunk<'_>> = Vec::with_capacity(chunks.len());
    let mut rest: VecDeque<Chunk<'_>> = chunks.into();

    while let Some(chunk) = rest.pop_front() {
        if let Chunk::Equal(tokens) = &chunk
            && tokens.iter().all(|t| t.trim().is_empty())
            && rest.front().is_some_and(Chunk::is_change)
            && let Some(Chunk::Change { removed, added }) = out.last_mut()
        {
            removed.extend(tokens.iter().copied());
            added.extend(tokens.iter().copied());
            continue;
        }
        push_chunk(&mut out, chunk);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change<'a>(removed: &[&'a str], added: &[&'a str]) -> Chunk<'a> {
        Chunk::Change {
            removed: removed.to_vec(),
            added: added.to_vec(),
        }
    }

    #[test]
    fn builder_merges_consecutive_changes() {
        let mut builder = ChunkBuilder::default();
        builder.equal(&["a"]);
        builder.change(&["b"], &[]);
        builder.change(&[], &["c"]);
        builder.equal(&[]);
        builder.equal(&["d"]);

        assert_eq!(
            builder.finish(),
            vec![
                Chunk::Equal(vec!["a"]),
                change(&["b"], &["c"]),
                Chunk::Equal(vec!["d"]),
            ]
        );
    }

    #[test]
    fn insertion_slides_past_leading_space() {
        let chunks = vec![
            Chunk::Equal(vec!["The"]),
            change(&[], &[" ", "big"]),
            Chunk::Equal(vec![" ", "cat"]),
        ];

        assert_eq!(
            slide_pure_edits(chunks),
            vec![
                Chunk::Equal(vec!["The", " "]),
                change(&[], &["big", " "]),
                Chunk::Equal(vec!["cat"]),
            ]
        );
    }

    #[test]
    fn slide_drops_exhausted_equal_run() {
        let chunks = vec![change(&[], &["a", " "]), Chunk::Equal(vec!["a"])];

        assert_eq!(
            slide_pure_edits(chunks),
            vec![Chunk::Equal(vec!["a"]), change(&[], &[" ", "a"])]
        );
    }

    #[test]
    fn mixed_changes_do_not_slide() {
        let chunks = vec![change(&["x"], &["y"]), Chunk::Equal(vec!["x"])];
        assert_eq!(slide_pure_edits(chunks.clone()), chunks);
    }

    #[test]
    fn whitespace_gap_between_changes_is_folded() {
        let chunks = vec![
            change(&["foo"], &["baz"]),
            Chunk::Equal(vec![" "]),
            change(&["bar"], &["qux"]),
        ];

        assert_eq!(
            fold_whitespace_gaps(chunks),
            vec![change(&["foo", " ", "bar"], &["baz", " ", "qux"])]
        );
    }

    #[test]
    fn word_gap_between_changes_is_kept() {
        let chunks = vec![
            change(&["foo"], &["baz"]),
            Chunk::Equal(vec![" ", "and", " "]),
            change(&["bar"], &["qux"]),
        ];
        assert_eq!(fold_whitespace_gaps(chunks.clone()), chunks);
    }
}
