//! Merging both sides' blocks into one ordered hunk sequence.
//!
//! Each side keeps a running offset: the number of bytes that the other
//! side's already-emitted content has pushed it forward in virtual space. A
//! block's virtual start is its source start plus its side's offset. The
//! merger walks both block lists at once, pairing blocks that share an anchor
//! into change hunks and emitting the rest, earliest first, as one-sided
//! insertions.

use std::fmt;
use std::ops::Range;

use serde::Serialize;
use tracing::trace;

use crate::block::{AnchoredBlock, Block};
use crate::hunk::Hunk;

/// What a [`DiffHunk`] does to the other side.
///
/// Serialises as its display name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum HunkKind {
    /// Both sides hold different content here.
    #[serde(rename = "change")]
    Change,
    /// Content present only in A.
    #[serde(rename = "only-a")]
    OnlyInA,
    /// Content present only in B.
    #[serde(rename = "only-b")]
    OnlyInB,
}

impl fmt::Display for HunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HunkKind::Change => write!(f, "change"),
            HunkKind::OnlyInA => write!(f, "only-a"),
            HunkKind::OnlyInB => write!(f, "only-b"),
        }
    }
}

/// One aligned unit of difference in virtual space.
///
/// At least one of the two blocks is present. An absent side contributes
/// length 0, so the hunk is as long as its longer block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiffHunk<'a> {
    start: usize,
    a: Option<Block<'a>>,
    b: Option<Block<'a>>,
    /// Source offsets at which this hunk sits in A and B. For a missing
    /// side this is the insertion point, always within that source.
    a_at: usize,
    b_at: usize,
}

impl<'a> DiffHunk<'a> {
    /// Virtual start.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Virtual end, `start + len`.
    pub fn end(&self) -> usize {
        self.start + self.len()
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Length in virtual space.
    pub fn len(&self) -> usize {
        let a = self.a.map_or(0, |block| block.len());
        let b = self.b.map_or(0, |block| block.len());
        a.max(b)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn a(&self) -> Option<&Block<'a>> {
        self.a.as_ref()
    }

    pub fn b(&self) -> Option<&Block<'a>> {
        self.b.as_ref()
    }

    /// A's bytes in this hunk, if A takes part.
    pub fn a_data(&self) -> Option<&'a [u8]> {
        self.a.map(|block| block.data())
    }

    /// B's bytes in this hunk, if B takes part.
    pub fn b_data(&self) -> Option<&'a [u8]> {
        self.b.map(|block| block.data())
    }

    pub fn kind(&self) -> HunkKind {
        match (self.a, self.b) {
            (Some(_), Some(_)) => HunkKind::Change,
            (Some(_), None) => HunkKind::OnlyInA,
            _ => HunkKind::OnlyInB,
        }
    }

    pub fn is_change(&self) -> bool {
        self.kind() == HunkKind::Change
    }

    /// The hunk in source coordinates. A missing side becomes an empty range
    /// at its insertion point.
    pub fn to_hunk(&self) -> Hunk {
        let a = self.a.map_or(self.a_at..self.a_at, |block| block.range());
        let b = self.b.map_or(self.b_at..self.b_at, |block| block.range());
        Hunk { a, b }
    }
}

impl fmt::Display for DiffHunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hunk = self.to_hunk();
        write!(
            f,
            "{} @{}..{} a[{}..{}] b[{}..{}]",
            self.kind(),
            self.start,
            self.end(),
            hunk.a.start,
            hunk.a.end,
            hunk.b.start,
            hunk.b.end,
        )
    }
}

/// Merge the anchored blocks of A and B into an ordered hunk sequence.
///
/// Blocks that share an anchor are paired into a change hunk placed at the
/// later of their two virtual starts; afterwards both offsets are reset so
/// that each side resumes at the hunk's virtual end. Otherwise the block with
/// the smaller virtual start is emitted alone and the other side's offset
/// grows by its length. On a tie between different anchors A goes first.
///
/// `a_len` and `b_len` are the source lengths, bounding the insertion points
/// of one-sided hunks.
///
/// Output is non-decreasing in virtual start, and on each side the hunks'
/// source ranges are in order and never overlap.
pub fn merge_blocks<'a>(
    a: &[AnchoredBlock<'a>],
    b: &[AnchoredBlock<'a>],
    a_len: usize,
    b_len: usize,
) -> Vec<DiffHunk<'a>> {
    let mut hunks = Vec::with_capacity(a.len().max(b.len()));
    let (mut next_a, mut next_b) = (0, 0);
    let (mut offset_a, mut offset_b) = (0usize, 0usize);
    // Source position each side has been emitted up to.
    let (mut cursor_a, mut cursor_b) = (0usize, 0usize);

    loop {
        let pending_a = a.get(next_a);
        let pending_b = b.get(next_b);
        let start_a = pending_a.map(|p| p.block.start() + offset_a);
        let start_b = pending_b.map(|p| p.block.start() + offset_b);
        let a_first = match (start_a, start_b) {
            (Some(sa), Some(sb)) => sa <= sb,
            (sa, _) => sa.is_some(),
        };

        match (pending_a, pending_b) {
            (Some(pa), Some(pb)) if pa.anchor == pb.anchor => {
                let start = (pa.block.start() + offset_a).max(pb.block.start() + offset_b);
                let hunk = DiffHunk {
                    start,
                    a: Some(pa.block),
                    b: Some(pb.block),
                    a_at: pa.block.start(),
                    b_at: pb.block.start(),
                };
                offset_a = hunk.end() - pa.block.end();
                offset_b = hunk.end() - pb.block.end();
                cursor_a = pa.block.end();
                cursor_b = pb.block.end();
                trace!(%hunk, offset_a, offset_b, "paired blocks");
                hunks.push(hunk);
                next_a += 1;
                next_b += 1;
            }
            (Some(pa), _) if a_first => {
                let start = pa.block.start() + offset_a;
                let limit = pending_b.map_or(b_len, |p| p.block.start());
                let hunk = DiffHunk {
                    start,
                    a: Some(pa.block),
                    b: None,
                    a_at: pa.block.start(),
                    b_at: insertion_point(start, offset_b, cursor_b, limit),
                };
                offset_b += pa.block.len();
                cursor_a = pa.block.end();
                cursor_b = hunk.b_at;
                trace!(%hunk, offset_b, "block only in a");
                hunks.push(hunk);
                next_a += 1;
            }
            (_, Some(pb)) => {
                let start = pb.block.start() + offset_b;
                let limit = pending_a.map_or(a_len, |p| p.block.start());
                let hunk = DiffHunk {
                    start,
                    a: None,
                    b: Some(pb.block),
                    a_at: insertion_point(start, offset_a, cursor_a, limit),
                    b_at: pb.block.start(),
                };
                offset_a += pb.block.len();
                cursor_a = hunk.a_at;
                cursor_b = pb.block.end();
                trace!(%hunk, offset_a, "block only in b");
                hunks.push(hunk);
                next_b += 1;
            }
            _ => break,
        }
    }
    hunks
}

/// Source position on the side missing from a hunk.
///
/// Virtual space maps `virtual_start` back to `virtual_start - offset`. After
/// a change of unequal lengths or around repeated content that mapping can
/// land behind what the side has already emitted or past its next block, so
/// it is held between `cursor` and `limit`.
fn insertion_point(virtual_start: usize, offset: usize, cursor: usize, limit: usize) -> usize {
    virtual_start.saturating_sub(offset).max(cursor).min(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::anchored_blocks;
    use crate::chunk::{ChunkChain, Chunker};
    use crate::config::ChunkerConfig;
    use crate::index::ChunkIndex;
    use proptest::prelude::*;

    fn merge<'a>(chain_a: &ChunkChain<'a>, chain_b: &ChunkChain<'a>) -> Vec<DiffHunk<'a>> {
        let index_a = ChunkIndex::build(chain_a);
        let index_b = ChunkIndex::build(chain_b);
        merge_blocks(
            &anchored_blocks(chain_a, &index_b),
            &anchored_blocks(chain_b, &index_a),
            chain_a.source().len(),
            chain_b.source().len(),
        )
    }

    fn summary(hunks: &[DiffHunk<'_>]) -> Vec<(HunkKind, usize, usize)> {
        hunks.iter().map(|h| (h.kind(), h.start(), h.len())).collect()
    }

    #[test]
    fn no_blocks_no_hunks() {
        assert!(merge_blocks(&[], &[], 0, 0).is_empty());
    }

    #[test]
    fn same_anchor_pairs_into_change() {
        let a = ChunkChain::bytewise(b"abXcd");
        let b = ChunkChain::bytewise(b"abYYcd");
        let hunks = merge(&a, &b);
        assert_eq!(summary(&hunks), vec![(HunkKind::Change, 2, 2)]);
        assert_eq!(hunks[0].a_data(), Some(&b"X"[..]));
        assert_eq!(hunks[0].b_data(), Some(&b"YY"[..]));
        assert_eq!(hunks[0].to_hunk(), Hunk::new(2, 3, 2, 4));
    }

    #[test]
    fn insertion_in_a_only() {
        let a = ChunkChain::bytewise(b"abXYcd");
        let b = ChunkChain::bytewise(b"abcd");
        let hunks = merge(&a, &b);
        assert_eq!(summary(&hunks), vec![(HunkKind::OnlyInA, 2, 2)]);
        assert_eq!(hunks[0].b(), None);
        assert_eq!(hunks[0].to_hunk(), Hunk::new(2, 4, 2, 2));
    }

    #[test]
    fn insertion_in_b_only() {
        let a = ChunkChain::bytewise(b"abcd");
        let b = ChunkChain::bytewise(b"abcZd");
        let hunks = merge(&a, &b);
        assert_eq!(summary(&hunks), vec![(HunkKind::OnlyInB, 3, 1)]);
        assert_eq!(hunks[0].to_hunk(), Hunk::new(3, 3, 3, 4));
    }

    #[test]
    fn insertions_shift_later_blocks() {
        // A gains "XY" after 'a'; B gains "Z" after 'c'.
        let a = ChunkChain::bytewise(b"aXYbcd");
        let b = ChunkChain::bytewise(b"abcZd");
        let hunks = merge(&a, &b);
        assert_eq!(
            summary(&hunks),
            vec![(HunkKind::OnlyInA, 1, 2), (HunkKind::OnlyInB, 5, 1)]
        );
        // B's insertion sits after A's "XY" in virtual space, and at 'd' in A.
        assert_eq!(hunks[1].to_hunk(), Hunk::new(5, 5, 3, 4));
    }

    #[test]
    fn insertion_point_stays_inside_the_other_source() {
        // Virtual position 2 maps past the end of the one-byte B.
        let a = ChunkChain::bytewise(b"aab");
        let b = ChunkChain::bytewise(b"a");
        let hunks = merge(&a, &b);
        assert_eq!(summary(&hunks), vec![(HunkKind::OnlyInA, 2, 1)]);
        assert_eq!(hunks[0].to_hunk(), Hunk::new(2, 3, 1, 1));
    }

    #[test]
    fn tie_between_different_anchors_puts_a_first() {
        // X follows 'a' in A, Y follows 'b' in B: same position, different
        // anchors.
        let a = ChunkChain::bytewise(b"aXbc");
        let b = ChunkChain::bytewise(b"bYac");
        let hunks = merge(&a, &b);
        assert_eq!(
            summary(&hunks),
            vec![(HunkKind::OnlyInA, 1, 1), (HunkKind::OnlyInB, 2, 1)]
        );
    }

    #[test]
    fn length_is_longer_side() {
        let a = ChunkChain::bytewise(b"aXXXb");
        let b = ChunkChain::bytewise(b"aYb");
        let hunks = merge(&a, &b);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].len(), 3);
        assert_eq!(hunks[0].end(), 4);
        assert!(hunks[0].is_change());
    }

    #[test]
    fn kind_serialises_as_its_name() {
        for kind in [HunkKind::Change, HunkKind::OnlyInA, HunkKind::OnlyInB] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn display_shows_kind_and_ranges() {
        let a = ChunkChain::bytewise(b"abXcd");
        let b = ChunkChain::bytewise(b"abYYcd");
        let hunks = merge(&a, &b);
        assert_eq!(hunks[0].to_string(), "change @2..4 a[2..3] b[2..4]");
    }

    proptest! {
        #[test]
        fn virtual_starts_never_decrease(
            a in proptest::collection::vec(0u8..6, 0..96),
            b in proptest::collection::vec(0u8..6, 0..96),
        ) {
            let chunker = Chunker::new(ChunkerConfig::new(2, 2).unwrap()).unwrap();
            let chain_a = chunker.split(&a);
            let chain_b = chunker.split(&b);
            let hunks = merge(&chain_a, &chain_b);
            for pair in hunks.windows(2) {
                prop_assert!(pair[0].start() <= pair[1].start());
            }
            for hunk in &hunks {
                prop_assert!(hunk.a().is_some() || hunk.b().is_some());
            }
        }

        #[test]
        fn source_ranges_are_in_bounds_and_ordered(
            a in proptest::collection::vec(0u8..4, 0..40),
            b in proptest::collection::vec(0u8..4, 0..40),
        ) {
            let chunker = Chunker::new(ChunkerConfig::new(2, 2).unwrap()).unwrap();
            let chain_a = chunker.split(&a);
            let chain_b = chunker.split(&b);
            let (mut end_a, mut end_b) = (0, 0);
            for hunk in merge(&chain_a, &chain_b).iter().map(DiffHunk::to_hunk) {
                prop_assert!(end_a <= hunk.a.start && hunk.a.end <= a.len(), "{} after a[..{}]", hunk, end_a);
                prop_assert!(end_b <= hunk.b.start && hunk.b.end <= b.len(), "{} after b[..{}]", hunk, end_b);
                end_a = hunk.a.end;
                end_b = hunk.b.end;
            }
        }
    }
}
