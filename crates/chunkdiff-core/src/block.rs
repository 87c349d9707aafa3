//! Unique blocks and their anchors.
//!
//! A [`Block`] is a maximal run of chain-adjacent chunks whose content never
//! occurs on the other side: a span of pure difference. Its [`Anchor`] is the
//! nearest preceding chunk that *does* occur on the other side, the last
//! point at which the two inputs agree. Blocks from opposite sides that share
//! an anchor diverge from the same place and pair up as one change.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::chunk::{Chunk, ChunkChain};
use crate::index::ChunkIndex;

/// A maximal run of chunks unique to one side.
#[derive(Clone, Copy)]
pub struct Block<'a> {
    first: Chunk<'a>,
    last: Chunk<'a>,
}

impl<'a> Block<'a> {
    fn new(first: Chunk<'a>, last: Chunk<'a>) -> Self {
        debug_assert!(first.id() <= last.id());
        debug_assert!(std::ptr::eq(first.source(), last.source()));
        Self { first, last }
    }

    pub fn first(&self) -> &Chunk<'a> {
        &self.first
    }

    pub fn last(&self) -> &Chunk<'a> {
        &self.last
    }

    pub fn start(&self) -> usize {
        self.first.start()
    }

    pub fn end(&self) -> usize {
        self.last.end()
    }

    pub fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of chunks in the block.
    pub fn chunk_count(&self) -> usize {
        self.last.id() - self.first.id() + 1
    }

    /// The block's bytes.
    pub fn data(&self) -> &'a [u8] {
        &self.first.source()[self.range()]
    }
}

/// Blocks are equal when they cover the same span with the same bytes.
impl PartialEq for Block<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.range() == other.range() && self.data() == other.data()
    }
}

impl Eq for Block<'_> {}

impl fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("range", &self.range())
            .field("chunks", &self.chunk_count())
            .finish()
    }
}

impl Serialize for Block<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.range().serialize(serializer)
    }
}

/// The last point of agreement before a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor<'a> {
    /// No shared chunk precedes the block.
    Start,
    /// The nearest preceding chunk present on the other side. Anchors from
    /// opposite sides compare by chunk content.
    Chunk(Chunk<'a>),
}

/// A block together with its resolved anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchoredBlock<'a> {
    pub block: Block<'a>,
    pub anchor: Anchor<'a>,
}

/// Group the chunks of `ours` that are absent from `theirs` into blocks.
///
/// Survivors are scanned in order; a survivor extends the current block when
/// its predecessor is the previous survivor, and opens a new block otherwise.
pub fn unique_blocks<'a>(ours: &ChunkChain<'a>, theirs: &ChunkIndex<'a>) -> Vec<Block<'a>> {
    let mut blocks = Vec::new();
    let mut current: Option<(Chunk<'a>, Chunk<'a>)> = None;

    for chunk in ours.iter().filter(|c| !theirs.contains(c)) {
        current = match current {
            Some((first, last)) if chunk.prev() == Some(last.id()) => Some((first, *chunk)),
            Some((first, last)) => {
                blocks.push(Block::new(first, last));
                Some((*chunk, *chunk))
            }
            None => Some((*chunk, *chunk)),
        };
    }
    if let Some((first, last)) = current {
        blocks.push(Block::new(first, last));
    }
    blocks
}

/// Walk back from `from` to the nearest chunk present in `theirs`.
pub fn resolve_anchor<'a>(
    ours: &ChunkChain<'a>,
    from: &Chunk<'a>,
    theirs: &ChunkIndex<'a>,
) -> Anchor<'a> {
    let mut cursor = ours.predecessor(from);
    while let Some(chunk) = cursor {
        if theirs.contains(chunk) {
            return Anchor::Chunk(*chunk);
        }
        cursor = ours.predecessor(chunk);
    }
    Anchor::Start
}

/// Unique blocks of `ours` relative to `theirs`, each with its anchor.
pub fn anchored_blocks<'a>(
    ours: &ChunkChain<'a>,
    theirs: &ChunkIndex<'a>,
) -> Vec<AnchoredBlock<'a>> {
    unique_blocks(ours, theirs)
        .into_iter()
        .map(|block| AnchoredBlock {
            anchor: resolve_anchor(ours, block.first(), theirs),
            block,
        })
        .collect()
}
