//! The diff facade.
//!
//! [`Diff`] borrows both inputs, runs the whole pipeline on first access and
//! caches the resulting hunks:
//!
//! ```text
//! A, B ──► Chunker ──► ChunkIndex (each side)
//!                 └──► unique blocks + anchors (against the other index)
//!                          └──► merge ──► DiffHunk sequence
//! ```

use std::cell::OnceCell;
use std::fmt;
use std::ops::Index;

use tracing::debug;

use crate::block::anchored_blocks;
use crate::chunk::Chunker;
use crate::config::ChunkerConfig;
use crate::error::ConfigResult;
use crate::hunk::{narrow_samples, Hunk};
use crate::index::ChunkIndex;
use crate::merge::{merge_blocks, DiffHunk};

/// A lazily computed, cached diff of two byte buffers.
///
/// Computation is a pure function of the two inputs and the chunker
/// configuration; the cache only avoids doing it twice.
#[derive(Debug)]
pub struct Diff<'a> {
    a: &'a [u8],
    b: &'a [u8],
    chunker: Chunker,
    hunks: OnceCell<Vec<DiffHunk<'a>>>,
}

impl<'a> Diff<'a> {
    /// Diff with the default configuration.
    pub fn new(a: &'a [u8], b: &'a [u8]) -> Self {
        Self::from_chunker(a, b, Chunker::default())
    }

    /// Diff with an explicit configuration.
    pub fn with_config(a: &'a [u8], b: &'a [u8], config: ChunkerConfig) -> ConfigResult<Self> {
        Ok(Self::from_chunker(a, b, Chunker::new(config)?))
    }

    /// Diff with the default mask and the given window size.
    pub fn with_window_size(a: &'a [u8], b: &'a [u8], window_size: usize) -> ConfigResult<Self> {
        let config = ChunkerConfig {
            window_size,
            ..ChunkerConfig::default()
        };
        Self::with_config(a, b, config)
    }

    fn from_chunker(a: &'a [u8], b: &'a [u8], chunker: Chunker) -> Self {
        Self {
            a,
            b,
            chunker,
            hunks: OnceCell::new(),
        }
    }

    pub fn a(&self) -> &'a [u8] {
        self.a
    }

    pub fn b(&self) -> &'a [u8] {
        self.b
    }

    pub fn config(&self) -> &ChunkerConfig {
        self.chunker.config()
    }

    /// The ordered hunk sequence, computed on first call.
    pub fn hunks(&self) -> &[DiffHunk<'a>] {
        self.hunks.get_or_init(|| compute_hunks(&self.chunker, self.a, self.b))
    }

    /// Number of hunks.
    pub fn len(&self) -> usize {
        self.hunks().len()
    }

    /// `true` when the inputs share every chunk.
    pub fn is_empty(&self) -> bool {
        self.hunks().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DiffHunk<'a>> {
        self.hunks().get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffHunk<'a>> {
        self.hunks().iter()
    }

    /// Hunks in each input's own coordinates, chunk aligned.
    pub fn source_hunks(&self) -> Vec<Hunk> {
        self.iter().map(DiffHunk::to_hunk).collect()
    }

    /// Source hunks trimmed down to the samples that actually differ.
    pub fn narrowed_hunks(&self) -> Vec<Hunk> {
        narrow_samples(self.a, self.b, &self.source_hunks(), self.config().sample_size)
    }
}

impl<'a> Index<usize> for Diff<'a> {
    type Output = DiffHunk<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.hunks()[index]
    }
}

impl<'d, 'a> IntoIterator for &'d Diff<'a> {
    type Item = &'d DiffHunk<'a>;
    type IntoIter = std::slice::Iter<'d, DiffHunk<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Diff<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for hunk in self {
            writeln!(f, "{hunk}")?;
        }
        Ok(())
    }
}

/// Diff two buffers with the default configuration.
pub fn diff<'a>(a: &'a [u8], b: &'a [u8]) -> Vec<DiffHunk<'a>> {
    compute_hunks(&Chunker::default(), a, b)
}

fn compute_hunks<'a>(chunker: &Chunker, a: &'a [u8], b: &'a [u8]) -> Vec<DiffHunk<'a>> {
    let chain_a = chunker.split(a);
    let chain_b = chunker.split(b);
    let index_a = ChunkIndex::build(&chain_a);
    let index_b = ChunkIndex::build(&chain_b);

    let blocks_a = anchored_blocks(&chain_a, &index_b);
    let blocks_b = anchored_blocks(&chain_b, &index_a);
    debug!(
        a_chunks = chain_a.len(),
        b_chunks = chain_b.len(),
        a_blocks = blocks_a.len(),
        b_blocks = blocks_b.len(),
        "found unique blocks"
    );

    let hunks = merge_blocks(&blocks_a, &blocks_b, a.len(), b.len());
    debug!(hunks = hunks.len(), "merged hunks");
    hunks
}
