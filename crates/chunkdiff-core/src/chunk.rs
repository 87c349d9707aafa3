//! Content-defined chunking.
//!
//! [`Chunker`] slides a Rabin window over a buffer and cuts a chunk wherever
//! the low bits of the window fingerprint are all zero. Because a boundary
//! depends only on the `W` bytes under the window, an edit moves at most the
//! boundaries whose windows overlap it; everything else lines up again.
//!
//! The chunks of one buffer live in a [`ChunkChain`]: a flat arena in which
//! each chunk names its predecessor by index.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::ops::{Index, Range};

use chunkdiff_hash::{ContentDigest, RabinWindow};
use tracing::debug;

use crate::config::ChunkerConfig;
use crate::error::ConfigResult;

/// Position of a chunk within its [`ChunkChain`].
pub type ChunkId = usize;

/// A content-addressed slice of one source buffer.
///
/// Two chunks are equal when their bytes are equal, wherever they sit and
/// whichever buffer they come from. The digest only speeds up hashing and
/// rejects; equality is always decided on the bytes.
#[derive(Clone, Copy)]
pub struct Chunk<'a> {
    source: &'a [u8],
    id: ChunkId,
    prev: Option<ChunkId>,
    start: usize,
    end: usize,
    digest: ContentDigest,
}

impl<'a> Chunk<'a> {
    /// Index of this chunk in its chain.
    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// Index of the preceding chunk, `None` for the first chunk.
    pub fn prev(&self) -> Option<ChunkId> {
        self.prev
    }

    /// Start offset (inclusive), the predecessor's end or 0.
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The chunk's bytes.
    pub fn data(&self) -> &'a [u8] {
        &self.source[self.start..self.end]
    }

    /// The whole buffer this chunk was cut from.
    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    /// Digest of the chunk's bytes, computed once at construction.
    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }
}

impl PartialEq for Chunk<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest && self.data() == other.data()
    }
}

impl Eq for Chunk<'_> {}

impl Hash for Chunk<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
    }
}

impl fmt::Debug for Chunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("id", &self.id)
            .field("range", &self.range())
            .field("digest", &self.digest.short_hex())
            .finish()
    }
}

/// The ordered, gapless chunks of one source buffer.
///
/// Chunk `i` always has predecessor `i - 1`, the first chunk starts at 0 and
/// the last ends at the buffer length.
#[derive(Clone, Debug)]
pub struct ChunkChain<'a> {
    source: &'a [u8],
    chunks: Vec<Chunk<'a>>,
}

impl<'a> ChunkChain<'a> {
    fn with_capacity(source: &'a [u8], capacity: usize) -> Self {
        Self {
            source,
            chunks: Vec::with_capacity(capacity),
        }
    }

    /// Append a chunk running from the current end to `end`.
    fn push(&mut self, end: usize) {
        let start = self.end();
        let id = self.chunks.len();
        self.chunks.push(Chunk {
            source: self.source,
            id,
            prev: id.checked_sub(1),
            start,
            end,
            digest: ContentDigest::of(&self.source[start..end]),
        });
    }

    /// Cut `source` at explicit chunk ends.
    #[cfg(test)]
    pub(crate) fn from_ends(source: &'a [u8], ends: impl IntoIterator<Item = usize>) -> Self {
        let mut chain = Self::with_capacity(source, 0);
        for end in ends {
            chain.push(end);
        }
        chain
    }

    /// One chunk per byte.
    #[cfg(test)]
    pub(crate) fn bytewise(source: &'a [u8]) -> Self {
        Self::from_ends(source, 1..=source.len())
    }

    /// End offset of the last chunk, 0 for an empty chain.
    fn end(&self) -> usize {
        self.chunks.last().map_or(0, Chunk::end)
    }

    /// The buffer these chunks partition.
    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, id: ChunkId) -> Option<&Chunk<'a>> {
        self.chunks.get(id)
    }

    /// The chunk immediately before `chunk`.
    pub fn predecessor(&self, chunk: &Chunk<'a>) -> Option<&Chunk<'a>> {
        chunk.prev.and_then(|id| self.chunks.get(id))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk<'a>> {
        self.chunks.iter()
    }

    pub fn as_slice(&self) -> &[Chunk<'a>] {
        &self.chunks
    }

    /// End offsets of every chunk, in order.
    pub fn boundaries(&self) -> Vec<usize> {
        self.chunks.iter().map(Chunk::end).collect()
    }
}

impl<'a> Index<ChunkId> for ChunkChain<'a> {
    type Output = Chunk<'a>;

    fn index(&self, id: ChunkId) -> &Self::Output {
        &self.chunks[id]
    }
}

impl<'c, 'a> IntoIterator for &'c ChunkChain<'a> {
    type Item = &'c Chunk<'a>;
    type IntoIter = std::slice::Iter<'c, Chunk<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Splits buffers into content-defined chunks.
#[derive(Clone, Debug)]
pub struct Chunker {
    config: ChunkerConfig,
    window: RabinWindow,
}

impl Chunker {
    /// Create a chunker, validating the configuration.
    pub fn new(config: ChunkerConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            window: RabinWindow::new(config.window()?),
        })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Partition `data` into chunks.
    ///
    /// A boundary is declared at window start `i` for every
    /// `0 <= i <= len - W` that falls on a sample edge and whose fingerprint
    /// has the masked bits clear. A boundary at `i = 0` would cut an empty
    /// leading chunk and is skipped. A final chunk always ends at
    /// `data.len()`, so an empty buffer yields one empty chunk and a buffer
    /// shorter than the window yields one chunk covering it.
    pub fn split<'a>(&self, data: &'a [u8]) -> ChunkChain<'a> {
        let mask = self.config.mask();
        let window_size = self.config.window_size;
        let sample_size = self.config.sample_size;
        let mut window = self.window.clone();
        window.reset();

        let mut chain =
            ChunkChain::with_capacity(data, data.len() / self.config.target_chunk_size() + 1);
        for (i, &byte) in data.iter().enumerate() {
            let fingerprint = window.roll(byte);
            if i + 1 < window_size {
                continue;
            }
            let boundary = i + 1 - window_size;
            if fingerprint & mask == 0 && boundary > chain.end() && boundary % sample_size == 0 {
                chain.push(boundary);
            }
        }
        chain.push(data.len());

        debug!(len = data.len(), chunks = chain.len(), "split buffer into chunks");
        chain
    }
}

impl Default for Chunker {
    fn default() -> Self {
        let window = NonZeroUsize::new(ChunkerConfig::DEFAULT_WINDOW_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            config: ChunkerConfig::default(),
            window: RabinWindow::new(window),
        }
    }
}
