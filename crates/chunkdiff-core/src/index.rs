use std::collections::HashMap;

use crate::chunk::{Chunk, ChunkChain};

/// Content-keyed lookup over one side's chunks.
///
/// Answers "does this exact content occur on that side" in O(1) average
/// time. Keys compare by content, so a chunk from the other buffer finds its
/// twin regardless of position. Iteration follows the original scan order;
/// for repeated content the first occurrence is the one kept.
#[derive(Clone, Debug, Default)]
pub struct ChunkIndex<'a> {
    positions: HashMap<Chunk<'a>, usize>,
    order: Vec<Chunk<'a>>,
}

impl<'a> ChunkIndex<'a> {
    /// Index every chunk of a chain.
    pub fn build(chain: &ChunkChain<'a>) -> Self {
        chain.iter().copied().collect()
    }

    /// Returns `true` if a chunk with the same content is indexed.
    pub fn contains(&self, chunk: &Chunk<'a>) -> bool {
        self.positions.contains_key(chunk)
    }

    /// The indexed chunk whose content equals `chunk`'s.
    pub fn get(&self, chunk: &Chunk<'a>) -> Option<&Chunk<'a>> {
        self.positions.get(chunk).map(|&pos| &self.order[pos])
    }

    /// Number of distinct contents indexed.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Indexed chunks in scan order.
    pub fn iter(&self) -> std::slice::Iter<'_, Chunk<'a>> {
        self.order.iter()
    }
}

impl<'a> FromIterator<Chunk<'a>> for ChunkIndex<'a> {
    fn from_iter<I: IntoIterator<Item = Chunk<'a>>>(iter: I) -> Self {
        let mut index = Self::default();
        for chunk in iter {
            let next = index.order.len();
            if let std::collections::hash_map::Entry::Vacant(slot) = index.positions.entry(chunk) {
                slot.insert(next);
                index.order.push(chunk);
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunker;
    use crate::config::ChunkerConfig;

    fn tiny_chunker() -> Chunker {
        Chunker::new(ChunkerConfig::new(2, 1).unwrap()).unwrap()
    }

    #[test]
    fn indexes_every_distinct_chunk() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let chain = tiny_chunker().split(data);
        let index = ChunkIndex::build(&chain);
        assert!(!index.is_empty());
        assert!(index.len() <= chain.len());
        for chunk in &chain {
            assert!(index.contains(chunk));
        }
    }

    #[test]
    fn lookup_is_by_content_across_buffers() {
        let chunker = Chunker::default();
        let a = chunker.split(b"short");
        let b = chunker.split(b"short");
        let c = chunker.split(b"other");
        let index = ChunkIndex::build(&a);
        assert!(index.contains(&b[0]));
        assert!(!index.contains(&c[0]));
        assert_eq!(index.get(&b[0]).map(|c| c.data()), Some(&b"short"[..]));
    }

    #[test]
    fn duplicate_content_keeps_first_occurrence() {
        let first = b"dup".to_vec();
        let second = b"dup".to_vec();
        let chunker = Chunker::default();
        let chunks = [chunker.split(&first)[0], chunker.split(&second)[0]];
        let index: ChunkIndex<'_> = chunks.iter().copied().collect();
        assert_eq!(index.len(), 1);
        let kept = index.get(&chunks[1]).unwrap();
        assert!(std::ptr::eq(kept.source(), first.as_slice()));
    }

    #[test]
    fn scan_order_preserved() {
        let data = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let chain = tiny_chunker().split(data);
        let index = ChunkIndex::build(&chain);
        let starts: Vec<usize> = index.iter().map(|c| c.start()).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn empty_index() {
        let index = ChunkIndex::default();
        assert!(index.is_empty());
        let chain = Chunker::default().split(b"x");
        assert!(!index.contains(&chain[0]));
    }
}
