//! Content-defined chunking diff engine.
//!
//! Splits two byte buffers into content-addressed chunks, finds the runs of
//! chunks unique to each side and lays the differences out as ordered hunks
//! on a shared virtual timeline. Chunk boundaries depend only on local
//! content, so an edit disturbs the chunks around it and nothing else.
//!
//! ```
//! use chunkdiff_core::Diff;
//!
//! let diff = Diff::new(b"same bytes", b"same bytes");
//! assert!(diff.is_empty());
//! ```
//!
//! # Key Types
//!
//! - [`Chunker`] / [`ChunkChain`] / [`Chunk`] -- Content-defined chunking
//! - [`ChunkIndex`] -- Content-keyed lookup of one side's chunks
//! - [`Block`] / [`Anchor`] -- Runs of unique chunks and where they diverge
//! - [`DiffHunk`] / [`HunkKind`] -- One aligned difference in virtual space
//! - [`Diff`] -- Lazily computed, cached hunk sequence
//! - [`Hunk`] -- A difference in source coordinates, narrowing and alignment

pub mod align;
pub mod block;
pub mod chunk;
pub mod config;
pub mod diff;
pub mod error;
pub mod hunk;
pub mod index;
pub mod merge;

pub use align::{align_hunks, Alignment, VirtualAligner};
pub use block::{anchored_blocks, resolve_anchor, unique_blocks, Anchor, AnchoredBlock, Block};
pub use chunk::{Chunk, ChunkChain, ChunkId, Chunker};
pub use config::ChunkerConfig;
pub use diff::{diff, Diff};
pub use error::{ConfigError, ConfigResult, HunkParseError};
pub use hunk::{narrow, narrow_samples, parse_hunks, Hunk};
pub use index::ChunkIndex;
pub use merge::{merge_blocks, DiffHunk, HunkKind};
