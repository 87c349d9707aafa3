//! Virtual alignment of source hunks.
//!
//! Hunks read from an external differ are in source coordinates, so the two
//! sides drift apart as soon as one side gains content the other lacks. To
//! place both on one timeline, each A range is shifted by the total length of
//! B hunks seen so far and each B range by the total length of A hunks.

use serde::Serialize;

use crate::hunk::Hunk;

/// Incremental aligner: feed hunks in source order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VirtualAligner {
    offset_a: usize,
    offset_b: usize,
}

impl VirtualAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative length of A hunks aligned so far.
    pub fn offset_a(&self) -> usize {
        self.offset_a
    }

    /// Cumulative length of B hunks aligned so far.
    pub fn offset_b(&self) -> usize {
        self.offset_b
    }

    /// Map one source hunk into virtual space and account for its lengths.
    pub fn align(&mut self, hunk: &Hunk) -> Hunk {
        let aligned = Hunk::new(
            hunk.a.start + self.offset_b,
            hunk.a.end + self.offset_b,
            hunk.b.start + self.offset_a,
            hunk.b.end + self.offset_a,
        );
        self.offset_a += hunk.a_len();
        self.offset_b += hunk.b_len();
        aligned
    }
}

/// Aligned hunks plus the final cumulative offsets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Alignment {
    pub hunks: Vec<Hunk>,
    pub offset_a: usize,
    pub offset_b: usize,
}

/// Align a whole hunk sequence.
pub fn align_hunks(hunks: &[Hunk]) -> Alignment {
    let mut aligner = VirtualAligner::new();
    let hunks = hunks.iter().map(|hunk| aligner.align(hunk)).collect();
    Alignment {
        hunks,
        offset_a: aligner.offset_a(),
        offset_b: aligner.offset_b(),
    }
}
