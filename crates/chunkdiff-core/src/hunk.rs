//! Source hunks: differences expressed in each input's own coordinates.
//!
//! A [`Hunk`] pairs a byte range of A with a byte range of B. Its text form is
//! a single line of four whitespace-separated integers,
//! `start_a end_a start_b end_b`, the format emitted by external frame-level
//! differs and accepted by [`parse_hunks`].

use std::fmt;
use std::io::BufRead;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::HunkParseError;

/// A pair of ranges, one in each source, that differ.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hunk {
    pub a: Range<usize>,
    pub b: Range<usize>,
}

impl Hunk {
    pub fn new(start_a: usize, end_a: usize, start_b: usize, end_b: usize) -> Self {
        Self {
            a: start_a..end_a,
            b: start_b..end_b,
        }
    }

    pub fn a_len(&self) -> usize {
        self.a.len()
    }

    pub fn b_len(&self) -> usize {
        self.b.len()
    }

    /// The larger of the two side lengths.
    pub fn len(&self) -> usize {
        self.a_len().max(self.b_len())
    }

    /// `true` when neither side covers any bytes.
    pub fn is_empty(&self) -> bool {
        self.a.is_empty() && self.b.is_empty()
    }

    fn check(self) -> Result<Self, HunkParseError> {
        for (side, range) in [('a', &self.a), ('b', &self.b)] {
            if range.start > range.end {
                return Err(HunkParseError::ReversedRange {
                    side,
                    start: range.start,
                    end: range.end,
                });
            }
        }
        Ok(self)
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.a.start, self.a.end, self.b.start, self.b.end)
    }
}

impl FromStr for Hunk {
    type Err = HunkParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        const FIELDS: [&str; 4] = ["start_a", "end_a", "start_b", "end_b"];

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != FIELDS.len() {
            return Err(HunkParseError::FieldCount(parts.len()));
        }
        let mut values = [0usize; 4];
        for ((value, part), field) in values.iter_mut().zip(&parts).zip(FIELDS) {
            *value = part.parse().map_err(|_| HunkParseError::InvalidInteger {
                field,
                value: (*part).to_string(),
            })?;
        }
        let [start_a, end_a, start_b, end_b] = values;
        Hunk::new(start_a, end_a, start_b, end_b).check()
    }
}

/// Parse a stream of hunk lines, skipping blank lines.
///
/// Errors carry the 1-based number of the offending line.
pub fn parse_hunks<R: BufRead>(reader: R) -> Result<Vec<Hunk>, HunkParseError> {
    let mut hunks = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let hunk = line.parse().map_err(|source| HunkParseError::Line {
            line: i + 1,
            source: Box::new(source),
        })?;
        hunks.push(hunk);
    }
    Ok(hunks)
}

/// Trim the bytes both sides of each hunk share at their start and end.
///
/// Chunk-aligned hunks usually carry some identical bytes on either edge,
/// since a boundary rarely falls exactly at an edit. Narrowing shrinks each
/// hunk to the bytes that actually differ and drops hunks left with nothing.
/// Hunks that fall outside `a` or `b` are passed through unchanged.
pub fn narrow(a: &[u8], b: &[u8], hunks: &[Hunk]) -> Vec<Hunk> {
    narrow_samples(a, b, hunks, 1)
}

/// [`narrow`] for inputs made of `sample_size`-byte samples.
///
/// Trims are rounded down to whole samples, so a hunk never starts or ends
/// inside a sample that differs only in some of its bytes. A `sample_size`
/// of 0 is treated as 1.
pub fn narrow_samples(a: &[u8], b: &[u8], hunks: &[Hunk], sample_size: usize) -> Vec<Hunk> {
    let sample_size = sample_size.max(1);
    hunks
        .iter()
        .filter_map(|hunk| {
            let (Some(left), Some(right)) = (a.get(hunk.a.clone()), b.get(hunk.b.clone())) else {
                warn!(%hunk, a_len = a.len(), b_len = b.len(), "hunk out of bounds, not narrowed");
                return Some(hunk.clone());
            };
            let prefix = whole_samples(common_prefix(left, right), sample_size);
            let suffix = whole_samples(common_suffix(&left[prefix..], &right[prefix..]), sample_size);
            let narrowed = Hunk::new(
                hunk.a.start + prefix,
                hunk.a.end - suffix,
                hunk.b.start + prefix,
                hunk.b.end - suffix,
            );
            (!narrowed.is_empty()).then_some(narrowed)
        })
        .collect()
}

fn whole_samples(bytes: usize, sample_size: usize) -> usize {
    bytes - bytes % sample_size
}

fn common_prefix(x: &[u8], y: &[u8]) -> usize {
    x.iter().zip(y).take_while(|(l, r)| l == r).count()
}

fn common_suffix(x: &[u8], y: &[u8]) -> usize {
    x.iter().rev().zip(y.iter().rev()).take_while(|(l, r)| l == r).count()
}
