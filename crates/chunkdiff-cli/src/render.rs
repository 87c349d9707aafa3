//! Proportional bars for terminal output.
//!
//! A bar maps a whole source onto `width` cells. Cells touched by a hunk are
//! drawn as `#`, the insertion point of an empty range as `^`, the rest as `.`.

use std::ops::Range;

const UNCHANGED: char = '.';
const CHANGED: char = '#';
const INSERTION: char = '^';

pub fn bar(len: usize, ranges: &[Range<usize>], width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let mut cells = vec![UNCHANGED; width];
    let cell = |offset: usize| {
        if len == 0 {
            0
        } else {
            (offset.saturating_mul(width) / len).min(width - 1)
        }
    };

    for range in ranges {
        if range.is_empty() {
            let at = cell(range.start);
            if cells[at] == UNCHANGED {
                cells[at] = INSERTION;
            }
        } else {
            for c in &mut cells[cell(range.start)..=cell(range.end - 1)] {
                *c = CHANGED;
            }
        }
    }
    cells.into_iter().collect()
}

/// Human-readable byte count.
pub fn bytes(n: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{n} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
