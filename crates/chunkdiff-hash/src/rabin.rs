//! Rabin fingerprints over GF(2).
//!
//! A byte string `w0 w1 .. w(n-1)` is read as the polynomial
//! `w0·x^(8(n-1)) + .. + w(n-1)` with coefficients in GF(2), and its
//! fingerprint is the remainder modulo an irreducible polynomial `P`.
//!
//! [`RabinWindow`] keeps the fingerprint of the last `W` bytes up to date
//! in constant time per byte: the outgoing byte's contribution is removed
//! with a precomputed table before the incoming byte is shifted in.

use std::num::NonZeroUsize;

/// Smallest supported polynomial degree; the shift table indexes one byte.
const MIN_DEGREE: u32 = 8;
/// Largest supported polynomial degree; `digest << 8` must fit in 64 bits.
const MAX_DEGREE: u32 = 56;

/// Errors from constructing fingerprint parameters.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    /// The polynomial degree is outside the supported range.
    #[error("polynomial {polynomial:#x} has degree {degree}, expected 8..=56")]
    UnsupportedDegree { polynomial: u64, degree: u32 },
}

/// A polynomial over GF(2), stored as its coefficient bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Polynomial(u64);

impl Polynomial {
    /// Degree-53 irreducible polynomial used unless another one is given.
    pub const DEFAULT: Self = Self(0x3DA3_358B_4DC1_73);

    /// Create a polynomial, checking that its degree is usable for rolling.
    pub fn new(bits: u64) -> Result<Self, HashError> {
        let degree = if bits == 0 { 0 } else { 63 - bits.leading_zeros() };
        if !(MIN_DEGREE..=MAX_DEGREE).contains(&degree) {
            return Err(HashError::UnsupportedDegree {
                polynomial: bits,
                degree,
            });
        }
        Ok(Self(bits))
    }

    /// The coefficient bits.
    pub fn bits(&self) -> u64 {
        self.0
    }

    /// Degree of the polynomial.
    pub fn degree(&self) -> u32 {
        63 - self.0.leading_zeros()
    }

    /// Remainder of `value` divided by this polynomial.
    pub fn reduce(&self, mut value: u64) -> u64 {
        let degree = self.degree();
        while value != 0 {
            let top = 63 - value.leading_zeros();
            if top < degree {
                break;
            }
            value ^= self.0 << (top - degree);
        }
        value
    }
}

impl Default for Polynomial {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Fingerprint of a whole byte string under `polynomial`.
pub fn fingerprint(polynomial: Polynomial, data: &[u8]) -> u64 {
    let shift_table = shift_table(polynomial);
    let shift = polynomial.degree() - 8;
    data.iter()
        .fold(0, |digest, &byte| append(&shift_table, shift, digest, byte))
}

/// Fingerprint of a sliding window of fixed width.
#[derive(Clone, Debug)]
pub struct RabinWindow {
    polynomial: Polynomial,
    /// `t -> (t·x^deg mod P) ^ (t·x^deg)`: reduces and clears the byte
    /// pushed above the degree by a shift.
    shift_table: [u64; 256],
    /// `b -> b·x^(8(W-1)) mod P`: contribution of the byte leaving the window.
    out_table: [u64; 256],
    shift: u32,
    ring: Vec<u8>,
    pos: usize,
    filled: usize,
    digest: u64,
}

impl RabinWindow {
    /// Window over `window_size` bytes using [`Polynomial::DEFAULT`].
    pub fn new(window_size: NonZeroUsize) -> Self {
        Self::with_polynomial(window_size, Polynomial::DEFAULT)
    }

    /// Window over `window_size` bytes using a custom polynomial.
    pub fn with_polynomial(window_size: NonZeroUsize, polynomial: Polynomial) -> Self {
        let shift_table = shift_table(polynomial);
        let shift = polynomial.degree() - 8;

        // x^(8(W-1)) mod P, then spread over every byte value by linearity.
        let mut leading = 1u64;
        for _ in 1..window_size.get() {
            leading = append(&shift_table, shift, leading, 0);
        }
        let mut out_table = [0u64; 256];
        for (byte, slot) in out_table.iter_mut().enumerate() {
            *slot = (0..8u32)
                .filter(|&bit| byte & (1 << bit) != 0)
                .fold(0, |acc, bit| acc ^ polynomial.reduce(leading << bit));
        }

        Self {
            polynomial,
            shift_table,
            out_table,
            shift,
            ring: vec![0; window_size.get()],
            pos: 0,
            filled: 0,
            digest: 0,
        }
    }

    /// Number of bytes the window spans.
    pub fn window_size(&self) -> usize {
        self.ring.len()
    }

    /// The polynomial the fingerprint is taken over.
    pub fn polynomial(&self) -> Polynomial {
        self.polynomial
    }

    /// Returns `true` once `window_size` bytes have been rolled in.
    pub fn is_full(&self) -> bool {
        self.filled == self.ring.len()
    }

    /// Fingerprint of the bytes currently in the window.
    pub fn digest(&self) -> u64 {
        self.digest
    }

    /// Forget every byte seen so far.
    pub fn reset(&mut self) {
        self.ring.fill(0);
        self.pos = 0;
        self.filled = 0;
        self.digest = 0;
    }

    /// Slide the window forward by one byte and return the new fingerprint.
    pub fn roll(&mut self, byte: u8) -> u64 {
        if self.is_full() {
            let outgoing = self.ring[self.pos];
            self.digest ^= self.out_table[outgoing as usize];
        } else {
            self.filled += 1;
        }
        self.ring[self.pos] = byte;
        self.pos = (self.pos + 1) % self.ring.len();
        self.digest = append(&self.shift_table, self.shift, self.digest, byte);
        self.digest
    }
}

fn shift_table(polynomial: Polynomial) -> [u64; 256] {
    let degree = polynomial.degree();
    let mut table = [0u64; 256];
    for (top, slot) in table.iter_mut().enumerate() {
        let high = (top as u64) << degree;
        *slot = polynomial.reduce(high) ^ high;
    }
    table
}

/// `(digest·x^8 + byte) mod P` for a `digest` already reduced.
fn append(shift_table: &[u64; 256], shift: u32, digest: u64, byte: u8) -> u64 {
    let top = (digest >> shift) as usize;
    ((digest << 8) | u64::from(byte)) ^ shift_table[top]
}
