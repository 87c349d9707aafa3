//! Hashing primitives for chunkdiff.
//!
//! Provides the Rabin rolling window fingerprint used to place
//! content-defined chunk boundaries, and the BLAKE3 content digest that
//! identifies a chunk's bytes.
//!
//! # Key Types
//!
//! - [`Polynomial`] -- Irreducible polynomial over GF(2) defining a Rabin fingerprint
//! - [`RabinWindow`] -- Incremental fingerprint of the last `W` bytes seen
//! - [`ContentDigest`] -- BLAKE3 digest of a byte slice

pub mod digest;
pub mod rabin;

pub use digest::ContentDigest;
pub use rabin::{fingerprint, HashError, Polynomial, RabinWindow};
