use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Parameters of the content-defined chunker.
///
/// Both inputs of a diff must be chunked with the same parameters; chunks
/// cut under different parameters will rarely match, and the diff degrades
/// to a single large change rather than failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Number of bytes hashed together to test for a boundary.
    pub window_size: usize,
    /// Width of the low-bit mask that must be all zero at a boundary.
    /// Expected chunk size is `2^mask_bits` bytes.
    pub mask_bits: u32,
    /// Width in bytes of one element of the input, such as a multi-channel
    /// audio frame. Chunk boundaries and narrowing never split an element.
    pub sample_size: usize,
}

impl ChunkerConfig {
    pub const DEFAULT_WINDOW_SIZE: usize = 8;
    pub const DEFAULT_MASK_BITS: u32 = 5;
    pub const MAX_MASK_BITS: u32 = 32;
    pub const DEFAULT_SAMPLE_SIZE: usize = 1;

    /// Build a validated configuration over single-byte samples.
    pub fn new(window_size: usize, mask_bits: u32) -> ConfigResult<Self> {
        let config = Self {
            window_size,
            mask_bits,
            sample_size: Self::DEFAULT_SAMPLE_SIZE,
        };
        config.validate()?;
        Ok(config)
    }

    /// The same configuration over samples of `sample_size` bytes.
    pub fn with_sample_size(self, sample_size: usize) -> ConfigResult<Self> {
        let config = Self {
            sample_size,
            ..self
        };
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from a target average chunk size, which must
    /// be a power of two.
    pub fn with_target_chunk_size(window_size: usize, target: usize) -> ConfigResult<Self> {
        if target < 2 || !target.is_power_of_two() {
            return Err(ConfigError::TargetNotPowerOfTwo(target));
        }
        Self::new(window_size, target.trailing_zeros())
    }

    /// Check the parameters are usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if !(1..=Self::MAX_MASK_BITS).contains(&self.mask_bits) {
            return Err(ConfigError::MaskBitsOutOfRange(self.mask_bits));
        }
        if self.sample_size == 0 {
            return Err(ConfigError::ZeroSampleSize);
        }
        Ok(())
    }

    /// The boundary mask: a fingerprint `f` marks a boundary when
    /// `f & mask == 0`.
    pub fn mask(&self) -> u64 {
        (1u64 << self.mask_bits) - 1
    }

    /// Expected average chunk size in bytes.
    pub fn target_chunk_size(&self) -> usize {
        1usize << self.mask_bits
    }

    pub(crate) fn window(&self) -> ConfigResult<NonZeroUsize> {
        NonZeroUsize::new(self.window_size).ok_or(ConfigError::ZeroWindow)
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            window_size: Self::DEFAULT_WINDOW_SIZE,
            mask_bits: Self::DEFAULT_MASK_BITS,
            sample_size: Self::DEFAULT_SAMPLE_SIZE,
        }
    }
}
