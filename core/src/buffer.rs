//! Scratch buffer used for card-to-card copies and fills.
//!
//! Monochrome units have almost no spare working RAM, so the copy chunk is
//! chosen once at startup: a sector-sized buffer when the extra memory is
//! available, a tiny one otherwise. Both tiers share one code path.

use serde::{Deserialize, Serialize};

/// Size of the large scratch tier.
pub const SECTOR_BUFFER_SIZE: usize = 1024;

/// Size of the small scratch tier.
pub const SMALL_BUFFER_SIZE: usize = 16;

/// Scratch buffer size policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BufferTier {
    /// Sector-sized when the platform has its extended working memory (color mode)
    #[default]
    Auto,
    Sector,
    Small,
}

impl BufferTier {
    /// Chunk size for this tier on a platform with or without extended memory.
    pub fn chunk_size(self, extended_memory: bool) -> usize {
        match self {
            BufferTier::Sector => SECTOR_BUFFER_SIZE,
            BufferTier::Small => SMALL_BUFFER_SIZE,
            BufferTier::Auto if extended_memory => SECTOR_BUFFER_SIZE,
            BufferTier::Auto => SMALL_BUFFER_SIZE,
        }
    }
}

/// Fixed-storage scratch buffer with an active length.
pub struct ScratchBuffer {
    storage: [u8; SECTOR_BUFFER_SIZE],
    len: usize,
}

impl ScratchBuffer {
    /// `chunk_size` is clamped to `1..=SECTOR_BUFFER_SIZE`.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            storage: [0; SECTOR_BUFFER_SIZE],
            len: chunk_size.clamp(1, SECTOR_BUFFER_SIZE),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.len
    }

    /// The active part of the buffer.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[..self.len]
    }

    /// Fill the active part with `byte` and return it.
    pub fn filled(&mut self, byte: u8) -> &[u8] {
        let active = self.as_mut_slice();
        active.fill(byte);
        active
    }
}
