//! Bootstub handoff block.
//!
//! The launcher and the resident second-stage loader agree on exactly one
//! thing: the layout of this block. The loader reads it after the jump to find
//! the filesystem and the program to map, so any change here must bump
//! [`HANDOFF_VERSION`] and ship together with a matching bootstub.
//!
//! # Layout (version 1, little-endian)
//!
//! ```text
//! 0x00  u8   version
//! 0x01  u8   fs_type
//! 0x02  u16  cluster_size        (sectors per cluster)
//! 0x04  u32  data_base           (first data sector)
//! 0x08  u32  cluster_table_base  (first FAT sector)
//! 0x0C  u32  fat_entry_count
//! 0x10  u32  prog_cluster        (first cluster of the program file)
//! 0x14  u32  prog_size           (program size in bytes)
//! 0x18  u8   prog_sram_mask
//! 0x19  u8[3] reserved (zero)
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current handoff block version.
pub const HANDOFF_VERSION: u8 = 1;

/// Filesystem variant tag, using the FatFs numbering the bootstub expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FsType {
    Fat12,
    Fat16,
    #[default]
    Fat32,
    ExFat,
}

impl FsType {
    pub const fn tag(self) -> u8 {
        match self {
            FsType::Fat12 => 1,
            FsType::Fat16 => 2,
            FsType::Fat32 => 3,
            FsType::ExFat => 4,
        }
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(FsType::Fat12),
            2 => Some(FsType::Fat16),
            3 => Some(FsType::Fat32),
            4 => Some(FsType::ExFat),
            _ => None,
        }
    }
}

/// A real-mode `segment:offset` address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarPointer {
    pub segment: u16,
    pub offset: u16,
}

impl FarPointer {
    pub const fn new(segment: u16, offset: u16) -> Self {
        Self { segment, offset }
    }

    /// 20-bit linear address.
    pub const fn linear(self) -> u32 {
        ((self.segment as u32) << 4) + self.offset as u32
    }
}

/// Errors decoding a handoff block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandoffError {
    #[error("handoff block too short: {0} bytes")]
    TooShort(usize),
    #[error("unsupported handoff version {0}")]
    UnsupportedVersion(u8),
    #[error("unknown filesystem tag {0}")]
    UnknownFsType(u8),
}

/// Inputs of the second-stage loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffBlock {
    pub fs_type: FsType,
    pub cluster_size: u16,
    pub data_base: u32,
    pub cluster_table_base: u32,
    pub fat_entry_count: u32,
    pub prog_cluster: u32,
    pub prog_size: u32,
    pub prog_sram_mask: u8,
}

impl HandoffBlock {
    pub const SIZE: usize = 28;

    /// Write block to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = HANDOFF_VERSION;
        bytes[1] = self.fs_type.tag();
        bytes[2..4].copy_from_slice(&self.cluster_size.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.data_base.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.cluster_table_base.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.fat_entry_count.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.prog_cluster.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.prog_size.to_le_bytes());
        bytes[24] = self.prog_sram_mask;
        bytes
    }

    /// Read block from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HandoffError> {
        if bytes.len() < Self::SIZE {
            return Err(HandoffError::TooShort(bytes.len()));
        }
        if bytes[0] != HANDOFF_VERSION {
            return Err(HandoffError::UnsupportedVersion(bytes[0]));
        }
        let fs_type = FsType::from_tag(bytes[1]).ok_or(HandoffError::UnknownFsType(bytes[1]))?;
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Ok(Self {
            fs_type,
            cluster_size: u16::from_le_bytes([bytes[2], bytes[3]]),
            data_base: u32_at(4),
            cluster_table_base: u32_at(8),
            fat_entry_count: u32_at(12),
            prog_cluster: u32_at(16),
            prog_size: u32_at(20),
            prog_sram_mask: bytes[24],
        })
    }
}
