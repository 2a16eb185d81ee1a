//! Storage card filesystem contract.
//!
//! The launcher never talks to a concrete FAT driver. It consumes a small
//! POSIX-like API plus the allocation-table geometry the bootstub needs to
//! find the program on its own after the jump.

mod host;

pub use host::HostCard;

use std::io::{self, Read, Seek, Write};

use serde::{Deserialize, Serialize};
use swanboot_shared::FsType;

/// How a card file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only, the file must exist.
    ReadExisting,
    /// Write-only, the file must exist. Contents are kept.
    WriteExisting,
    /// Read/write, created if missing. Contents are kept.
    ReadWriteAlways,
    /// Write-only, created if missing and truncated otherwise.
    CreateAlways,
}

/// Directory entry details returned by [`CardFs::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    /// First allocation unit of the file's data
    pub first_cluster: u32,
}

/// Allocation-table geometry of the mounted volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsGeometry {
    /// First sector of the data region
    pub data_base: u32,
    /// First sector of the allocation table
    pub fat_base: u32,
    /// Sectors per allocation unit
    pub cluster_size: u16,
    /// Number of allocation table entries
    pub fat_entry_count: u32,
    pub fs_type: FsType,
}

impl Default for FsGeometry {
    fn default() -> Self {
        Self {
            data_base: 0x4000,
            fat_base: 0x0820,
            cluster_size: 64,
            fat_entry_count: 0x0001_E000,
            fs_type: FsType::Fat32,
        }
    }
}

/// An open card file.
pub trait CardFile: Read + Write + Seek {
    /// Current file size in bytes.
    fn size(&self) -> io::Result<u64>;

    /// Ask the driver for a contiguous extent of `len` bytes.
    ///
    /// Purely a performance hint; callers ignore failures.
    fn reserve_contiguous(&mut self, len: u64) -> io::Result<()> {
        let _ = len;
        Ok(())
    }
}

/// The mounted storage card.
pub trait CardFs {
    type File: CardFile;

    fn open(&mut self, path: &str, mode: OpenMode) -> io::Result<Self::File>;

    fn stat(&mut self, path: &str) -> io::Result<FileInfo>;

    fn unlink(&mut self, path: &str) -> io::Result<()>;

    /// Current working directory as an absolute card path.
    fn cwd(&self) -> io::Result<String>;

    fn geometry(&self) -> FsGeometry;
}
