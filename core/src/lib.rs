//! Swanboot Core - cartridge launcher engine
//!
//! This crate implements everything the menu shell does between picking a
//! ROM on the storage card and jumping into it.
//!
//! # Architecture
//!
//! - [`metadata`] - Reads the ROM footer and derives the save media sizes
//! - [`manifest`] - INI codec for the on-card save manifest
//! - [`SaveRelocator`] - Moves save data between card files and cartridge hardware
//! - [`boot`] - Builds the [`HandoffBlock`] and hands control to the bootstub
//! - [`launch_rom`] - Backup, extract, restore and boot in one call
//!
//! The storage card, the cartridge save hardware and the machine primitives
//! are traits ([`CardFs`], [`SaveHardware`], [`BootPlatform`]) so the whole
//! pipeline also runs against a host directory.

pub mod boot;
pub mod buffer;
pub mod config;
pub mod error;
pub mod fs;
pub mod hardware;
pub mod launch;
pub mod manifest;
pub mod metadata;
pub mod relocate;
#[cfg(test)]
pub mod test_utils;
pub mod vblank;

// Re-export the launch pipeline
pub use boot::{BOOTSTUB_ENTRY, BootPlatform, Bootstub, handoff_block};
pub use launch::launch_rom;
pub use metadata::{RomMetadata, extract};
pub use relocate::{BackupOutcome, RelocatorOptions, RestoreOutcome, SaveRelocator, save_path};

// Re-export collaborators
pub use buffer::{BufferTier, ScratchBuffer};
pub use fs::{CardFile, CardFs, FileInfo, FsGeometry, HostCard, OpenMode};
pub use hardware::{MemoryCartridge, SaveHardware, Window};

// Re-export manifest and error types
pub use error::{LaunchError, Result};
pub use manifest::{IniEvent, ManifestReader, SaveManifestEntry};

pub use config::{EepromPolicy, LauncherConfig};
pub use swanboot_shared::{HandoffBlock, SaveKind};
