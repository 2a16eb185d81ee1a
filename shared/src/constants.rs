//! Fixed addresses and sizes of the console side of the launcher.

/// Size of one bank-switched window (SRAM or ROM), in bytes.
pub const BANK_WINDOW_SIZE: usize = 0x10000;

/// Largest ROM image the second stage can map (64 banks of 64 KiB).
pub const MAX_ROM_SIZE: u64 = 4 * 1024 * 1024;

/// Smallest mapped ROM size; smaller images are padded up to one bank.
pub const MIN_ROM_SIZE: u64 = BANK_WINDOW_SIZE as u64;

/// Low-memory address the bootstub code is copied to.
pub const BOOTSTUB_LOAD_ADDRESS: u16 = 0x00C0;

/// Upper bound of the resident bootstub code area.
pub const BOOTSTUB_CODE_END: u16 = 0x1000;

/// VRAM address the bootstub tile graphic is decompressed to.
pub const BOOTSTUB_TILES_ADDRESS: u16 = 0x3200;

/// SRAM bank mask handed over when a ROM is booted without save metadata.
pub const DEFAULT_SRAM_MASK: u8 = 7;

/// Maximum bootstub code size that fits the resident area.
pub const fn max_bootstub_size() -> usize {
    (BOOTSTUB_CODE_END - BOOTSTUB_LOAD_ADDRESS) as usize
}
