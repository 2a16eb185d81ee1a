//! Shared types for the swanboot cartridge launcher.
//!
//! Everything in this crate is a wire or on-card format: the ROM footer,
//! the save media kinds and their file/manifest spellings, and the handoff
//! block read by the second-stage loader. Changing any layout here is a
//! protocol change.

pub mod constants;
pub mod handoff;
pub mod rom_format;
pub mod save_kind;

pub use handoff::{FarPointer, FsType, HANDOFF_VERSION, HandoffBlock, HandoffError};
pub use rom_format::{
    EEPROM_SIZES, ELISA_FLASH_SIZE, ELISA_SIGNATURE, ELISA_SIGNATURE_OFFSET, FOOTER_SIZE,
    RomBankLayout, RomFooter, SRAM_SIZES_KIB, eeprom_capacity, sram_capacity,
};
pub use save_kind::SaveKind;
