//! Cartridge ROM footer format.
//!
//! Every ROM image ends with a fixed 16-byte footer. The launcher only cares
//! about the identity bytes and the save-type byte, whose nibbles index two
//! static size tables:
//!
//! ```text
//! save_type = 0xHL
//!             ││
//!             │└── SRAM size table   (KiB)
//!             └─── EEPROM size table (bytes)
//! ```
//!
//! One emulated-flash cartridge variant reuses the SRAM encoding and is told
//! apart by the `ELISA` font signature near the end of a 512 KiB image.
//!
//! # Example
//!
//! ```
//! use swanboot_shared::rom_format::{eeprom_capacity, sram_capacity};
//!
//! assert_eq!(sram_capacity(0x01).map(|s| s.get()), Some(8 * 1024));
//! assert_eq!(eeprom_capacity(0x50).map(|s| s.get()), Some(1024));
//! assert_eq!(sram_capacity(0x06), None);
//! ```

use std::num::NonZeroU32;

use crate::constants::{MAX_ROM_SIZE, MIN_ROM_SIZE};

/// Size of the trailing ROM footer in bytes.
pub const FOOTER_SIZE: usize = 16;

/// SRAM sizes in KiB, indexed by the low nibble of the save-type byte.
pub const SRAM_SIZES_KIB: [u16; 16] = [0, 8, 32, 128, 256, 512, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

/// EEPROM sizes in bytes, indexed by the high nibble of the save-type byte.
pub const EEPROM_SIZES: [u16; 16] = [0, 128, 2048, 0, 0, 1024, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

/// Image size of the emulated-flash cartridge variant.
pub const ELISA_FLASH_SIZE: u32 = 0x80000;

/// File offset of the font signature inside an emulated-flash image.
pub const ELISA_SIGNATURE_OFFSET: u64 = 0x70000;

/// Signature identifying the emulated-flash cartridge variant.
pub const ELISA_SIGNATURE: &[u8; 5] = b"ELISA";

/// Footer `save_type` value used by the emulated-flash variant.
pub const ELISA_SAVE_TYPE: u8 = 0x04;

/// Footer `mapper` value used by the emulated-flash variant.
pub const ELISA_MAPPER: u8 = 0x01;

/// SRAM capacity for a save-type byte, `None` when the cartridge has no SRAM.
///
/// Total over all 256 byte values; reserved nibbles resolve to `None`.
pub const fn sram_capacity(save_type: u8) -> Option<NonZeroU32> {
    let kib = SRAM_SIZES_KIB[(save_type & 0x0F) as usize] as u32;
    NonZeroU32::new(kib * 1024)
}

/// EEPROM capacity for a save-type byte, `None` when the cartridge has no EEPROM.
pub const fn eeprom_capacity(save_type: u8) -> Option<NonZeroU32> {
    NonZeroU32::new(EEPROM_SIZES[(save_type >> 4) as usize] as u32)
}

/// The 16-byte ROM footer.
///
/// Note: Not packed - we use explicit byte serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RomFooter {
    /// Far jump opcode (0xEA on retail images)
    pub jump_opcode: u8,
    /// Far jump target (offset, segment)
    pub jump_target: [u8; 4],
    /// Maintenance flags
    pub maintenance: u8,
    pub publisher_id: u8,
    /// Nonzero on color-only cartridges
    pub color: u8,
    pub game_id: u8,
    pub game_version: u8,
    /// ROM size code
    pub rom_size: u8,
    /// Save media nibbles (high = EEPROM, low = SRAM)
    pub save_type: u8,
    /// Orientation and bus width flags
    pub flags: u8,
    pub mapper: u8,
    pub checksum: u16,
}

impl RomFooter {
    pub const SIZE: usize = FOOTER_SIZE;

    /// Read footer from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            jump_opcode: bytes[0],
            jump_target: [bytes[1], bytes[2], bytes[3], bytes[4]],
            maintenance: bytes[5],
            publisher_id: bytes[6],
            color: bytes[7],
            game_id: bytes[8],
            game_version: bytes[9],
            rom_size: bytes[10],
            save_type: bytes[11],
            flags: bytes[12],
            mapper: bytes[13],
            checksum: u16::from_le_bytes([bytes[14], bytes[15]]),
        })
    }

    /// Write footer to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = self.jump_opcode;
        bytes[1..5].copy_from_slice(&self.jump_target);
        bytes[5] = self.maintenance;
        bytes[6] = self.publisher_id;
        bytes[7] = self.color;
        bytes[8] = self.game_id;
        bytes[9] = self.game_version;
        bytes[10] = self.rom_size;
        bytes[11] = self.save_type;
        bytes[12] = self.flags;
        bytes[13] = self.mapper;
        bytes[14..16].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    /// Whether the identity bytes match the emulated-flash variant.
    ///
    /// The image size and the `ELISA` signature still have to be checked
    /// against the file itself.
    pub fn matches_elisa_flash(&self) -> bool {
        self.publisher_id == 0
            && self.game_id == 0
            && self.save_type == ELISA_SAVE_TYPE
            && self.mapper == ELISA_MAPPER
    }
}

/// Placement of a ROM image inside the mapped bank space.
///
/// Images are padded up to a power of two (at least one bank) and aligned to
/// the end of that space, so the footer always lands at the top of the last
/// bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomBankLayout {
    /// Padded image size
    pub mapped_size: u64,
    /// Bank holding the first byte of the image
    pub start_bank: u16,
    /// Offset of the first byte inside `start_bank`
    pub start_offset: u16,
    /// Total number of mapped banks
    pub bank_count: u16,
}

impl RomBankLayout {
    /// Compute the layout for an image of `size` bytes, `None` if it cannot be mapped.
    pub fn for_size(size: u64) -> Option<Self> {
        if size > MAX_ROM_SIZE {
            return None;
        }
        let mapped_size = size.next_power_of_two().max(MIN_ROM_SIZE);
        let padding = mapped_size - size;
        Some(Self {
            mapped_size,
            start_bank: (padding >> 16) as u16,
            start_offset: (padding & 0xFFFF) as u16,
            bank_count: (mapped_size >> 16) as u16,
        })
    }
}
