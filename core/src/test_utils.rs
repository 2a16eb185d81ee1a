//! Shared test utilities for unit tests

use tempfile::TempDir;

use swanboot_shared::rom_format::{
    ELISA_FLASH_SIZE, ELISA_MAPPER, ELISA_SAVE_TYPE, ELISA_SIGNATURE, ELISA_SIGNATURE_OFFSET,
    RomFooter,
};
use swanboot_shared::{FarPointer, HandoffBlock};

use crate::boot::BootPlatform;
use crate::fs::HostCard;

// ============================================================================
// Card fixtures
// ============================================================================

/// A card mounted from a fresh temporary directory, with `/NILESWAN` present.
pub fn card_in_tempdir() -> (TempDir, HostCard) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("NILESWAN")).unwrap();
    let card = HostCard::new(dir.path());
    (dir, card)
}

/// Builder for ROM images with a chosen footer.
#[derive(Debug, Clone)]
pub struct RomImage {
    pub size: usize,
    /// Place the `ELISA` signature at its fixed offset
    pub signature: bool,
    pub footer: RomFooter,
}

impl RomImage {
    pub fn with_save_type(size: usize, save_type: u8) -> Self {
        Self {
            size,
            signature: false,
            footer: RomFooter {
                jump_opcode: 0xEA,
                publisher_id: 0x01,
                game_id: 0x42,
                save_type,
                ..Default::default()
            },
        }
    }

    /// An image every emulated-flash check accepts.
    pub fn elisa_flash() -> Self {
        Self {
            size: ELISA_FLASH_SIZE as usize,
            signature: true,
            footer: RomFooter {
                jump_opcode: 0xEA,
                save_type: ELISA_SAVE_TYPE,
                mapper: ELISA_MAPPER,
                ..Default::default()
            },
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.size];
        let sig_start = ELISA_SIGNATURE_OFFSET as usize;
        if self.signature && self.size >= sig_start + ELISA_SIGNATURE.len() {
            bytes[sig_start..sig_start + ELISA_SIGNATURE.len()].copy_from_slice(ELISA_SIGNATURE);
        }
        let footer = self.footer.to_bytes();
        let footer_start = self.size.saturating_sub(footer.len());
        let len = self.size - footer_start;
        bytes[footer_start..].copy_from_slice(&footer[footer.len() - len..]);
        bytes
    }
}

// ============================================================================
// Recording boot platform
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    BlankDisplay,
    WaitForVblank,
    DisableInterrupts,
    EnableColor,
    Decompress(u16, Vec<u8>),
    Transfer,
}

/// What a [`RecordingPlatform`] was asked to jump into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRecord {
    pub code: Vec<u8>,
    pub load_address: u16,
    pub entry: FarPointer,
    pub block: HandoffBlock,
}

/// Boot platform that logs every primitive instead of touching hardware.
pub struct RecordingPlatform {
    pub color: bool,
    pub events: Vec<PlatformEvent>,
}

impl RecordingPlatform {
    pub fn color() -> Self {
        Self {
            color: true,
            events: Vec::new(),
        }
    }

    pub fn monochrome() -> Self {
        Self {
            color: false,
            events: Vec::new(),
        }
    }
}

impl BootPlatform for RecordingPlatform {
    type Transfer = HandoffRecord;

    fn blank_display(&mut self) {
        self.events.push(PlatformEvent::BlankDisplay);
    }

    fn wait_for_vblank(&mut self) {
        self.events.push(PlatformEvent::WaitForVblank);
    }

    fn disable_interrupts(&mut self) {
        self.events.push(PlatformEvent::DisableInterrupts);
    }

    fn color_supported(&self) -> bool {
        self.color
    }

    fn enable_color_mode(&mut self) {
        self.events.push(PlatformEvent::EnableColor);
    }

    fn decompress_to_vram(&mut self, address: u16, packed: &[u8]) {
        self.events
            .push(PlatformEvent::Decompress(address, packed.to_vec()));
    }

    fn transfer(
        &mut self,
        code: &[u8],
        load_address: u16,
        entry: FarPointer,
        block: &HandoffBlock,
    ) -> HandoffRecord {
        self.events.push(PlatformEvent::Transfer);
        HandoffRecord {
            code: code.to_vec(),
            load_address,
            entry,
            block: *block,
        }
    }
}
