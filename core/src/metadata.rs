//! ROM metadata extraction.
//!
//! Reads the trailing footer of a ROM image and derives the save media the
//! cartridge expects. Pure read; the card is never modified.

use std::io::{self, Read, Seek, SeekFrom};

use swanboot_shared::rom_format::{
    ELISA_FLASH_SIZE, ELISA_SIGNATURE, ELISA_SIGNATURE_OFFSET, FOOTER_SIZE, RomFooter,
    eeprom_capacity, sram_capacity,
};
use swanboot_shared::SaveKind;

use crate::error::{IoResultExt, LaunchError, Result};
use crate::fs::{CardFile, CardFs, OpenMode};

/// Save media requirements of one ROM image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomMetadata {
    pub footer: RomFooter,
    /// SRAM size in bytes, 0 if none
    pub sram_size: u32,
    /// EEPROM size in bytes, 0 if none
    pub eeprom_size: u32,
    /// Emulated flash size in bytes; 0 or the full image size
    pub flash_size: u32,
}

impl RomMetadata {
    /// Derive sizes from a footer.
    ///
    /// `elisa_signature` is whether the image is exactly [`ELISA_FLASH_SIZE`]
    /// bytes long and carries the `ELISA` signature.
    pub fn from_footer(footer: RomFooter, elisa_signature: bool) -> Self {
        let flash_size = if elisa_signature && footer.matches_elisa_flash() {
            ELISA_FLASH_SIZE
        } else {
            0
        };
        Self {
            footer,
            sram_size: sram_capacity(footer.save_type).map_or(0, |s| s.get()),
            eeprom_size: eeprom_capacity(footer.save_type).map_or(0, |s| s.get()),
            flash_size,
        }
    }

    pub fn size_of(&self, kind: SaveKind) -> u32 {
        match kind {
            SaveKind::Sram => self.sram_size,
            SaveKind::Eeprom => self.eeprom_size,
            SaveKind::Flash => self.flash_size,
        }
    }

    pub fn has_save_data(&self) -> bool {
        SaveKind::ALL.into_iter().any(|kind| self.size_of(kind) != 0)
    }

    /// SRAM bank mask handed to the bootstub.
    pub fn sram_bank_mask(&self) -> u8 {
        (self.sram_size >> 16) as u8
    }
}

/// Read the metadata of the ROM image at `path`.
pub fn extract<F: CardFs + ?Sized>(fs: &mut F, path: &str) -> Result<RomMetadata> {
    let mut file = fs.open(path, OpenMode::ReadExisting).at(path)?;
    let size = file.size().at(path)?;

    let elisa_signature = if size == u64::from(ELISA_FLASH_SIZE) {
        file.seek(SeekFrom::Start(ELISA_SIGNATURE_OFFSET)).at(path)?;
        let mut tmp = [0u8; ELISA_SIGNATURE.len()];
        file.read_exact(&mut tmp).at(path)?;
        &tmp == ELISA_SIGNATURE
    } else {
        false
    };

    let truncated = |actual: u64| LaunchError::Truncated {
        path: path.to_string(),
        expected: FOOTER_SIZE as u64,
        actual,
    };
    if size < FOOTER_SIZE as u64 {
        return Err(truncated(size));
    }

    file.seek(SeekFrom::End(-(FOOTER_SIZE as i64))).at(path)?;
    let mut bytes = [0u8; FOOTER_SIZE];
    let mut filled = 0;
    while filled < FOOTER_SIZE {
        match file.read(&mut bytes[filled..]) {
            Ok(0) => return Err(truncated(filled as u64)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(LaunchError::io(path, e)),
        }
    }
    let footer = RomFooter::from_bytes(&bytes).ok_or(LaunchError::Internal("footer decode"))?;

    let metadata = RomMetadata::from_footer(footer, elisa_signature);
    tracing::debug!(
        path,
        save_type = metadata.footer.save_type,
        sram = metadata.sram_size,
        eeprom = metadata.eeprom_size,
        flash = metadata.flash_size,
        "read ROM metadata"
    );
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RomImage, card_in_tempdir};
    use std::fs;

    fn elisa_rom() -> RomImage {
        RomImage::elisa_flash()
    }

    fn extract_image(image: &RomImage) -> Result<RomMetadata> {
        let (dir, mut card) = card_in_tempdir();
        fs::write(dir.path().join("GAME.WS"), image.to_bytes()).unwrap();
        extract(&mut card, "/GAME.WS")
    }

    #[test]
    fn sram_and_eeprom_sizes_follow_save_type() {
        let meta = extract_image(&RomImage::with_save_type(0x0010_0000, 0x12)).unwrap();
        assert_eq!(meta.sram_size, 32 * 1024);
        assert_eq!(meta.eeprom_size, 128);
        assert_eq!(meta.flash_size, 0);
        assert!(meta.has_save_data());
    }

    #[test]
    fn no_save_media_for_zero_save_type() {
        let meta = extract_image(&RomImage::with_save_type(0x0002_0000, 0x00)).unwrap();
        assert_eq!((meta.sram_size, meta.eeprom_size, meta.flash_size), (0, 0, 0));
        assert!(!meta.has_save_data());
    }

    #[test]
    fn elisa_flash_image_is_detected() {
        let meta = extract_image(&elisa_rom()).unwrap();
        assert_eq!(meta.flash_size, ELISA_FLASH_SIZE);
        // The SRAM nibble is still reported from the table.
        assert_eq!(meta.sram_size, 256 * 1024);
    }

    #[test]
    fn elisa_detection_fails_when_any_single_condition_is_off() {
        let mut wrong_size = elisa_rom();
        wrong_size.size = ELISA_FLASH_SIZE as usize * 2;
        let mut no_signature = elisa_rom();
        no_signature.signature = false;
        let mut publisher = elisa_rom();
        publisher.footer.publisher_id = 0x01;
        let mut game = elisa_rom();
        game.footer.game_id = 0x01;
        let mut save_type = elisa_rom();
        save_type.footer.save_type = 0x03;
        let mut mapper = elisa_rom();
        mapper.footer.mapper = 0x00;

        for image in [wrong_size, no_signature, publisher, game, save_type, mapper] {
            let meta = extract_image(&image).unwrap();
            assert_eq!(meta.flash_size, 0, "{image:?}");
        }
    }

    #[test]
    fn signature_at_other_offset_is_ignored() {
        let mut image = elisa_rom();
        image.signature = false;
        let mut bytes = image.to_bytes();
        bytes[0x70001..0x70006].copy_from_slice(ELISA_SIGNATURE);
        let (dir, mut card) = card_in_tempdir();
        fs::write(dir.path().join("GAME.WS"), bytes).unwrap();
        assert_eq!(extract(&mut card, "/GAME.WS").unwrap().flash_size, 0);
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_dir, mut card) = card_in_tempdir();
        let err = extract(&mut card, "/NOPE.WS").unwrap_err();
        assert!(err.is_not_found(), "{err}");
    }

    #[test]
    fn files_shorter_than_footer_are_truncated() {
        let (dir, mut card) = card_in_tempdir();
        fs::write(dir.path().join("TINY.WS"), [0xEAu8; 10]).unwrap();
        match extract(&mut card, "/TINY.WS") {
            Err(LaunchError::Truncated { expected, actual, .. }) => {
                assert_eq!((expected, actual), (16, 10));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn bank_mask_is_sram_size_in_banks() {
        let meta = RomMetadata::from_footer(
            RomFooter {
                save_type: 0x04,
                ..Default::default()
            },
            false,
        );
        assert_eq!(meta.sram_bank_mask(), 4);
        let none = RomMetadata::from_footer(RomFooter::default(), false);
        assert_eq!(none.sram_bank_mask(), 0);
    }
}
