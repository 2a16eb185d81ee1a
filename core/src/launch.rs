//! The full launch sequence run when a ROM is picked from the menu.

use crate::boot::{self, BootPlatform, Bootstub};
use crate::error::Result;
use crate::fs::CardFs;
use crate::hardware::SaveHardware;
use crate::metadata;
use crate::relocate::{BackupOutcome, RelocatorOptions, SaveRelocator};

/// Back up any pending save, relocate the saves of `rom_path` and boot it.
///
/// A failed backup aborts the launch: restoring over the cartridge would
/// destroy the unsaved data of the previous game.
pub fn launch_rom<F, H, P>(
    fs: &mut F,
    hw: &mut H,
    platform: &mut P,
    stub: &Bootstub<'_>,
    options: RelocatorOptions,
    rom_path: &str,
) -> Result<P::Transfer>
where
    F: CardFs,
    H: SaveHardware,
    P: BootPlatform,
{
    let (metadata, outcome) = {
        let mut relocator = SaveRelocator::new(&mut *fs, &mut *hw, options);
        if let BackupOutcome::BackedUp(entries) = relocator.backup()? {
            tracing::info!(regions = entries.len(), "saved previous session");
        }
        let metadata = metadata::extract(relocator.card(), rom_path)?;
        let outcome = relocator.restore(rom_path, &metadata)?;
        (metadata, outcome)
    };

    boot::launch(fs, platform, stub, &outcome.boot_path, Some(&metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MemoryCartridge;
    use crate::test_utils::{PlatformEvent, RecordingPlatform, RomImage, card_in_tempdir};
    use std::fs;

    const STUB: &[u8] = &[0xEA, 0x00, 0x00, 0x00, 0x00];

    #[test]
    fn previous_session_is_saved_before_next_restore() {
        let (dir, mut card) = card_in_tempdir();
        fs::write(dir.path().join("OLD.ram"), vec![0u8; 8192]).unwrap();
        fs::write(dir.path().join("NILESWAN/SAVE.INI"), "[save]\nsram=8192|/OLD.ram\n").unwrap();
        fs::write(dir.path().join("NEW.WS"), RomImage::with_save_type(0x20000, 0x02).to_bytes())
            .unwrap();

        let mut cart = MemoryCartridge::new(0x10000, 0x10000);
        cart.sram_mut()[..8].copy_from_slice(b"OLD SAVE");
        let mut platform = RecordingPlatform::color();

        let handoff = launch_rom(
            &mut card,
            &mut cart,
            &mut platform,
            &Bootstub::new(STUB, &[]),
            RelocatorOptions::default(),
            "/NEW.WS",
        )
        .unwrap();

        assert_eq!(&fs::read(dir.path().join("OLD.ram")).unwrap()[..8], b"OLD SAVE");
        assert_eq!(
            fs::read_to_string(dir.path().join("NILESWAN/SAVE.INI")).unwrap(),
            "[save]\nsram=32768|/NEW.ram\n"
        );
        assert!(cart.sram()[..32768].iter().all(|&b| b == 0xFF));
        assert_eq!(handoff.block.prog_size, 0x20000);
        assert_eq!(handoff.block.prog_sram_mask, 0);
        assert_eq!(platform.events.last(), Some(&PlatformEvent::Transfer));
    }

    #[test]
    fn flash_rom_boots_from_shadow_file() {
        let (dir, mut card) = card_in_tempdir();
        fs::write(dir.path().join("GAME.WS"), RomImage::elisa_flash().to_bytes()).unwrap();
        let mut cart = MemoryCartridge::new(0x40000, 0x80000);
        let mut platform = RecordingPlatform::monochrome();

        let handoff = launch_rom(
            &mut card,
            &mut cart,
            &mut platform,
            &Bootstub::new(STUB, &[]),
            RelocatorOptions::default(),
            "/GAME.WS",
        )
        .unwrap();

        let shadow = card.stat("/GAME.flash").unwrap();
        assert_eq!(handoff.block.prog_cluster, shadow.first_cluster);
        assert_eq!(handoff.block.prog_size, 0x80000);
        assert_eq!(handoff.block.prog_sram_mask, 4);
    }

    #[test]
    fn failed_backup_aborts_launch() {
        let (dir, mut card) = card_in_tempdir();
        fs::write(dir.path().join("NILESWAN/SAVE.INI"), "[save]\nsram=8192|/GONE.ram\n").unwrap();
        fs::write(dir.path().join("NEW.WS"), RomImage::with_save_type(0x10000, 0x01).to_bytes())
            .unwrap();
        let mut cart = MemoryCartridge::new(0x10000, 0x10000);
        let mut platform = RecordingPlatform::color();

        let err = launch_rom(
            &mut card,
            &mut cart,
            &mut platform,
            &Bootstub::new(STUB, &[]),
            RelocatorOptions::default(),
            "/NEW.WS",
        )
        .unwrap_err();

        assert!(err.is_not_found());
        assert!(!dir.path().join("NEW.ram").exists());
        assert!(platform.events.is_empty());
    }
}
