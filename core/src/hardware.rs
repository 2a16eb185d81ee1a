//! Cartridge save hardware.
//!
//! Save media larger than the address space is reached through 64 KiB
//! bank-switched windows: a port write selects the bank, then the window is
//! plain memory. [`read_into_banks`] and [`write_from_banks`] stream a card
//! file through those windows.

use std::io::{self, Read, Write};

use swanboot_shared::constants::BANK_WINDOW_SIZE;

/// A bank-switched cartridge window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Battery-backed SRAM
    Sram,
    /// ROM/flash area (PSRAM on the flash cartridge)
    Rom,
}

/// Save hardware mapped by the cartridge.
pub trait SaveHardware {
    /// Drive the flash write-enable line.
    ///
    /// Must be off while SRAM is accessed, otherwise SRAM writes land in flash.
    fn set_flash_write_enable(&mut self, enabled: bool);

    fn select_bank(&mut self, window: Window, bank: u16);

    /// The currently selected bank, exactly [`BANK_WINDOW_SIZE`] bytes long.
    fn window(&mut self, window: Window) -> &mut [u8];
}

fn window_span(offset: u64, remaining: u64) -> (u16, usize, usize) {
    let bank = (offset >> 16) as u16;
    let start = (offset & 0xFFFF) as usize;
    let len = remaining.min((BANK_WINDOW_SIZE - start) as u64) as usize;
    (bank, start, len)
}

/// Copy `len` bytes from `src` into the banked `window`, starting at linear `offset`.
pub fn read_into_banks<R, H>(
    src: &mut R,
    hw: &mut H,
    window: Window,
    offset: u64,
    len: u64,
) -> io::Result<()>
where
    R: Read + ?Sized,
    H: SaveHardware + ?Sized,
{
    let mut pos = offset;
    let end = offset + len;
    while pos < end {
        let (bank, start, chunk) = window_span(pos, end - pos);
        hw.select_bank(window, bank);
        src.read_exact(&mut hw.window(window)[start..start + chunk])?;
        pos += chunk as u64;
    }
    Ok(())
}

/// Copy `len` bytes out of the banked `window` into `dst`, starting at linear `offset`.
pub fn write_from_banks<W, H>(
    dst: &mut W,
    hw: &mut H,
    window: Window,
    offset: u64,
    len: u64,
) -> io::Result<()>
where
    W: Write + ?Sized,
    H: SaveHardware + ?Sized,
{
    let mut pos = offset;
    let end = offset + len;
    while pos < end {
        let (bank, start, chunk) = window_span(pos, end - pos);
        hw.select_bank(window, bank);
        dst.write_all(&hw.window(window)[start..start + chunk])?;
        pos += chunk as u64;
    }
    dst.flush()
}

/// Cartridge save hardware backed by host memory.
///
/// Bank numbers wrap around the backing size, the way the address decoder
/// mirrors small chips.
pub struct MemoryCartridge {
    sram: Vec<u8>,
    rom: Vec<u8>,
    sram_bank: u16,
    rom_bank: u16,
    flash_write_enabled: bool,
}

impl MemoryCartridge {
    /// Create a cartridge with the given SRAM and ROM sizes, rounded up to whole banks.
    pub fn new(sram_size: usize, rom_size: usize) -> Self {
        Self {
            sram: vec![0; bank_aligned(sram_size)],
            rom: vec![0xFF; bank_aligned(rom_size)],
            sram_bank: 0,
            rom_bank: 0,
            flash_write_enabled: true,
        }
    }

    pub fn sram(&self) -> &[u8] {
        &self.sram
    }

    pub fn sram_mut(&mut self) -> &mut [u8] {
        &mut self.sram
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn rom_mut(&mut self) -> &mut [u8] {
        &mut self.rom
    }

    pub fn flash_write_enabled(&self) -> bool {
        self.flash_write_enabled
    }

    /// Replace SRAM contents with a saved image, keeping the current size.
    pub fn load_sram(&mut self, image: &[u8]) {
        let len = image.len().min(self.sram.len());
        self.sram[..len].copy_from_slice(&image[..len]);
    }
}

fn bank_aligned(size: usize) -> usize {
    size.max(1).div_ceil(BANK_WINDOW_SIZE) * BANK_WINDOW_SIZE
}

impl SaveHardware for MemoryCartridge {
    fn set_flash_write_enable(&mut self, enabled: bool) {
        self.flash_write_enabled = enabled;
    }

    fn select_bank(&mut self, window: Window, bank: u16) {
        match window {
            Window::Sram => self.sram_bank = bank,
            Window::Rom => self.rom_bank = bank,
        }
    }

    fn window(&mut self, window: Window) -> &mut [u8] {
        let (memory, bank) = match window {
            Window::Sram => (&mut self.sram, self.sram_bank),
            Window::Rom => (&mut self.rom, self.rom_bank),
        };
        let banks = memory.len() / BANK_WINDOW_SIZE;
        let start = (bank as usize % banks) * BANK_WINDOW_SIZE;
        &mut memory[start..start + BANK_WINDOW_SIZE]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_into_banks_crosses_bank_boundaries() {
        let mut cart = MemoryCartridge::new(0x20000, 0x10000);
        let data: Vec<u8> = (0..0x100).map(|i| i as u8).collect();

        read_into_banks(&mut Cursor::new(&data), &mut cart, Window::Sram, 0xFF80, 0x100).unwrap();

        assert_eq!(&cart.sram()[0xFF80..0x10080], &data[..]);
        assert!(cart.sram()[..0xFF80].iter().all(|&b| b == 0));
    }

    #[test]
    fn write_from_banks_reads_selected_window() {
        let mut cart = MemoryCartridge::new(0x10000, 0x20000);
        cart.rom_mut()[0x10000..0x10004].copy_from_slice(b"WSWN");

        let mut out = Vec::new();
        write_from_banks(&mut out, &mut cart, Window::Rom, 0x10000, 4).unwrap();
        assert_eq!(out, b"WSWN");
    }

    #[test]
    fn short_source_fails_with_unexpected_eof() {
        let mut cart = MemoryCartridge::new(0x10000, 0x10000);
        let err = read_into_banks(&mut Cursor::new(vec![1u8; 10]), &mut cart, Window::Sram, 0, 20)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn banks_wrap_around_small_chips() {
        let mut cart = MemoryCartridge::new(0x2000, 0x10000);
        assert_eq!(cart.sram().len(), BANK_WINDOW_SIZE);
        cart.select_bank(Window::Sram, 3);
        cart.window(Window::Sram)[0] = 0x42;
        assert_eq!(cart.sram()[0], 0x42);
    }
}
