//! Bootstub handoff.
//!
//! The last thing the launcher does: describe the filesystem and the program
//! file in a [`HandoffBlock`], shut the machine up, and jump into the resident
//! second-stage loader, which maps the program into the ROM banks on its own.
//!
//! Every check that can fail happens before interrupts are disabled. Past
//! that point there is no way to report anything, so [`launch`] only calls
//! infallible platform primitives.

use swanboot_shared::constants::{
    BOOTSTUB_LOAD_ADDRESS, BOOTSTUB_TILES_ADDRESS, DEFAULT_SRAM_MASK, MAX_ROM_SIZE,
    max_bootstub_size,
};
use swanboot_shared::{FarPointer, HandoffBlock, RomBankLayout};

use crate::error::{IoResultExt, LaunchError, Result};
use crate::fs::{CardFs, FileInfo, FsGeometry};
use crate::metadata::RomMetadata;

/// Entry point of the copied bootstub.
pub const BOOTSTUB_ENTRY: FarPointer = FarPointer::new(0x0000, BOOTSTUB_LOAD_ADDRESS);

/// Machine primitives used by the handoff.
///
/// On hardware `Transfer` is [`std::convert::Infallible`]: the jump never
/// comes back. Test and dry-run platforms return a record of the handoff.
pub trait BootPlatform {
    type Transfer;

    fn blank_display(&mut self);

    /// Block until the next vertical blank (see [`crate::vblank::VblankCounter`]).
    fn wait_for_vblank(&mut self);

    fn disable_interrupts(&mut self);

    /// Whether the console supports the enhanced color mode.
    fn color_supported(&self) -> bool;

    fn enable_color_mode(&mut self);

    /// One-shot LZ decompression of `packed` into VRAM at `address`.
    fn decompress_to_vram(&mut self, address: u16, packed: &[u8]);

    /// Copy `code` to `load_address`, publish `block` and jump to `entry`.
    fn transfer(
        &mut self,
        code: &[u8],
        load_address: u16,
        entry: FarPointer,
        block: &HandoffBlock,
    ) -> Self::Transfer;
}

/// The resident second-stage loader and its assets.
#[derive(Debug, Clone, Copy)]
pub struct Bootstub<'a> {
    pub code: &'a [u8],
    /// Packed tile graphic shown by the bootstub
    pub tiles: &'a [u8],
    /// Bank mask handed over when no ROM metadata is available
    pub default_sram_mask: u8,
}

impl<'a> Bootstub<'a> {
    pub fn new(code: &'a [u8], tiles: &'a [u8]) -> Self {
        Self {
            code,
            tiles,
            default_sram_mask: DEFAULT_SRAM_MASK,
        }
    }

    pub fn with_default_sram_mask(mut self, mask: u8) -> Self {
        self.default_sram_mask = mask;
        self
    }
}

/// Build the handoff block for a program file.
pub fn handoff_block(
    geometry: &FsGeometry,
    program: &FileInfo,
    metadata: Option<&RomMetadata>,
    default_sram_mask: u8,
) -> Result<HandoffBlock> {
    let prog_size = u32::try_from(program.size).map_err(|_| LaunchError::Internal("program size"))?;
    Ok(HandoffBlock {
        fs_type: geometry.fs_type,
        cluster_size: geometry.cluster_size,
        data_base: geometry.data_base,
        cluster_table_base: geometry.fat_base,
        fat_entry_count: geometry.fat_entry_count,
        prog_cluster: program.first_cluster,
        prog_size,
        prog_sram_mask: metadata.map_or(default_sram_mask, RomMetadata::sram_bank_mask),
    })
}

/// Boot the program at `path` through the bootstub.
///
/// Returns only on error (or with the platform's transfer record on
/// non-hardware platforms).
pub fn launch<F, P>(
    fs: &mut F,
    platform: &mut P,
    stub: &Bootstub<'_>,
    path: &str,
    metadata: Option<&RomMetadata>,
) -> Result<P::Transfer>
where
    F: CardFs + ?Sized,
    P: BootPlatform + ?Sized,
{
    let program = fs.stat(path).at(path)?;
    if RomBankLayout::for_size(program.size).is_none() {
        return Err(LaunchError::SizeMismatch {
            path: path.to_string(),
            expected: MAX_ROM_SIZE,
            actual: program.size,
        });
    }
    if stub.code.is_empty() {
        return Err(LaunchError::Internal("empty bootstub image"));
    }
    if stub.code.len() > max_bootstub_size() {
        return Err(LaunchError::SizeMismatch {
            path: "bootstub".to_string(),
            expected: max_bootstub_size() as u64,
            actual: stub.code.len() as u64,
        });
    }
    let block = handoff_block(&fs.geometry(), &program, metadata, stub.default_sram_mask)?;

    tracing::info!(
        path,
        cluster = block.prog_cluster,
        size = block.prog_size,
        sram_mask = block.prog_sram_mask,
        "handing off to bootstub"
    );

    // The display only goes dark at the end of the current frame.
    platform.blank_display();
    platform.wait_for_vblank();
    platform.disable_interrupts();

    if platform.color_supported() {
        platform.enable_color_mode();
    }
    platform.decompress_to_vram(BOOTSTUB_TILES_ADDRESS, stub.tiles);

    Ok(platform.transfer(stub.code, BOOTSTUB_LOAD_ADDRESS, BOOTSTUB_ENTRY, &block))
}
