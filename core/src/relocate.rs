//! Save relocation engine.
//!
//! Save media lives in two places: as plain files on the storage card and in
//! the cartridge's save hardware while a ROM runs. [`SaveRelocator::restore`]
//! moves card files onto the cartridge before a launch and records what it did
//! in the manifest; [`SaveRelocator::backup`] copies the hardware back to the
//! card afterwards and deletes the manifest.
//!
//! The manifest is the transaction marker: it exists exactly between a restore
//! and the backup that consumed it. A failed backup leaves it in place so the
//! whole backup can be retried.

use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};

use swanboot_shared::SaveKind;

use crate::buffer::ScratchBuffer;
use crate::config::{EepromPolicy, LauncherConfig};
use crate::error::{IoResultExt, LaunchError, Result};
use crate::fs::{CardFile, CardFs, OpenMode};
use crate::hardware::{SaveHardware, Window, read_into_banks, write_from_banks};
use crate::manifest::{self, ManifestReader, SaveManifestEntry};
use crate::metadata::RomMetadata;

/// Erased-state value of SRAM and EEPROM shadow files.
pub const ERASED_FILL: u8 = 0xFF;

/// Settings the relocator needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocatorOptions {
    pub manifest_path: String,
    pub chunk_size: usize,
    pub eeprom: EepromPolicy,
}

impl RelocatorOptions {
    /// Options from the launcher config, for a platform with or without extended memory.
    pub fn from_config(config: &LauncherConfig, extended_memory: bool) -> Self {
        Self {
            manifest_path: config.card.manifest_path.clone(),
            chunk_size: config.buffer.tier.chunk_size(extended_memory),
            eeprom: config.eeprom.policy,
        }
    }
}

impl Default for RelocatorOptions {
    fn default() -> Self {
        Self::from_config(&LauncherConfig::default(), true)
    }
}

/// Result of a restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// Path to boot: the `.flash` shadow for emulated-flash ROMs, else the ROM itself
    pub boot_path: String,
    /// Entries written to the manifest; empty if the ROM has no save media
    pub entries: Vec<SaveManifestEntry>,
}

/// Result of a backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// No manifest on the card
    NothingToBackUp,
    /// Every listed region was copied and the manifest deleted
    BackedUp(Vec<SaveManifestEntry>),
}

/// Save file path for `rom_path`: the extension of the final path component
/// is replaced (or, if there is none, the kind's extension is appended).
pub fn save_path(rom_path: &str, kind: SaveKind) -> String {
    let name_start = rom_path.rfind('/').map_or(0, |i| i + 1);
    let stem_end = rom_path[name_start..]
        .rfind('.')
        .map_or(rom_path.len(), |i| name_start + i);
    format!("{}{}", &rom_path[..stem_end], kind.extension())
}

/// Moves save data between card files and cartridge save hardware.
pub struct SaveRelocator<'a, F: CardFs, H: SaveHardware> {
    fs: &'a mut F,
    hw: &'a mut H,
    scratch: ScratchBuffer,
    options: RelocatorOptions,
}

impl<'a, F: CardFs, H: SaveHardware> SaveRelocator<'a, F, H> {
    pub fn new(fs: &'a mut F, hw: &'a mut H, options: RelocatorOptions) -> Self {
        Self {
            fs,
            hw,
            scratch: ScratchBuffer::new(options.chunk_size),
            options,
        }
    }

    /// The card this relocator works on.
    pub fn card(&mut self) -> &mut F {
        &mut *self.fs
    }

    /// Make sure `path` is at least `target_size` bytes long.
    ///
    /// A file that is already large enough is left untouched. Otherwise the
    /// missing bytes are copied from `source` (which must be exactly
    /// `target_size` bytes) or filled with `fill_byte`. The returned file is
    /// positioned at offset 0.
    pub fn preallocate(
        &mut self,
        path: &str,
        fill_byte: u8,
        target_size: u32,
        source: Option<&str>,
    ) -> Result<F::File> {
        let target = u64::from(target_size);
        let mut file = self.fs.open(path, OpenMode::ReadWriteAlways).at(path)?;
        let current = file.size().at(path)?;

        if current >= target {
            tracing::debug!(path, size = current, "save file already provisioned");
        } else {
            if let Err(e) = file.reserve_contiguous(target) {
                tracing::debug!(path, error = %e, "contiguous allocation hint failed");
            }
            match source {
                Some(source) => self.copy_from(source, &mut file, path, target)?,
                None => self.fill(&mut file, path, fill_byte, target)?,
            }
        }

        file.seek(SeekFrom::Start(0)).at(path)?;
        Ok(file)
    }

    fn copy_from(
        &mut self,
        source: &str,
        dst: &mut F::File,
        path: &str,
        target: u64,
    ) -> Result<()> {
        let mut src = self.fs.open(source, OpenMode::ReadExisting).at(source)?;
        let source_size = src.size().at(source)?;
        if source_size != target {
            return Err(LaunchError::SizeMismatch {
                path: source.to_string(),
                expected: target,
                actual: source_size,
            });
        }

        tracing::debug!(from = source, to = path, size = target, "copying save image");
        let buffer = self.scratch.as_mut_slice();
        let mut copied = 0u64;
        while copied < target {
            let chunk = (target - copied).min(buffer.len() as u64) as usize;
            src.read_exact(&mut buffer[..chunk]).at(source)?;
            dst.write_all(&buffer[..chunk]).at(path)?;
            copied += chunk as u64;
        }
        dst.flush().at(path)
    }

    fn fill(&mut self, file: &mut F::File, path: &str, fill_byte: u8, target: u64) -> Result<()> {
        let mut pos = file.seek(SeekFrom::End(0)).at(path)?;
        tracing::debug!(path, from = pos, to = target, fill = fill_byte, "filling save file");
        let buffer = self.scratch.filled(fill_byte);
        while pos < target {
            let chunk = (target - pos).min(buffer.len() as u64) as usize;
            file.write_all(&buffer[..chunk]).at(path)?;
            pos += chunk as u64;
        }
        file.flush().at(path)
    }

    /// Put the save media of `rom_path` onto the cartridge and write a fresh manifest.
    pub fn restore(&mut self, rom_path: &str, metadata: &RomMetadata) -> Result<RestoreOutcome> {
        if !metadata.has_save_data() {
            return Ok(RestoreOutcome {
                boot_path: rom_path.to_string(),
                entries: Vec::new(),
            });
        }
        if metadata.eeprom_size != 0 && self.options.eeprom == EepromPolicy::Reject {
            return Err(LaunchError::Unsupported(SaveKind::Eeprom));
        }

        tracing::info!(rom = rom_path, "Card -> Save");
        let mut boot_path = rom_path.to_string();

        if metadata.sram_size != 0 {
            let path = save_path(rom_path, SaveKind::Sram);
            let mut file = self.preallocate(&path, ERASED_FILL, metadata.sram_size, None)?;
            self.hw.set_flash_write_enable(false);
            read_into_banks(&mut file, self.hw, Window::Sram, 0, u64::from(metadata.sram_size))
                .at(&path)?;
        }

        if metadata.eeprom_size != 0 {
            let path = save_path(rom_path, SaveKind::Eeprom);
            self.preallocate(&path, ERASED_FILL, metadata.eeprom_size, None)?;
            self.eeprom_transfer(&path)?;
        }

        if metadata.flash_size != 0 {
            let path = save_path(rom_path, SaveKind::Flash);
            self.preallocate(&path, ERASED_FILL, metadata.flash_size, Some(rom_path))?;
            // Execution proceeds from the relocated flash shadow.
            boot_path = path;
        }

        let entries = self.write_manifest(rom_path, metadata)?;
        Ok(RestoreOutcome { boot_path, entries })
    }

    fn write_manifest(
        &mut self,
        rom_path: &str,
        metadata: &RomMetadata,
    ) -> Result<Vec<SaveManifestEntry>> {
        let mut cwd = self.fs.cwd().at(".")?;
        if !cwd.ends_with('/') {
            cwd.push('/');
        }

        let manifest_path = self.options.manifest_path.clone();
        let file = self
            .fs
            .open(&manifest_path, OpenMode::CreateAlways)
            .at(&manifest_path)?;
        let mut out = BufWriter::new(file);
        manifest::write_header(&mut out).at(&manifest_path)?;

        let mut entries = Vec::new();
        for kind in SaveKind::ALL {
            let size = metadata.size_of(kind);
            if size == 0 {
                continue;
            }
            let path = save_path(rom_path, kind);
            let prefix = if path.starts_with('/') { "" } else { cwd.as_str() };
            manifest::write_entry(&mut out, kind, size, prefix, &path)?;
            entries.push(SaveManifestEntry {
                kind,
                size,
                path: format!("{prefix}{path}"),
            });
        }

        out.flush().at(&manifest_path)?;
        tracing::debug!(manifest = %manifest_path, entries = entries.len(), "wrote save manifest");
        Ok(entries)
    }

    /// Copy every region listed in the manifest back to the card, then delete the manifest.
    pub fn backup(&mut self) -> Result<BackupOutcome> {
        let manifest_path = self.options.manifest_path.clone();
        let file = match self.fs.open(&manifest_path, OpenMode::ReadExisting) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(manifest = %manifest_path, "no save manifest, nothing to back up");
                return Ok(BackupOutcome::NothingToBackUp);
            }
            Err(e) => return Err(LaunchError::io(&manifest_path, e)),
        };

        // The whole manifest is parsed before any copy, so a corrupt line
        // never leaves half of the regions backed up.
        let entries = manifest::read_entries(&mut ManifestReader::new(
            BufReader::new(file),
            manifest_path.as_str(),
        ))?;
        if self.options.eeprom == EepromPolicy::Reject
            && entries.iter().any(|e| e.kind == SaveKind::Eeprom)
        {
            return Err(LaunchError::Unsupported(SaveKind::Eeprom));
        }

        tracing::info!(regions = entries.len(), "Save -> Card");
        for entry in &entries {
            self.backup_entry(entry)?;
        }

        self.fs.unlink(&manifest_path).at(&manifest_path)?;
        Ok(BackupOutcome::BackedUp(entries))
    }

    fn backup_entry(&mut self, entry: &SaveManifestEntry) -> Result<()> {
        let path = entry.path.as_str();
        let mut file = self.fs.open(path, OpenMode::WriteExisting).at(path)?;
        let len = u64::from(entry.size);
        match entry.kind {
            SaveKind::Sram => {
                self.hw.set_flash_write_enable(false);
                write_from_banks(&mut file, self.hw, Window::Sram, 0, len).at(path)
            }
            SaveKind::Flash => write_from_banks(&mut file, self.hw, Window::Rom, 0, len).at(path),
            SaveKind::Eeprom => self.eeprom_transfer(path),
        }
    }

    /// EEPROM has no hardware copy path in either direction yet.
    fn eeprom_transfer(&mut self, path: &str) -> Result<()> {
        match self.options.eeprom {
            EepromPolicy::Skip => {
                tracing::warn!(path, "EEPROM save transfer is not implemented, skipping");
                Ok(())
            }
            EepromPolicy::Reject => Err(LaunchError::Unsupported(SaveKind::Eeprom)),
        }
    }
}
