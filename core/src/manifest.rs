//! Save manifest codec.
//!
//! The manifest is a small INI file on the card listing the save regions a
//! restore put on the cartridge:
//!
//! ```text
//! [save]
//! sram=8192|/games/GAME.ram
//! flash=524288|/games/GAME.flash
//! ```
//!
//! Each value is `size|path`. Stored paths never contain `|` (FAT rejects it
//! in names), so splitting on the last delimiter is unambiguous.
//!
//! Reading is a forward-only pull parser over a caller-owned line buffer.

use std::io::{self, BufRead, Write};

use swanboot_shared::{EEPROM_SIZES, ELISA_FLASH_SIZE, SRAM_SIZES_KIB, SaveKind};

use crate::error::{LaunchError, Result};

/// Category holding the save entries.
pub const SAVE_CATEGORY: &str = "save";

/// Separator between the size and the path of a stored value.
pub const PATH_DELIMITER: char = '|';

/// One parsed manifest line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IniEvent<'a> {
    EndOfFile,
    Category(&'a str),
    KeyValue { key: &'a str, value: &'a str },
}

/// Pull parser over manifest text.
pub struct ManifestReader<R> {
    reader: R,
    path: String,
    line_number: usize,
}

impl<R: BufRead> ManifestReader<R> {
    /// `path` is only used in error messages.
    pub fn new(reader: R, path: impl Into<String>) -> Self {
        Self {
            reader,
            path: path.into(),
            line_number: 0,
        }
    }

    /// Line number of the last line read (1-based).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next event, reusing `line` as the line buffer.
    ///
    /// Blank lines and `;`/`#` comments are skipped.
    pub fn next<'a>(&mut self, line: &'a mut String) -> Result<IniEvent<'a>> {
        loop {
            line.clear();
            let read = match self.reader.read_line(line) {
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    return Err(self.malformed(self.line_number + 1, "line is not valid UTF-8"));
                }
                Err(e) => return Err(LaunchError::io(&self.path, e)),
            };
            if read == 0 {
                return Ok(IniEvent::EndOfFile);
            }
            self.line_number += 1;
            let trimmed = line.trim();
            if !trimmed.is_empty() && !trimmed.starts_with(';') && !trimmed.starts_with('#') {
                break;
            }
        }

        let line_number = self.line_number;
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or_else(|| self.malformed(line_number, "unterminated category header"))?;
            return Ok(IniEvent::Category(name.trim()));
        }

        let (key, value) = trimmed
            .split_once('=')
            .ok_or_else(|| self.malformed(line_number, "expected key=value"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(self.malformed(line_number, "empty key"));
        }
        Ok(IniEvent::KeyValue {
            key,
            value: value.trim(),
        })
    }

    fn malformed(&self, line: usize, reason: &'static str) -> LaunchError {
        LaunchError::MalformedManifest { line, reason }
    }
}

/// A save region recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveManifestEntry {
    pub kind: SaveKind,
    pub size: u32,
    /// Absolute card path of the save file
    pub path: String,
}

impl SaveManifestEntry {
    /// Parse a key/value pair. Unknown keys yield `Ok(None)`.
    pub fn parse(key: &str, value: &str, line: usize) -> Result<Option<Self>> {
        let Some(kind) = SaveKind::from_key(key) else {
            return Ok(None);
        };
        let (size, path) = value
            .rsplit_once(PATH_DELIMITER)
            .ok_or(LaunchError::MalformedManifest {
                line,
                reason: "missing size delimiter",
            })?;
        let size = size.trim().parse().map_err(|_| LaunchError::MalformedManifest {
            line,
            reason: "size is not a number",
        })?;
        if !is_capacity_of(kind, size) {
            return Err(LaunchError::MalformedManifest {
                line,
                reason: "size is not a capacity of this save kind",
            });
        }
        if path.is_empty() {
            return Err(LaunchError::MalformedManifest {
                line,
                reason: "empty save path",
            });
        }
        Ok(Some(Self {
            kind,
            size,
            path: path.to_string(),
        }))
    }
}

/// Backup copies `size` bytes out of the cartridge, so only sizes a footer
/// can declare are accepted.
fn is_capacity_of(kind: SaveKind, size: u32) -> bool {
    match kind {
        SaveKind::Sram => SRAM_SIZES_KIB.iter().any(|&kib| kib != 0 && kib as u32 * 1024 == size),
        SaveKind::Eeprom => EEPROM_SIZES.iter().any(|&bytes| bytes != 0 && bytes as u32 == size),
        SaveKind::Flash => size == ELISA_FLASH_SIZE,
    }
}

/// Write the `[save]` category header.
pub fn write_header<W: Write + ?Sized>(w: &mut W) -> io::Result<()> {
    writeln!(w, "[{SAVE_CATEGORY}]")
}

/// Append one `kind=size|cwdpath` line.
///
/// `cwd` and `path` are concatenated as-is; `cwd` is expected to end in `/`
/// (or be empty when `path` is already absolute).
pub fn write_entry<W: Write + ?Sized>(
    w: &mut W,
    kind: SaveKind,
    size: u32,
    cwd: &str,
    path: &str,
) -> Result<()> {
    for part in [cwd, path] {
        if part.contains(PATH_DELIMITER) || part.contains('\n') || part.contains('\r') {
            return Err(LaunchError::InvalidPath(format!("{cwd}{path}")));
        }
    }
    writeln!(w, "{}={}{}{}{}", kind.key(), size, PATH_DELIMITER, cwd, path)
        .map_err(|e| LaunchError::io(path, e))
}

/// Read every save entry listed under the `[save]` category.
///
/// Entries before any category header are accepted, entries under other
/// categories and unknown keys are ignored. Any malformed line aborts.
pub fn read_entries<R: BufRead>(reader: &mut ManifestReader<R>) -> Result<Vec<SaveManifestEntry>> {
    let mut line = String::new();
    let mut entries = Vec::new();
    let mut in_save_category = true;
    loop {
        match reader.next(&mut line)? {
            IniEvent::EndOfFile => return Ok(entries),
            IniEvent::Category(name) => {
                in_save_category = name.eq_ignore_ascii_case(SAVE_CATEGORY);
            }
            IniEvent::KeyValue { key, value } => {
                if !in_save_category {
                    tracing::debug!(key, "ignoring manifest key outside [save]");
                    continue;
                }
                if let Some(entry) = SaveManifestEntry::parse(key, value, reader.line_number())? {
                    entries.push(entry);
                }
            }
        }
    }
}
