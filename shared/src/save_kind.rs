//! Save media kinds and their on-card spellings.

use std::fmt;

/// A kind of non-volatile save media a cartridge can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveKind {
    Sram,
    Eeprom,
    Flash,
}

impl SaveKind {
    /// All kinds, in the order they are restored and listed in the manifest.
    pub const ALL: [SaveKind; 3] = [SaveKind::Sram, SaveKind::Eeprom, SaveKind::Flash];

    /// Manifest key for this kind.
    pub const fn key(self) -> &'static str {
        match self {
            SaveKind::Sram => "sram",
            SaveKind::Eeprom => "eeprom",
            SaveKind::Flash => "flash",
        }
    }

    /// Save file extension, including the dot (ares naming convention).
    pub const fn extension(self) -> &'static str {
        match self {
            SaveKind::Sram => ".ram",
            SaveKind::Eeprom => ".eeprom",
            SaveKind::Flash => ".flash",
        }
    }

    /// Look up a kind by manifest key, ignoring ASCII case.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for SaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
