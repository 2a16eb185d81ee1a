//! Configuration management (`swanboot.toml`)
//!
//! Handles loading, saving, and providing defaults for launcher settings.
//! Settings are stored in TOML format in the platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use swanboot_shared::constants::DEFAULT_SRAM_MASK;

use crate::buffer::BufferTier;
use crate::fs::FsGeometry;

const CONFIG_FILE: &str = "swanboot.toml";

/// Launcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LauncherConfig {
    /// Storage card settings
    #[serde(default)]
    pub card: CardConfig,
    /// Scratch buffer sizing
    #[serde(default)]
    pub buffer: BufferConfig,
    /// EEPROM handling
    #[serde(default)]
    pub eeprom: EepromConfig,
    /// Bootstub settings
    #[serde(default)]
    pub boot: BootConfig,
}

/// Storage card configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    /// Card path of the save manifest (default: /NILESWAN/SAVE.INI)
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
    /// Geometry reported by host card directories
    #[serde(default)]
    pub geometry: FsGeometry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BufferConfig {
    #[serde(default)]
    pub tier: BufferTier,
}

/// What to do with EEPROM save regions, which have no hardware copy path yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EepromPolicy {
    /// Keep the save file and manifest entry, log a warning, copy nothing
    #[default]
    Skip,
    /// Fail with `LaunchError::Unsupported`
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EepromConfig {
    #[serde(default)]
    pub policy: EepromPolicy,
}

/// Bootstub configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootConfig {
    /// SRAM bank mask used when booting without save metadata (default: 7)
    #[serde(default = "default_sram_mask")]
    pub default_sram_mask: u8,
    /// Bootstub program image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stub_path: Option<PathBuf>,
    /// LZSA2-packed bootstub tiles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles_path: Option<PathBuf>,
}

fn default_manifest_path() -> String {
    "/NILESWAN/SAVE.INI".to_string()
}

fn default_sram_mask() -> u8 {
    DEFAULT_SRAM_MASK
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            geometry: FsGeometry::default(),
        }
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            default_sram_mask: default_sram_mask(),
            stub_path: None,
            tiles_path: None,
        }
    }
}

/// Returns the platform-specific configuration directory.
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.swanboot", "", "swanboot")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from disk.
///
/// Reads `swanboot.toml` from the platform's configuration directory.
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> LauncherConfig {
    config_dir()
        .and_then(|dir| std::fs::read_to_string(dir.join(CONFIG_FILE)).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Loads the configuration from an explicit file, reporting errors.
pub fn load_from(path: &Path) -> std::io::Result<LauncherConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
}
