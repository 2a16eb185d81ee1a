//! Card directory, configuration and cartridge state shared by all commands.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use swanboot_core::config::{self, LauncherConfig};
use swanboot_core::{HostCard, MemoryCartridge};

/// SRAM chip size of the flash cartridge.
pub const CART_SRAM_SIZE: usize = 512 * 1024;

/// PSRAM area backing emulated flash images.
pub const CART_PSRAM_SIZE: usize = 512 * 1024;

/// Global options selecting the card and the cartridge state files
#[derive(Args)]
pub struct CardArgs {
    /// Host directory holding the storage card contents
    #[arg(short, long, global = true, default_value = ".")]
    pub card: PathBuf,

    /// Working directory on the card (relative ROM paths resolve against it)
    #[arg(long, global = true, default_value = "/")]
    pub cwd: String,

    /// Config file (defaults to swanboot.toml in the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Host file holding the cartridge SRAM between runs
    #[arg(long, global = true)]
    pub sram: Option<PathBuf>,

    /// Host file holding the cartridge PSRAM (emulated flash) between runs
    #[arg(long, global = true)]
    pub psram: Option<PathBuf>,

    /// Pretend to run on a monochrome unit (small scratch buffer, no color mode)
    #[arg(long, global = true)]
    pub mono: bool,
}

impl CardArgs {
    pub fn load_config(&self) -> Result<LauncherConfig> {
        match &self.config {
            Some(path) => config::load_from(path)
                .with_context(|| format!("Failed to load config: {}", path.display())),
            None => Ok(config::load()),
        }
    }

    /// Mount the card directory with the configured geometry.
    pub fn mount(&self, config: &LauncherConfig) -> Result<HostCard> {
        if !self.card.is_dir() {
            anyhow::bail!("Card directory not found: {}", self.card.display());
        }
        let mut card = HostCard::new(&self.card).with_geometry(config.card.geometry);
        card.set_cwd(&self.cwd)
            .with_context(|| format!("Failed to change card directory to {}", self.cwd))?;
        Ok(card)
    }

    /// Cartridge with SRAM and PSRAM loaded from their state files, if any.
    pub fn load_cartridge(&self) -> Result<MemoryCartridge> {
        let mut cart = MemoryCartridge::new(CART_SRAM_SIZE, CART_PSRAM_SIZE);
        if let Some(image) = read_state(self.sram.as_deref())? {
            cart.load_sram(&image);
        }
        if let Some(image) = read_state(self.psram.as_deref())? {
            let len = image.len().min(cart.rom().len());
            cart.rom_mut()[..len].copy_from_slice(&image[..len]);
        }
        Ok(cart)
    }

    /// Write SRAM and PSRAM back to their state files.
    pub fn store_cartridge(&self, cart: &MemoryCartridge) -> Result<()> {
        if let Some(path) = &self.sram {
            std::fs::write(path, cart.sram())
                .with_context(|| format!("Failed to write SRAM state: {}", path.display()))?;
        }
        if let Some(path) = &self.psram {
            std::fs::write(path, cart.rom())
                .with_context(|| format!("Failed to write PSRAM state: {}", path.display()))?;
        }
        Ok(())
    }
}

fn read_state(path: Option<&Path>) -> Result<Option<Vec<u8>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        // First run: start from a blank cartridge.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e)
            .with_context(|| format!("Failed to read cartridge state: {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(card: &Path) -> CardArgs {
        CardArgs {
            card: card.to_path_buf(),
            cwd: "/".to_string(),
            config: None,
            sram: None,
            psram: None,
            mono: false,
        }
    }

    #[test]
    fn cartridge_state_survives_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut card_args = args(dir.path());
        card_args.sram = Some(dir.path().join("cart.sram"));

        let mut cart = card_args.load_cartridge().unwrap();
        assert!(cart.sram().iter().all(|&b| b == 0));
        cart.sram_mut()[..4].copy_from_slice(b"SAVE");
        card_args.store_cartridge(&cart).unwrap();

        let cart = card_args.load_cartridge().unwrap();
        assert_eq!(&cart.sram()[..4], b"SAVE");
        assert_eq!(cart.sram().len(), CART_SRAM_SIZE);
    }

    #[test]
    fn mount_rejects_missing_card_and_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let config = LauncherConfig::default();

        assert!(args(&dir.path().join("missing")).mount(&config).is_err());

        let mut card_args = args(dir.path());
        card_args.cwd = "/games".to_string();
        assert!(card_args.mount(&config).is_err());

        std::fs::create_dir(dir.path().join("games")).unwrap();
        assert!(card_args.mount(&config).is_ok());
    }
}
