//! Launch command - full launch sequence with a dry-run handoff
//!
//! Orchestrates: backup → extract → restore → bootstub handoff

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use swanboot_core::{Bootstub, LauncherConfig, RelocatorOptions, launch_rom};

use crate::card::CardArgs;
use crate::platform::DryRunPlatform;

/// Arguments for the launch command
#[derive(Args)]
pub struct LaunchArgs {
    /// ROM path on the card
    pub rom: String,

    /// Bootstub program image (overrides boot.stub_path)
    #[arg(long)]
    pub stub: Option<PathBuf>,

    /// Packed bootstub tiles (overrides boot.tiles_path)
    #[arg(long)]
    pub tiles: Option<PathBuf>,

    /// Where to write the handoff block
    #[arg(long, default_value = "handoff.bin")]
    pub handoff_out: PathBuf,
}

fn read_asset(path: &Path, what: &str) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {what}: {}", path.display()))
}

/// Resolve the bootstub code and tiles from arguments, then config.
fn load_bootstub(args: &LaunchArgs, config: &LauncherConfig) -> Result<(Vec<u8>, Vec<u8>)> {
    let stub_path = args
        .stub
        .as_ref()
        .or(config.boot.stub_path.as_ref())
        .context("No bootstub image: pass --stub or set boot.stub_path")?;
    let code = read_asset(stub_path, "bootstub")?;

    let tiles = match args.tiles.as_ref().or(config.boot.tiles_path.as_ref()) {
        Some(path) => read_asset(path, "bootstub tiles")?,
        None => Vec::new(),
    };
    Ok((code, tiles))
}

/// Execute the launch command
pub fn execute(card_args: &CardArgs, args: LaunchArgs) -> Result<()> {
    let config = card_args.load_config()?;
    let (code, tiles) = load_bootstub(&args, &config)?;
    let stub = Bootstub::new(&code, &tiles).with_default_sram_mask(config.boot.default_sram_mask);

    let mut card = card_args.mount(&config)?;
    let mut cart = card_args.load_cartridge()?;
    let mut platform = DryRunPlatform::new(!card_args.mono);
    let options = RelocatorOptions::from_config(&config, !card_args.mono);

    let handoff = launch_rom(&mut card, &mut cart, &mut platform, &stub, options, &args.rom)
        .with_context(|| format!("Failed to launch {}", args.rom))?;
    card_args.store_cartridge(&cart)?;

    std::fs::write(&args.handoff_out, handoff.block.to_bytes()).with_context(|| {
        format!("Failed to write handoff block: {}", args.handoff_out.display())
    })?;

    tracing::info!(
        out = %args.handoff_out.display(),
        cluster = handoff.block.prog_cluster,
        size = handoff.block.prog_size,
        sram_mask = handoff.block.prog_sram_mask,
        stub_bytes = handoff.code_len,
        "wrote handoff block"
    );
    println!(
        "bootstub ({} bytes) loaded at {:#06x}, entry {:04X}:{:04X}",
        handoff.code_len, handoff.load_address, handoff.entry.segment, handoff.entry.offset
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use swanboot_shared::HandoffBlock;

    fn card_args(card: &Path) -> CardArgs {
        std::fs::write(card.join("swanboot.toml"), "").unwrap();
        CardArgs {
            card: card.to_path_buf(),
            cwd: "/".to_string(),
            config: Some(card.join("swanboot.toml")),
            sram: Some(card.join("cart.sram")),
            psram: None,
            mono: false,
        }
    }

    #[test]
    fn launch_writes_handoff_block() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("NILESWAN")).unwrap();
        std::fs::write(root.join("stub.bin"), [0xEAu8, 0, 0, 0, 0]).unwrap();
        let mut rom = vec![0u8; 0x10000];
        // Footer save type: 8 KiB SRAM.
        rom[0x10000 - 16 + 11] = 0x01;
        std::fs::write(root.join("GAME.WS"), rom).unwrap();

        let args = LaunchArgs {
            rom: "GAME.WS".to_string(),
            stub: Some(root.join("stub.bin")),
            tiles: None,
            handoff_out: root.join("handoff.bin"),
        };
        let card_args = card_args(root);
        execute(&card_args, args).unwrap();

        let bytes = std::fs::read(root.join("handoff.bin")).unwrap();
        let block = HandoffBlock::from_bytes(&bytes).unwrap();
        assert_eq!(block.prog_size, 0x10000);
        assert_eq!(block.prog_sram_mask, 0);
        assert_eq!(
            std::fs::read_to_string(root.join("NILESWAN/SAVE.INI")).unwrap(),
            "[save]\nsram=8192|/GAME.ram\n"
        );
        let sram = std::fs::read(root.join("cart.sram")).unwrap();
        assert!(sram[..8192].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn launch_without_bootstub_fails_early() {
        let dir = tempfile::tempdir().unwrap();
        let args = LaunchArgs {
            rom: "GAME.WS".to_string(),
            stub: None,
            tiles: None,
            handoff_out: dir.path().join("handoff.bin"),
        };
        assert!(load_bootstub(&args, &LauncherConfig::default()).is_err());
    }
}
