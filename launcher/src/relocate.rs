//! Restore and backup commands

use anyhow::{Context, Result};
use clap::Args;

use swanboot_core::{BackupOutcome, RelocatorOptions, SaveRelocator, extract};

use crate::card::CardArgs;

/// Arguments for the restore command
#[derive(Args)]
pub struct RestoreArgs {
    /// ROM path on the card
    pub rom: String,
}

/// Execute the restore command
pub fn restore(card_args: &CardArgs, args: RestoreArgs) -> Result<()> {
    let config = card_args.load_config()?;
    let mut card = card_args.mount(&config)?;
    let mut cart = card_args.load_cartridge()?;

    let metadata = extract(&mut card, &args.rom)
        .with_context(|| format!("Failed to read ROM metadata: {}", args.rom))?;
    let options = RelocatorOptions::from_config(&config, !card_args.mono);
    let outcome = SaveRelocator::new(&mut card, &mut cart, options)
        .restore(&args.rom, &metadata)
        .with_context(|| format!("Failed to restore saves for {}", args.rom))?;
    card_args.store_cartridge(&cart)?;

    if outcome.entries.is_empty() {
        println!("{} has no save media", args.rom);
    }
    for entry in &outcome.entries {
        println!("{}: {} bytes from {}", entry.kind, entry.size, entry.path);
    }
    println!("boot: {}", outcome.boot_path);
    Ok(())
}

/// Execute the backup command
pub fn backup(card_args: &CardArgs) -> Result<()> {
    let config = card_args.load_config()?;
    let mut card = card_args.mount(&config)?;
    let mut cart = card_args.load_cartridge()?;

    let options = RelocatorOptions::from_config(&config, !card_args.mono);
    let outcome = SaveRelocator::new(&mut card, &mut cart, options)
        .backup()
        .context("Failed to back up saves (the manifest was kept, retry after fixing the card)")?;

    match outcome {
        BackupOutcome::NothingToBackUp => println!("nothing to back up"),
        BackupOutcome::BackedUp(entries) => {
            for entry in entries {
                println!("{}: {} bytes to {}", entry.kind, entry.size, entry.path);
            }
        }
    }
    Ok(())
}
