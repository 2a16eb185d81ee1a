//! Inspect command - print ROM footer and save media

use anyhow::{Context, Result};
use clap::Args;

use swanboot_core::{CardFs, SaveKind, extract, save_path};
use swanboot_shared::RomBankLayout;

use crate::card::CardArgs;

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// ROM path on the card
    pub rom: String,
}

/// Execute the inspect command
pub fn execute(card_args: &CardArgs, args: InspectArgs) -> Result<()> {
    let config = card_args.load_config()?;
    let mut card = card_args.mount(&config)?;
    let metadata = extract(&mut card, &args.rom)
        .with_context(|| format!("Failed to read ROM metadata: {}", args.rom))?;
    let footer = &metadata.footer;
    let info = card
        .stat(&args.rom)
        .with_context(|| format!("Failed to stat ROM: {}", args.rom))?;

    println!("{}", args.rom);
    println!("  publisher:  {:#04x}", footer.publisher_id);
    println!("  game:       {:#04x} (version {})", footer.game_id, footer.game_version);
    println!("  color:      {}", if footer.color != 0 { "yes" } else { "no" });
    println!("  save type:  {:#04x}", footer.save_type);
    println!("  mapper:     {:#04x}", footer.mapper);
    println!("  layout:     {}", describe_layout(info.size));

    if !metadata.has_save_data() {
        println!("  saves:      none");
        return Ok(());
    }
    for kind in SaveKind::ALL {
        let size = metadata.size_of(kind);
        if size != 0 {
            let label = format!("{kind}:");
            println!("  {label:<11} {size} bytes -> {}", save_path(&args.rom, kind));
        }
    }
    Ok(())
}

/// Where the bootstub will map an image of `size` bytes.
fn describe_layout(size: u64) -> String {
    match RomBankLayout::for_size(size) {
        Some(layout) => format!(
            "{} bank(s), {} bytes mapped, image starts at bank {} offset {:#06x}",
            layout.bank_count, layout.mapped_size, layout.start_bank, layout.start_offset
        ),
        None => format!("{size} bytes, too large to map"),
    }
}
