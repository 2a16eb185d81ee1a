//! swanboot - host front-end for the cartridge launcher
//!
//! Runs the launcher pipeline against an unpacked copy of a storage card.
//!
//! # Commands
//!
//! - `swanboot inspect <rom>` - Print the footer and save media of a ROM
//! - `swanboot restore <rom>` - Copy the ROM's saves onto the cartridge and write the manifest
//! - `swanboot backup` - Copy the cartridge back to the card and clear the manifest
//! - `swanboot launch <rom>` - Backup, restore and dry-run the bootstub handoff
//!
//! # Usage
//!
//! ```bash
//! # Restore saves, letting the cartridge SRAM live in a host file
//! swanboot --card /mnt/sd --sram cart.sram restore /games/GAME.ws
//!
//! # Later, write the SRAM back to the card
//! swanboot --card /mnt/sd --sram cart.sram backup
//!
//! # Boot dry-run: writes the 28-byte handoff block
//! swanboot --card /mnt/sd launch /games/GAME.ws --stub bootstub.bin --handoff-out handoff.bin
//! ```

mod card;
mod inspect;
mod launch;
mod platform;
mod relocate;

use anyhow::Result;
use clap::{Parser, Subcommand};

use card::CardArgs;

/// swanboot - cartridge launcher front-end
#[derive(Parser)]
#[command(name = "swanboot")]
#[command(about = "Inspect ROMs, relocate saves and dry-run boots against a card directory")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    card: CardArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the footer and save media requirements of a ROM
    Inspect(inspect::InspectArgs),

    /// Copy a ROM's save files onto the cartridge and write the save manifest
    Restore(relocate::RestoreArgs),

    /// Copy the cartridge save regions back to the card and delete the manifest
    Backup,

    /// Back up, restore and hand the ROM over to the bootstub (dry run)
    Launch(launch::LaunchArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(args) => inspect::execute(&cli.card, args),
        Commands::Restore(args) => relocate::restore(&cli.card, args),
        Commands::Backup => relocate::backup(&cli.card),
        Commands::Launch(args) => launch::execute(&cli.card, args),
    }
}
