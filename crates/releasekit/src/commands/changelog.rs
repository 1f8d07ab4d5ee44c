//! Changelog command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use releasekit_core::{ChangelogLedger, ReleaseOutcome};

use super::{BumpArg, ModeArg};

/// Arguments for the changelog command.
#[derive(Debug, Args)]
pub struct ChangelogArgs {
    #[command(subcommand)]
    pub command: ChangelogCommand,
}

#[derive(Debug, Subcommand)]
pub enum ChangelogCommand {
    /// Mark the unreleased entry as released today and print its version
    Release(FileArgs),

    /// Open the next unreleased entry and print its version
    Advance(AdvanceArgs),

    /// Show the unreleased and latest released entries
    Status(FileArgs),
}

/// Changelog file selection.
#[derive(Debug, Args)]
pub struct FileArgs {
    /// Changelog file
    #[arg(short, long, default_value = "CHANGELOG.md")]
    pub file: PathBuf,
}

/// Arguments for `changelog advance`.
#[derive(Debug, Args)]
pub struct AdvanceArgs {
    #[command(flatten)]
    pub file: FileArgs,

    /// Component to bump
    #[arg(short, long, value_enum, default_value = "patch")]
    pub bump: BumpArg,

    /// How the new entry is written
    #[arg(short, long, value_enum, default_value = "prepend")]
    pub mode: ModeArg,
}

/// Runs the changelog command.
pub fn run(args: ChangelogArgs) -> Result<()> {
    match args.command {
        ChangelogCommand::Release(args) => release(&args),
        ChangelogCommand::Advance(args) => advance(&args),
        ChangelogCommand::Status(args) => status(&args),
    }
}

fn release(args: &FileArgs) -> Result<()> {
    let ledger = ChangelogLedger::new(&args.file);
    let outcome = ledger
        .release()
        .with_context(|| format!("failed to release {}", args.file.display()))?;

    match outcome {
        ReleaseOutcome::Seeded(version) => {
            eprintln!("Created {} for {version}", args.file.display());
            println!("{version}");
        }
        ReleaseOutcome::Released(version) => println!("{version}"),
        ReleaseOutcome::NothingToRelease => eprintln!("Nothing to release"),
    }
    Ok(())
}

fn advance(args: &AdvanceArgs) -> Result<()> {
    let ledger = ChangelogLedger::new(&args.file.file);
    let next = ledger
        .advance(args.bump.into(), args.mode.into())
        .with_context(|| format!("failed to advance {}", args.file.file.display()))?;

    println!("{next}");
    Ok(())
}

fn status(args: &FileArgs) -> Result<()> {
    let ledger = ChangelogLedger::new(&args.file);
    let status = ledger
        .status()
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    match status.unreleased {
        Some(version) => println!("Unreleased:     {version}"),
        None => println!("Unreleased:     none"),
    }
    match status.latest_release {
        Some(header) => println!("Latest release: {} ({})", header.version, header.label),
        None => println!("Latest release: none"),
    }
    println!("Entries:        {}", status.entries);
    Ok(())
}
