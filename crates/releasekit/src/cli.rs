//! CLI definition.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Publish the unreleased changelog entry of a Git project and open the next version.
#[derive(Debug, Parser)]
#[command(name = "releasekit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a releasekit.toml template
    Init(commands::init::InitArgs),

    /// Work on a changelog file directly
    Changelog(commands::changelog::ChangelogArgs),

    /// Run a full release (changelog + commit + tag + build + next version)
    Release(commands::release::ReleaseArgs),
}

impl Cli {
    /// Runs the CLI command.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init(args) => commands::init::run(&args),
            Commands::Changelog(args) => commands::changelog::run(args),
            Commands::Release(args) => commands::release::run(args),
        }
    }
}
