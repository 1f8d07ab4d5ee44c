//! Initialize command.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use releasekit_config::{CONFIG_FILE_NAME, CONFIG_TEMPLATE};
use tracing::info;

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Directory to write the configuration to
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

/// Runs the init command.
pub fn run(args: &InitArgs) -> Result<()> {
    let path = args.dir.join(CONFIG_FILE_NAME);

    if path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    fs::write(&path, CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(?path, "wrote configuration template");
    println!("Created {}", path.display());
    Ok(())
}
