//! Subcommand implementations.

pub mod changelog;
pub mod init;
pub mod release;

use clap::ValueEnum;
use releasekit_config::{AdvanceKind, BumpKind};
use releasekit_core::{AdvanceMode, Component};

/// Bump type argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BumpArg {
    /// Increment the major component
    Major,
    /// Increment the minor component
    Minor,
    /// Increment the patch component
    Patch,
}

impl From<BumpArg> for Component {
    fn from(arg: BumpArg) -> Self {
        match arg {
            BumpArg::Major => Component::Major,
            BumpArg::Minor => Component::Minor,
            BumpArg::Patch => Component::Patch,
        }
    }
}

/// Advance mode argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Replace the file with the new and previous headers, dropping notes
    Fragment,
    /// Insert the new header above the existing history
    Prepend,
}

impl From<ModeArg> for AdvanceMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Fragment => AdvanceMode::Fragment,
            ModeArg::Prepend => AdvanceMode::Prepend,
        }
    }
}

/// Maps the configured bump onto a version component.
pub fn component(kind: BumpKind) -> Component {
    match kind {
        BumpKind::Major => Component::Major,
        BumpKind::Minor => Component::Minor,
        BumpKind::Patch => Component::Patch,
    }
}

/// Maps the configured advance style onto a ledger mode.
pub fn advance_mode(kind: AdvanceKind) -> AdvanceMode {
    match kind {
        AdvanceKind::Fragment => AdvanceMode::Fragment,
        AdvanceKind::Prepend => AdvanceMode::Prepend,
    }
}
