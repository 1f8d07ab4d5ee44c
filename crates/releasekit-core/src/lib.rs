//! Core library for releasekit.
//!
//! This crate provides the changelog version ledger and the release workflow
//! that publishes one version and opens the next.

mod changelog;
mod error;
pub mod fs;
mod tools;
mod version;
mod workflow;

pub use changelog::{
    AdvanceMode, ChangelogLedger, Header, Label, LedgerStatus, ReleaseOutcome, UNRELEASED,
};
pub use error::{CoreError, CoreResult, FileOp};
pub use tools::{
    BuildSecrets, CommandOutput, CommandReleaseBuilder, CommandTidy, DependencyTidy,
    ExternalCommand, ReleaseBuilder, ToolError, ToolResult,
};
pub use version::{Component, Version, VersionError};
pub use workflow::{
    CHANGELOG_COMMIT_MESSAGE, ReleaseSettings, ReleaseWorkflow, Step, TagOutcome, VersionControl,
    WorkflowError, WorkflowOutcome, checkout, release_commit_message, tag_release,
};
