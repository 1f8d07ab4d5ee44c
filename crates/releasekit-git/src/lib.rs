//! Git plumbing for releasekit.
//!
//! This crate provides the version-control side of a release run:
//! - Cloning or opening the working copy
//! - Staging and committing
//! - Idempotent tag creation support
//! - Pushing branches and tags over HTTPS

mod auth;
mod error;
mod repository;

pub use auth::{Author, Credentials};
pub use error::{GitError, GitResult};
pub use repository::{REMOTE_NAME, Repository};
