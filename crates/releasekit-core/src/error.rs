//! Core error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::Version;

/// File operation that failed, reported alongside the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Create,
    Read,
    Write,
    Flush,
    Remove,
    Rename,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Write => "write",
            Self::Flush => "flush",
            Self::Remove => "remove",
            Self::Rename => "rename",
        };
        f.write_str(op)
    }
}

/// Core-related errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// IO error on a specific file.
    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: FileOp,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Version parsing error.
    #[error("version error: {0}")]
    Version(#[from] crate::VersionError),

    /// Git error.
    #[error("git error: {0}")]
    Git(#[from] releasekit_git::GitError),

    /// External tool error.
    #[error(transparent)]
    Tool(#[from] crate::ToolError),

    /// Prepending would create a second unreleased entry.
    #[error("changelog already has an unreleased entry for {0}")]
    UnreleasedExists(Version),
}

impl CoreError {
    /// Wraps an IO error with the operation and path it came from.
    pub fn io(op: FileOp, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
