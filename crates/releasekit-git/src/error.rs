//! Git error types.

use std::path::PathBuf;

use thiserror::Error;

/// Git-related errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository.
    #[error("not a git repository: {0}")]
    NotARepo(PathBuf),

    /// Cloning the remote failed.
    #[error("failed to clone {url}: {source}")]
    Clone {
        url: String,
        #[source]
        source: git2::Error,
    },

    /// The named remote is not configured.
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// HEAD does not point at a branch.
    #[error("HEAD is detached, a branch is required")]
    DetachedHead,

    /// The remote branch diverged from the local one.
    #[error("cannot fast-forward branch {0}")]
    NotFastForward(String),

    /// The remote refused a reference update.
    #[error("push of {reference} rejected: {message}")]
    PushRejected { reference: String, message: String },

    /// Git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_repo_display() {
        let err = GitError::NotARepo(PathBuf::from("/tmp/not-git"));
        assert_eq!(err.to_string(), "not a git repository: /tmp/not-git");
    }

    #[test]
    fn test_push_rejected_display() {
        let err = GitError::PushRejected {
            reference: "refs/heads/main".to_string(),
            message: "non-fast-forward".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "push of refs/heads/main rejected: non-fast-forward"
        );
    }

    #[test]
    fn test_remote_not_found_display() {
        let err = GitError::RemoteNotFound("origin".to_string());
        assert_eq!(err.to_string(), "remote not found: origin");
    }

    #[test]
    fn test_clone_keeps_source() {
        let err = GitError::Clone {
            url: "https://example.com/repo.git".to_string(),
            source: git2::Error::from_str("unreachable"),
        };
        assert!(err.to_string().contains("https://example.com/repo.git"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_is_debug() {
        let err = GitError::DetachedHead;
        let debug = format!("{err:?}");
        assert!(debug.contains("DetachedHead"));
    }
}
