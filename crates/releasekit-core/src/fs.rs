//! Filesystem access for atomic file rewrites.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{CoreError, CoreResult, FileOp};

/// Filesystem operations the ledger performs.
///
/// Production code uses [`StdFileSystem`]; tests substitute implementations
/// that fail at chosen steps.
pub trait FileSystem {
    /// Returns true if `path` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined.
    fn exists(&self, path: &Path) -> CoreResult<bool>;

    /// Reads a whole file as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not UTF-8.
    fn read_to_string(&self, path: &Path) -> CoreResult<String>;

    /// Creates (or truncates) `path`, writes `contents` and syncs it to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if any of create, write or flush fails.
    fn write_new(&self, path: &Path, contents: &str) -> CoreResult<()>;

    /// Renames `from` to `to`, replacing `to` where the platform allows it.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> CoreResult<()>;

    /// Removes a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    fn remove_file(&self, path: &Path) -> CoreResult<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &Path) -> CoreResult<bool> {
        path.try_exists()
            .map_err(|e| CoreError::io(FileOp::Read, path, e))
    }

    fn read_to_string(&self, path: &Path) -> CoreResult<String> {
        fs::read_to_string(path).map_err(|e| CoreError::io(FileOp::Read, path, e))
    }

    fn write_new(&self, path: &Path, contents: &str) -> CoreResult<()> {
        let file = File::create(path).map_err(|e| CoreError::io(FileOp::Create, path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(contents.as_bytes())
            .map_err(|e| CoreError::io(FileOp::Write, path, e))?;
        let file = writer
            .into_inner()
            .map_err(|e| CoreError::io(FileOp::Flush, path, e.into_error()))?;
        file.sync_all()
            .map_err(|e| CoreError::io(FileOp::Flush, path, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> CoreResult<()> {
        fs::rename(from, to).map_err(|e| CoreError::io(FileOp::Rename, from, e))
    }

    fn remove_file(&self, path: &Path) -> CoreResult<()> {
        fs::remove_file(path).map_err(|e| CoreError::io(FileOp::Remove, path, e))
    }
}

/// Sibling path the new content is staged in: `<path>.tmp`.
#[must_use]
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Replaces the contents of `path` without ever exposing a half-written file.
///
/// The new content goes to [`temp_path`] first and is then renamed over
/// `path`. If the rename is refused (some platforms will not replace an
/// existing file) the target is removed and the rename retried.
///
/// # Errors
///
/// Returns the first failing step. The original file is still in place
/// unless the retry rename fails after the target was removed; in that case
/// the staged copy is left behind at [`temp_path`].
pub fn write_atomic(files: &impl FileSystem, path: &Path, contents: &str) -> CoreResult<()> {
    let temp = temp_path(path);
    debug!(?temp, "staging new contents");

    if let Err(e) = files.write_new(&temp, contents) {
        discard(files, &temp);
        return Err(e);
    }

    if let Err(first) = files.rename(&temp, path) {
        debug!(error = %first, "rename refused, removing target and retrying");
        if let Err(e) = files.remove_file(path) {
            discard(files, &temp);
            return Err(e);
        }
        files.rename(&temp, path)?;
    }

    Ok(())
}

fn discard(files: &impl FileSystem, temp: &Path) {
    if let Err(e) = files.remove_file(temp) {
        warn!(?temp, error = %e, "failed to clean up temporary file");
    }
}

/// Fails on chosen steps, delegating the rest to [`StdFileSystem`].
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FaultyFileSystem {
    pub fail_write: bool,
    pub fail_rename: bool,
    /// Refuse to remove anything not ending in `.tmp`.
    pub fail_remove_target: bool,
}

#[cfg(test)]
impl FileSystem for FaultyFileSystem {
    fn exists(&self, path: &Path) -> CoreResult<bool> {
        StdFileSystem.exists(path)
    }

    fn read_to_string(&self, path: &Path) -> CoreResult<String> {
        StdFileSystem.read_to_string(path)
    }

    fn write_new(&self, path: &Path, contents: &str) -> CoreResult<()> {
        if self.fail_write {
            return Err(CoreError::io(FileOp::Write, path, std::io::Error::other("disk full")));
        }
        StdFileSystem.write_new(path, contents)
    }

    fn rename(&self, from: &Path, to: &Path) -> CoreResult<()> {
        if self.fail_rename {
            return Err(CoreError::io(FileOp::Rename, from, std::io::Error::other("refused")));
        }
        StdFileSystem.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> CoreResult<()> {
        let is_temp = path.extension().is_some_and(|ext| ext == "tmp");
        if self.fail_remove_target && !is_temp {
            return Err(CoreError::io(FileOp::Remove, path, std::io::Error::other("busy")));
        }
        StdFileSystem.remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path_appends_suffix() {
        assert_eq!(
            temp_path(Path::new("docs/CHANGELOG.md")),
            PathBuf::from("docs/CHANGELOG.md.tmp")
        );
    }

    #[test]
    fn test_write_atomic_new_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHANGELOG.md");

        write_atomic(&StdFileSystem, &path, "new\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHANGELOG.md");
        fs::write(&path, "old\n").unwrap();

        write_atomic(&StdFileSystem, &path, "new\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_write_failure_leaves_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHANGELOG.md");
        fs::write(&path, "old\n").unwrap();
        let faulty = FaultyFileSystem {
            fail_write: true,
            ..FaultyFileSystem::default()
        };

        let err = write_atomic(&faulty, &path, "new\n").unwrap_err();

        assert!(matches!(err, CoreError::Io { op: FileOp::Write, .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\n");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_remove_failure_leaves_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHANGELOG.md");
        fs::write(&path, "## 1.0.0 (Unreleased)\nnotes\n").unwrap();
        let faulty = FaultyFileSystem {
            fail_rename: true,
            fail_remove_target: true,
            ..FaultyFileSystem::default()
        };

        let err = write_atomic(&faulty, &path, "replaced\n").unwrap_err();

        assert!(matches!(err, CoreError::Io { op: FileOp::Remove, .. }));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "## 1.0.0 (Unreleased)\nnotes\n"
        );
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_retry_rename_failure_keeps_staged_copy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHANGELOG.md");
        fs::write(&path, "old\n").unwrap();
        let faulty = FaultyFileSystem {
            fail_rename: true,
            ..FaultyFileSystem::default()
        };

        let err = write_atomic(&faulty, &path, "new\n").unwrap_err();

        assert!(matches!(err, CoreError::Io { op: FileOp::Rename, .. }));
        assert_eq!(fs::read_to_string(temp_path(&path)).unwrap(), "new\n");
    }

    #[test]
    fn test_read_missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.md");

        let err = StdFileSystem.read_to_string(&path).unwrap_err();
        assert!(err.to_string().contains("missing.md"));
    }
}
