//! Changelog version ledger.
//!
//! The ledger owns one changelog file and moves it through a release cycle:
//! the active `## <version> (Unreleased)` header gets stamped with a date on
//! release, and a fresh unreleased header is written when work on the next
//! version starts. Every rewrite goes through [`write_atomic`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::fs::{FileSystem, StdFileSystem, write_atomic};
use crate::{Component, CoreError, CoreResult, Version, VersionError};

/// Label carried by the entry under active development.
pub const UNRELEASED: &str = "Unreleased";

/// Release dates render as `March 5, 2024`.
const DATE_FORMAT: &str = "%B %-d, %Y";
const DATE_PARSE_FORMAT: &str = "%B %d, %Y";

static UNRELEASED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##.*?Unreleased\)$").expect("invalid regex"));

static HEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+(.+?)\s+\((.+)\)\s*$").expect("invalid regex"));

/// The parenthesised part of a header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Unreleased,
    Released(NaiveDate),
    /// Anything else, kept verbatim.
    Other(String),
}

impl Label {
    fn parse(text: &str) -> Self {
        if text == UNRELEASED {
            return Self::Unreleased;
        }
        NaiveDate::parse_from_str(text, DATE_PARSE_FORMAT)
            .map_or_else(|_| Self::Other(text.to_string()), Self::Released)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreleased => f.write_str(UNRELEASED),
            Self::Released(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Self::Other(text) => f.write_str(text),
        }
    }
}

/// A `## <version> (<label>)` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: Version,
    pub label: Label,
}

impl Header {
    /// Header for a version still in development.
    #[must_use]
    pub fn unreleased(version: Version) -> Self {
        Self {
            version,
            label: Label::Unreleased,
        }
    }

    /// Header for a version released on `date`.
    #[must_use]
    pub fn released(version: Version, date: NaiveDate) -> Self {
        Self {
            version,
            label: Label::Released(date),
        }
    }

    /// Parses a header line, returning `None` for anything else.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let captures = HEADER_LINE.captures(line)?;
        let version = Version::parse(&captures[1]).ok()?;
        Some(Self {
            version,
            label: Label::parse(&captures[2]),
        })
    }

    /// Returns true if this entry is still unreleased.
    #[must_use]
    pub fn is_unreleased(&self) -> bool {
        self.label == Label::Unreleased
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "## {} ({})", self.version, self.label)
    }
}

/// What [`ChangelogLedger::release`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The file did not exist and was created with the initial unreleased entry.
    Seeded(Version),
    /// The unreleased entry was stamped with a release date.
    Released(Version),
    /// No unreleased entry was found; the file was left untouched.
    NothingToRelease,
}

impl ReleaseOutcome {
    /// The version concerned, if any.
    #[must_use]
    pub fn version(self) -> Option<Version> {
        match self {
            Self::Seeded(version) | Self::Released(version) => Some(version),
            Self::NothingToRelease => None,
        }
    }
}

/// How [`ChangelogLedger::advance`] writes the next unreleased entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvanceMode {
    /// Read the version from the first line and replace the whole file with
    /// the new unreleased header, a blank line and the old header. Release
    /// notes below the first line are dropped.
    Fragment,
    /// Insert the new unreleased header above the first version header and
    /// keep the rest of the file.
    #[default]
    Prepend,
}

/// Summary of the headers currently in the changelog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerStatus {
    /// Version of the first unreleased entry.
    pub unreleased: Option<Version>,
    /// Top-most released entry.
    pub latest_release: Option<Header>,
    /// Number of header lines.
    pub entries: usize,
}

/// Reads and rewrites one changelog file.
#[derive(Debug, Clone)]
pub struct ChangelogLedger<F = StdFileSystem> {
    path: PathBuf,
    files: F,
}

impl ChangelogLedger {
    /// Creates a ledger over `path` on the real filesystem.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_file_system(path, StdFileSystem)
    }
}

impl<F: FileSystem> ChangelogLedger<F> {
    /// Creates a ledger using a custom [`FileSystem`].
    #[must_use]
    pub fn with_file_system(path: impl Into<PathBuf>, files: F) -> Self {
        Self {
            path: path.into(),
            files,
        }
    }

    /// Returns the changelog path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Marks the unreleased entry as released today.
    ///
    /// # Errors
    ///
    /// See [`ChangelogLedger::release_on`].
    pub fn release(&self) -> CoreResult<ReleaseOutcome> {
        self.release_on(Local::now().date_naive())
    }

    /// Marks the first unreleased entry as released on `date`.
    ///
    /// A missing file is created holding only `## 1.0.0 (Unreleased)`.
    /// When no line is unreleased nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, or the
    /// unreleased header has no parsable version.
    pub fn release_on(&self, date: NaiveDate) -> CoreResult<ReleaseOutcome> {
        if !self.files.exists(&self.path)? {
            let header = Header::unreleased(Version::INITIAL);
            info!(path = ?self.path, version = %Version::INITIAL, "seeding changelog");
            self.write_lines(&[header.to_string()])?;
            return Ok(ReleaseOutcome::Seeded(Version::INITIAL));
        }

        let content = self.files.read_to_string(&self.path)?;
        let mut lines: Vec<String> = content.lines().map(str::to_owned).collect();

        let Some(index) = lines.iter().position(|line| UNRELEASED_LINE.is_match(line)) else {
            warn!(path = ?self.path, "no unreleased entry, changelog left as is");
            return Ok(ReleaseOutcome::NothingToRelease);
        };

        let version = Version::parse(&lines[index])?;
        let header = Header::released(version, date);
        debug!(line = index + 1, from = %lines[index], to = %header, "stamping release date");
        lines[index] = header.to_string();

        self.write_lines(&lines)?;
        info!(%version, "marked changelog entry released");
        Ok(ReleaseOutcome::Released(version))
    }

    /// Opens a new unreleased entry one `component` above the current one.
    ///
    /// Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, no version
    /// can be found, or (in [`AdvanceMode::Prepend`]) the latest entry is
    /// still unreleased.
    pub fn advance(&self, component: Component, mode: AdvanceMode) -> CoreResult<Version> {
        let content = self.files.read_to_string(&self.path)?;
        let (lines, next) = match mode {
            AdvanceMode::Fragment => Self::fragment(&content, component)?,
            AdvanceMode::Prepend => self.prepend(&content, component)?,
        };

        self.write_lines(&lines)?;
        info!(version = %next, %component, ?mode, "opened next unreleased entry");
        Ok(next)
    }

    /// Scans every header line.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn status(&self) -> CoreResult<LedgerStatus> {
        let content = self.files.read_to_string(&self.path)?;
        let mut status = LedgerStatus::default();

        for header in content.lines().filter_map(Header::parse) {
            status.entries += 1;
            if header.is_unreleased() {
                if status.unreleased.is_none() {
                    status.unreleased = Some(header.version);
                }
            } else if status.latest_release.is_none() {
                status.latest_release = Some(header);
            }
        }

        Ok(status)
    }

    fn fragment(content: &str, component: Component) -> CoreResult<(Vec<String>, Version)> {
        let first = content.lines().next().unwrap_or_default();
        let current = Version::parse(first)?;
        let next = current.bump(component)?;

        let lines = vec![
            Header::unreleased(next).to_string(),
            String::new(),
            Header::unreleased(current).to_string(),
        ];
        Ok((lines, next))
    }

    fn prepend(&self, content: &str, component: Component) -> CoreResult<(Vec<String>, Version)> {
        let mut lines: Vec<String> = content.lines().map(str::to_owned).collect();

        let (index, current) = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.starts_with("##"))
            .find_map(|(index, line)| Version::parse(line).ok().map(|v| (index, v)))
            .ok_or_else(|| VersionError::NotFound(self.path.display().to_string()))?;

        if UNRELEASED_LINE.is_match(&lines[index]) {
            return Err(CoreError::UnreleasedExists(current));
        }

        let next = current.bump(component)?;
        lines.insert(index, String::new());
        lines.insert(index, Header::unreleased(next).to_string());
        Ok((lines, next))
    }

    fn write_lines(&self, lines: &[String]) -> CoreResult<()> {
        let mut contents = lines.join("\n");
        contents.push('\n');
        write_atomic(&self.files, &self.path, &contents)
    }
}
