//! Release workflow orchestration.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use releasekit_git::{Author, Credentials, GitResult, Repository};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::tools::{BuildSecrets, DependencyTidy, ReleaseBuilder};
use crate::{
    AdvanceMode, ChangelogLedger, Component, CoreError, CoreResult, FileOp, ReleaseOutcome, Version,
};

/// Commit message for the release commit.
pub fn release_commit_message(version: Version) -> String {
    format!("release version {version}")
}

/// Commit message for the changelog opening the next version.
pub const CHANGELOG_COMMIT_MESSAGE: &str = "new version changelog";

/// Version-control operations the workflow needs.
pub trait VersionControl {
    /// Stages every change in the working copy, removals included.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be updated.
    fn stage_all(&self) -> GitResult<()>;

    /// Commits the staged changes and returns the new commit id.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit cannot be created.
    fn commit(&self, author: &Author, message: &str) -> GitResult<String>;

    /// Returns true if a tag with exactly this name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read.
    fn tag_exists(&self, name: &str) -> GitResult<bool>;

    /// Creates an annotated tag on `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be created.
    fn create_tag(&self, name: &str, target: &str, tagger: &Author) -> GitResult<()>;

    /// Pushes the current branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails.
    fn push(&self, credentials: &Credentials) -> GitResult<()>;

    /// Pushes every local tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails.
    fn push_tags(&self, credentials: &Credentials) -> GitResult<()>;
}

impl VersionControl for Repository {
    fn stage_all(&self) -> GitResult<()> {
        Self::stage_all(self)
    }

    fn commit(&self, author: &Author, message: &str) -> GitResult<String> {
        Self::commit(self, author, message)
    }

    fn tag_exists(&self, name: &str) -> GitResult<bool> {
        Self::tag_exists(self, name)
    }

    fn create_tag(&self, name: &str, target: &str, tagger: &Author) -> GitResult<()> {
        Self::create_tag(self, name, target, tagger)
    }

    fn push(&self, credentials: &Credentials) -> GitResult<()> {
        Self::push(self, credentials)
    }

    fn push_tags(&self, credentials: &Credentials) -> GitResult<()> {
        Self::push_tags(self, credentials)
    }
}

/// What [`tag_release`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    Created,
    /// A tag with that name was already there and was left alone.
    AlreadyExists,
}

/// Tags `target` as `name` unless the tag already exists.
///
/// # Errors
///
/// Returns an error if the tag lookup or creation fails.
pub fn tag_release(
    vcs: &impl VersionControl,
    name: &str,
    target: &str,
    tagger: &Author,
) -> GitResult<TagOutcome> {
    if vcs.tag_exists(name)? {
        info!(tag = %name, "tag already exists, skipping");
        return Ok(TagOutcome::AlreadyExists);
    }

    vcs.create_tag(name, target, tagger)?;
    Ok(TagOutcome::Created)
}

/// Gets a working copy of `url` at `workdir`.
///
/// A missing or empty directory is cloned into. Anything else is opened as an
/// existing repository and pulled; a failed pull is only logged.
///
/// # Errors
///
/// Returns an error if the clone fails or `workdir` is not a repository.
pub fn checkout(url: &str, workdir: &Path, credentials: &Credentials) -> CoreResult<Repository> {
    if is_missing_or_empty(workdir)? {
        info!(%url, ?workdir, "cloning repository");
        return Ok(Repository::clone(url, workdir, credentials)?);
    }

    info!(?workdir, "opening existing working copy");
    let repo = Repository::open(workdir)?;
    if let Err(e) = repo.pull(credentials) {
        warn!(error = %e, "pull failed, continuing with the local state");
    }
    Ok(repo)
}

fn is_missing_or_empty(dir: &Path) -> CoreResult<bool> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(CoreError::io(FileOp::Read, dir, e)),
    }
}

/// Workflow step, reported with any failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Checkout,
    Release,
    Tidy,
    Commit,
    Tag,
    Push,
    Build,
    Advance,
    CommitChangelog,
    PushChangelog,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Checkout => "checkout",
            Self::Release => "release",
            Self::Tidy => "tidy",
            Self::Commit => "commit",
            Self::Tag => "tag",
            Self::Push => "push",
            Self::Build => "build",
            Self::Advance => "advance",
            Self::CommitChangelog => "commit-changelog",
            Self::PushChangelog => "push-changelog",
        };
        f.write_str(name)
    }
}

/// A workflow step failed; later steps were not run.
#[derive(Debug, Error)]
#[error("{step} step failed: {source}")]
pub struct WorkflowError {
    pub step: Step,
    #[source]
    pub source: CoreError,
}

/// Attaches the running step to a failure.
trait AtStep<T> {
    fn at(self, step: Step) -> Result<T, WorkflowError>;
}

impl<T, E: Into<CoreError>> AtStep<T> for Result<T, E> {
    fn at(self, step: Step) -> Result<T, WorkflowError> {
        self.map_err(|e| WorkflowError {
            step,
            source: e.into(),
        })
    }
}

/// Settings for one release run.
#[derive(Debug, Clone)]
pub struct ReleaseSettings {
    /// Changelog path, relative to the work directory.
    pub changelog: PathBuf,
    pub bump: Component,
    pub advance: AdvanceMode,
    pub tag_prefix: String,
    pub author: Author,
    pub credentials: Credentials,
    pub secrets: BuildSecrets,
}

/// What a workflow run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// The changelog had no unreleased entry; nothing was committed.
    NothingToRelease,
    /// `version` was published and `next` opened.
    Published {
        version: Version,
        tag: TagOutcome,
        next: Version,
    },
}

/// Runs the release sequence against a working copy.
pub struct ReleaseWorkflow {
    settings: ReleaseSettings,
    builder: Box<dyn ReleaseBuilder>,
    tidy: Option<Box<dyn DependencyTidy>>,
}

impl ReleaseWorkflow {
    /// Creates a workflow without a tidy step.
    #[must_use]
    pub fn new(settings: ReleaseSettings, builder: Box<dyn ReleaseBuilder>) -> Self {
        Self {
            settings,
            builder,
            tidy: None,
        }
    }

    /// Runs `tidy` before the release commit.
    #[must_use]
    pub fn with_tidy(mut self, tidy: Box<dyn DependencyTidy>) -> Self {
        self.tidy = Some(tidy);
        self
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &ReleaseSettings {
        &self.settings
    }

    /// Clones or refreshes the working copy at `workdir`.
    ///
    /// # Errors
    ///
    /// Returns a [`Step::Checkout`] error if no working copy can be obtained.
    pub fn checkout(&self, url: &str, workdir: &Path) -> Result<Repository, WorkflowError> {
        checkout(url, workdir, &self.settings.credentials).at(Step::Checkout)
    }

    /// Runs the whole sequence, dating the release today.
    ///
    /// # Errors
    ///
    /// See [`ReleaseWorkflow::run_on`].
    pub fn run(
        &self,
        vcs: &impl VersionControl,
        workdir: &Path,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        self.run_on(vcs, workdir, Local::now().date_naive())
    }

    /// Runs the whole sequence, dating the release `date`.
    ///
    /// A missing changelog is seeded and stamped in the same run, so the
    /// advance step always finds a released entry at the top.
    ///
    /// # Errors
    ///
    /// Returns the first failing step. Earlier steps are not rolled back: once
    /// the release step has stamped the entry, running again returns
    /// [`WorkflowOutcome::NothingToRelease`] until the `(Unreleased)` header
    /// is restored by hand. The existing tag is then reused.
    pub fn run_on(
        &self,
        vcs: &impl VersionControl,
        workdir: &Path,
        date: NaiveDate,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let settings = &self.settings;
        let ledger = ChangelogLedger::new(workdir.join(&settings.changelog));

        info!(step = %Step::Release, changelog = ?ledger.path(), "marking release");
        let mut outcome = ledger.release_on(date).at(Step::Release)?;
        if let ReleaseOutcome::Seeded(version) = outcome {
            debug!(%version, "stamping freshly seeded entry");
            outcome = ledger.release_on(date).at(Step::Release)?;
        }
        let version = match outcome {
            ReleaseOutcome::NothingToRelease => {
                warn!("nothing to release, stopping");
                return Ok(WorkflowOutcome::NothingToRelease);
            }
            ReleaseOutcome::Seeded(version) | ReleaseOutcome::Released(version) => version,
        };

        if let Some(tidy) = &self.tidy {
            info!(step = %Step::Tidy, "tidying dependencies");
            tidy.tidy(workdir).at(Step::Tidy)?;
        }

        info!(step = %Step::Commit, %version, "committing release");
        vcs.stage_all().at(Step::Commit)?;
        let commit = vcs
            .commit(&settings.author, &release_commit_message(version))
            .at(Step::Commit)?;
        debug!(%commit, "release commit created");

        let tag_name = format!("{}{version}", settings.tag_prefix);
        info!(step = %Step::Tag, tag = %tag_name, "tagging release");
        let tag = tag_release(vcs, &tag_name, &commit, &settings.author).at(Step::Tag)?;

        info!(step = %Step::Push, "pushing release");
        vcs.push(&settings.credentials).at(Step::Push)?;
        vcs.push_tags(&settings.credentials).at(Step::Push)?;

        info!(step = %Step::Build, "building release artifacts");
        self.build(workdir).at(Step::Build)?;

        info!(step = %Step::Advance, bump = %settings.bump, "opening next version");
        let next = ledger
            .advance(settings.bump, settings.advance)
            .at(Step::Advance)?;

        info!(step = %Step::CommitChangelog, %next, "committing changelog");
        vcs.stage_all().at(Step::CommitChangelog)?;
        vcs.commit(&settings.author, CHANGELOG_COMMIT_MESSAGE)
            .at(Step::CommitChangelog)?;

        info!(step = %Step::PushChangelog, "pushing changelog");
        vcs.push(&settings.credentials).at(Step::PushChangelog)?;

        info!(%version, %next, "release completed");
        Ok(WorkflowOutcome::Published { version, tag, next })
    }

    fn build(&self, workdir: &Path) -> CoreResult<()> {
        let dist = workdir.join(self.builder.output_dir());
        clean_dir(&dist)?;
        self.builder.build(workdir, &self.settings.secrets)?;
        clean_dir(&dist)
    }
}

fn clean_dir(dir: &Path) -> CoreResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            debug!(?dir, "removed output directory");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CoreError::io(FileOp::Remove, dir, e)),
    }
}
