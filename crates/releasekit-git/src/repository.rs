//! Git repository wrapper.

use std::cell::Cell;
use std::fmt;
use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    Cred, ErrorCode, FetchOptions, IndexAddOption, Oid, PushOptions, RemoteCallbacks,
    Repository as Git2Repo,
};
use tracing::{debug, info};

use crate::{Author, Credentials, GitError, GitResult};

/// Remote every fetch and push goes through.
pub const REMOTE_NAME: &str = "origin";

/// A Git repository wrapper.
pub struct Repository {
    inner: Git2Repo,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.path())
            .finish()
    }
}

impl Repository {
    /// Opens a repository at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a valid Git repository.
    pub fn open(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let inner = Git2Repo::open(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Ok(Self { inner })
    }

    /// Clones `url` into `path`, authenticating with `credentials`.
    ///
    /// # Errors
    ///
    /// Returns an error if the clone fails.
    pub fn clone(url: &str, path: impl AsRef<Path>, credentials: &Credentials) -> GitResult<Self> {
        let path = path.as_ref();
        info!(%url, ?path, "cloning repository");

        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_options(credentials));
        let inner = builder.clone(url, path).map_err(|source| GitError::Clone {
            url: url.to_string(),
            source,
        })?;

        Ok(Self { inner })
    }

    /// Returns the repository root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.workdir().unwrap_or_else(|| self.inner.path())
    }

    /// Returns all tags in the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read.
    pub fn tags(&self) -> GitResult<Vec<String>> {
        let tags = self.inner.tag_names(None)?;
        Ok(tags.iter().flatten().map(String::from).collect())
    }

    /// Returns true if a tag with exactly this name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read.
    pub fn tag_exists(&self, name: &str) -> GitResult<bool> {
        let tags = self.inner.tag_names(Some(name))?;
        Ok(tags.iter().flatten().any(|tag| tag == name))
    }

    /// Returns the short name of the checked-out branch.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD is unborn or detached.
    pub fn current_branch(&self) -> GitResult<String> {
        let head = self.inner.head()?;
        if !head.is_branch() {
            return Err(GitError::DetachedHead);
        }
        head.shorthand()
            .map(String::from)
            .ok_or(GitError::DetachedHead)
    }

    /// Fetches the current branch from the remote and fast-forwards to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the branches diverged.
    pub fn pull(&self, credentials: &Credentials) -> GitResult<()> {
        let branch = self.current_branch()?;
        let mut remote = self.find_remote()?;
        debug!(%branch, "fetching from remote");
        remote.fetch(
            &[branch.as_str()],
            Some(&mut fetch_options(credentials)),
            None,
        )?;

        let fetch_head = self.inner.find_reference("FETCH_HEAD")?;
        let fetched = self.inner.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = self.inner.merge_analysis(&[&fetched])?;

        if analysis.is_up_to_date() {
            debug!(%branch, "already up to date");
            return Ok(());
        }
        if !analysis.is_fast_forward() {
            return Err(GitError::NotFastForward(branch));
        }

        let refname = format!("refs/heads/{branch}");
        let mut reference = self.inner.find_reference(&refname)?;
        reference.set_target(fetched.id(), "releasekit: fast-forward")?;
        self.inner.set_head(&refname)?;
        self.inner
            .checkout_head(Some(CheckoutBuilder::new().force()))?;

        info!(%branch, commit = %fetched.id(), "fast-forwarded");
        Ok(())
    }

    /// Stages every change in the working tree, removals included.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be updated.
    pub fn stage_all(&self) -> GitResult<()> {
        let mut index = self.inner.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;
        Ok(())
    }

    /// Commits the index on top of HEAD and returns the new commit id.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit cannot be written.
    pub fn commit(&self, author: &Author, message: &str) -> GitResult<String> {
        let sig = author.signature()?;
        let tree_id = self.inner.index()?.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;

        let parent = match self.inner.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        info!(commit = %oid, %message, "created commit");

        Ok(oid.to_string())
    }

    /// Creates an annotated tag pointing at `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is unknown or the tag already exists.
    pub fn create_tag(&self, name: &str, target: &str, tagger: &Author) -> GitResult<()> {
        let oid = Oid::from_str(target)?;
        let object = self.inner.find_object(oid, None)?;
        let sig = tagger.signature()?;

        self.inner.tag(name, &object, &sig, name, false)?;
        info!(tag = %name, %target, "created tag");

        Ok(())
    }

    /// Pushes the current branch to the remote.
    ///
    /// Nothing to send is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails or the remote rejects it.
    pub fn push(&self, credentials: &Credentials) -> GitResult<()> {
        let branch = self.current_branch()?;
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        self.push_refspecs(&[refspec], credentials)
    }

    /// Pushes every local tag to the remote.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails or the remote rejects it.
    pub fn push_tags(&self, credentials: &Credentials) -> GitResult<()> {
        let refspecs: Vec<String> = self
            .tags()?
            .iter()
            .map(|tag| format!("refs/tags/{tag}:refs/tags/{tag}"))
            .collect();

        if refspecs.is_empty() {
            debug!("no tags to push");
            return Ok(());
        }
        self.push_refspecs(&refspecs, credentials)
    }

    fn push_refspecs(&self, refspecs: &[String], credentials: &Credentials) -> GitResult<()> {
        let mut remote = self.find_remote()?;
        debug!(?refspecs, "pushing to remote");

        let mut rejections: Vec<(String, String)> = Vec::new();
        {
            let mut callbacks = remote_callbacks(credentials);
            callbacks.push_update_reference(|reference, status| {
                if let Some(message) = status {
                    rejections.push((reference.to_string(), message.to_string()));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote.push(refspecs, Some(&mut options))?;
        }

        if let Some((reference, message)) = rejections.into_iter().next() {
            return Err(GitError::PushRejected { reference, message });
        }
        Ok(())
    }

    fn find_remote(&self) -> GitResult<git2::Remote<'_>> {
        self.inner
            .find_remote(REMOTE_NAME)
            .map_err(|_| GitError::RemoteNotFound(REMOTE_NAME.to_string()))
    }
}

/// Callbacks answering credential prompts once; libgit2 retries forever otherwise.
fn remote_callbacks(credentials: &Credentials) -> RemoteCallbacks<'_> {
    let attempted = Cell::new(false);
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, _username, _allowed| {
        if attempted.replace(true) {
            return Err(git2::Error::from_str("remote rejected the access token"));
        }
        Cred::userpass_plaintext(&credentials.username, &credentials.token)
    });
    callbacks
}

fn fetch_options(credentials: &Credentials) -> FetchOptions<'_> {
    let mut options = FetchOptions::new();
    options.remote_callbacks(remote_callbacks(credentials));
    options
}
