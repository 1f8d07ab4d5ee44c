//! Identities used for commits, tags and remote access.

use std::fmt;

use git2::Signature;

use crate::GitResult;

/// Name and email stamped on release commits and tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    /// Creates a new author.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Builds a signature timestamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if git rejects the name or email.
    pub fn signature(&self) -> GitResult<Signature<'static>> {
        Ok(Signature::now(&self.name, &self.email)?)
    }
}

/// HTTPS basic-auth credentials for the remote.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    /// Creates new credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}
