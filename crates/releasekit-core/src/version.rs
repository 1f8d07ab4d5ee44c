//! Three-component versions as they appear in changelog headers.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static TRIPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\.([0-9]+)\.([0-9]+)").expect("invalid regex"));

/// Errors raised while reading a version out of text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    /// No `<int>.<int>.<int>` substring in the input.
    #[error("no version found in {0:?}")]
    NotFound(String),

    /// A component does not fit in a `u64`.
    #[error("invalid {component} component {value:?} in {input:?}")]
    InvalidComponent {
        component: Component,
        value: String,
        input: String,
    },

    /// Bumping would take a component past `u64::MAX`.
    #[error("cannot bump {component} of {version}: component is at its maximum")]
    Overflow { component: Component, version: Version },
}

/// Which field of a version a bump applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Major,
    Minor,
    Patch,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
        }
    }
}

/// A `major.minor.patch` version.
///
/// Ordering compares major, then minor, then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Version written into a freshly seeded changelog.
    pub const INITIAL: Self = Self::new(1, 0, 0);

    /// Creates a new version.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Extracts the first `<int>.<int>.<int>` found anywhere in `input`.
    ///
    /// Text around the match is ignored, so a whole header line can be passed.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no match or a component overflows.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let captures = TRIPLE
            .captures(input)
            .ok_or_else(|| VersionError::NotFound(input.to_string()))?;

        let component = |index: usize, component: Component| {
            let value = &captures[index];
            value
                .parse::<u64>()
                .map_err(|_| VersionError::InvalidComponent {
                    component,
                    value: value.to_string(),
                    input: input.to_string(),
                })
        };

        Ok(Self::new(
            component(1, Component::Major)?,
            component(2, Component::Minor)?,
            component(3, Component::Patch)?,
        ))
    }

    /// Returns a copy with exactly one component incremented.
    ///
    /// Lower components are left as they are: bumping the minor of `1.2.3`
    /// gives `1.3.3`, not `1.3.0`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Overflow`] if the component is `u64::MAX`.
    pub fn bump(self, component: Component) -> Result<Self, VersionError> {
        let mut next = self;
        let field = match component {
            Component::Major => &mut next.major,
            Component::Minor => &mut next.minor,
            Component::Patch => &mut next.patch,
        };
        *field = field.checked_add(1).ok_or(VersionError::Overflow {
            component,
            version: self,
        })?;
        Ok(next)
    }

    /// Returns the value of one component.
    #[must_use]
    pub fn get(self, component: Component) -> u64 {
        match component {
            Component::Major => self.major,
            Component::Minor => self.minor,
            Component::Patch => self.patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
