use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A filesystem path guaranteed to stay **inside the project root**.
///
/// Every write, injection and fetch target goes through this type, so a
/// recipe can never touch files outside the directory it is applied to.
///
/// The check is lexical: `config/../Gemfile` is accepted and normalised to
/// `Gemfile`, while `../escape.txt` and `a/../../b` are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath(PathBuf);

impl RelativePath {
    /// Validate and normalise a project-relative path.
    pub fn try_new(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let raw = path.as_ref();
        let display = raw.display().to_string();

        if raw.as_os_str().is_empty() {
            return Err(DomainError::EmptyPath);
        }
        if raw.is_absolute() || raw.has_root() {
            return Err(DomainError::AbsolutePathNotAllowed { path: display });
        }

        let mut normalised = PathBuf::new();
        for component in raw.components() {
            match component {
                Component::Normal(part) => normalised.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalised.pop() {
                        return Err(DomainError::PathTraversal { path: display });
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(DomainError::AbsolutePathNotAllowed { path: display });
                }
            }
        }

        if normalised.as_os_str().is_empty() {
            return Err(DomainError::EmptyPath);
        }

        Ok(Self(normalised))
    }

    /// Borrow as a `Path`.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolve against a project root.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_new(s)
    }
}

impl TryFrom<String> for RelativePath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::try_new(s)
    }
}

impl From<RelativePath> for String {
    fn from(p: RelativePath) -> Self {
        p.to_string()
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A literal substring used to locate an insertion point.
///
/// Anchors are never interpreted as patterns; `config.*` matches only lines
/// that literally contain `config.*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Anchor(String);

impl Anchor {
    pub fn try_new(anchor: impl Into<String>) -> Result<Self, DomainError> {
        let anchor = anchor.into();
        if anchor.is_empty() {
            return Err(DomainError::EmptyAnchor);
        }
        if anchor.contains(['\n', '\r']) {
            return Err(DomainError::InvalidAnchor {
                anchor,
                reason: "contains a line break".into(),
            });
        }
        Ok(Self(anchor))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if `line` contains this anchor.
    pub fn matches(&self, line: &str) -> bool {
        line.contains(self.0.as_str())
    }
}

impl TryFrom<String> for Anchor {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::try_new(s)
    }
}

impl From<Anchor> for String {
    fn from(a: Anchor) -> Self {
        a.0
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
