//! Site paths and prefix patterns.
//!
//! A [`SitePath`] is a root-relative URL path such as `/calculators/area`.
//! A [`PathPattern`] is either an exact path (`/404`) or a prefix ending in a
//! wildcard (`/api/*`), matched case-sensitively from the start of a path.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A root-relative URL path. Always begins with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SitePath(String);

impl SitePath {
    /// Parse a path, rejecting anything that is not root-relative.
    pub fn parse(path: impl Into<String>) -> Result<Self> {
        let path = path.into();

        if !path.starts_with('/') {
            return Err(CoreError::path(path, "must start with '/'"));
        }

        if path.starts_with("//") {
            return Err(CoreError::path(path, "must not be protocol-relative"));
        }

        if let Some(c) = path
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '?' | '#'))
        {
            return Err(CoreError::path(path, format!("must not contain {c:?}")));
        }

        Ok(Self(path))
    }

    /// The path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SitePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SitePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for SitePath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SitePath {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<SitePath> for String {
    fn from(path: SitePath) -> Self {
        path.0
    }
}

/// An exclusion pattern: exact path, or prefix with a trailing `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PathPattern {
    /// Matches exactly this path.
    Exact(String),
    /// Matches any path starting with this prefix (wildcard stripped).
    Prefix(String),
}

impl PathPattern {
    /// Build a prefix pattern from an already-stripped prefix.
    #[must_use]
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Build an exact-match pattern.
    #[must_use]
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }

    /// Parse a pattern such as `/api/*` or `/404`.
    pub fn parse(pattern: &str) -> Result<Self> {
        if !pattern.starts_with('/') {
            return Err(CoreError::pattern(pattern, "must start with '/'"));
        }

        match pattern.find('*') {
            None => Ok(Self::Exact(pattern.to_string())),
            Some(idx) if idx == pattern.len() - 1 => {
                Ok(Self::Prefix(pattern[..idx].to_string()))
            }
            Some(_) => Err(CoreError::pattern(
                pattern,
                "wildcard '*' is only allowed as the last character",
            )),
        }
    }

    /// Whether `path` matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact.as_str(),
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }

    /// Whether every path starting with `prefix` is matched by this pattern.
    #[must_use]
    pub fn covers_prefix(&self, prefix: &str) -> bool {
        match self {
            Self::Exact(_) => false,
            Self::Prefix(own) => prefix.starts_with(own.as_str()),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(exact) => f.write_str(exact),
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
        }
    }
}

impl FromStr for PathPattern {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PathPattern {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PathPattern> for String {
    fn from(pattern: PathPattern) -> Self {
        pattern.to_string()
    }
}
