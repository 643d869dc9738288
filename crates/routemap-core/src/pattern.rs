//! Route patterns with named parameters.
//!
//! Patterns are `/`-separated segments. Each segment is a literal, a `:name`
//! parameter matching exactly one segment, or a `:name*` catch-all matching
//! zero or more trailing segments (only valid as the last segment).
//!
//! ```
//! use routemap_core::RoutePattern;
//!
//! let legacy = RoutePattern::parse("/calculator/:slug").unwrap();
//! let params = legacy.captures("/calculator/loan").unwrap();
//! assert_eq!(params.get("slug"), Some("loan"));
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

/// A parsed route pattern such as `/embed/:path*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

/// Parameter values bound by a successful match, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Value bound to `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl RoutePattern {
    /// Parse a route pattern.
    pub fn parse(source: &str) -> Result<Self> {
        let Some(rest) = source.strip_prefix('/') else {
            return Err(CoreError::pattern(source, "must start with '/'"));
        };

        let mut segments = Vec::new();
        if !rest.is_empty() {
            let parts: Vec<&str> = rest.split('/').collect();
            let last = parts.len() - 1;

            for (idx, part) in parts.into_iter().enumerate() {
                let segment = parse_segment(source, part)?;
                if matches!(segment, Segment::CatchAll(_)) && idx != last {
                    return Err(CoreError::pattern(
                        source,
                        "catch-all parameter must be the last segment",
                    ));
                }
                segments.push(segment);
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of all parameters, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// The literal part of the pattern before the first parameter.
    ///
    /// `/embed/:path*` gives `/embed/`, a fully literal pattern gives itself.
    #[must_use]
    pub fn literal_prefix(&self) -> String {
        let mut prefix = String::from("/");
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => {
                    if !prefix.ends_with('/') {
                        prefix.push('/');
                    }
                    prefix.push_str(literal);
                }
                Segment::Param(_) | Segment::CatchAll(_) => {
                    if !prefix.ends_with('/') {
                        prefix.push('/');
                    }
                    break;
                }
            }
        }
        prefix
    }

    /// Whether `path` matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Match `path` and return the bound parameters.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        let mut params = Vec::new();
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if parts.get(idx) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(idx).filter(|value| !value.is_empty())?;
                    params.push((name.clone(), (*value).to_string()));
                }
                Segment::CatchAll(name) => {
                    let tail = parts.get(idx..).unwrap_or_default().join("/");
                    params.push((name.clone(), tail));
                    return Some(Params(params));
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(Params(params))
    }

    /// Substitute `params` into this pattern, producing a concrete path.
    ///
    /// An empty catch-all drops its segment entirely.
    pub fn render(&self, params: &Params) -> Result<String> {
        let mut parts: Vec<&str> = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => parts.push(literal),
                Segment::Param(name) | Segment::CatchAll(name) => {
                    let value = params.get(name).ok_or_else(|| {
                        CoreError::pattern(&self.source, format!("parameter :{name} is not bound"))
                    })?;
                    if !value.is_empty() {
                        parts.push(value);
                    }
                }
            }
        }

        Ok(format!("/{}", parts.join("/")))
    }
}

fn parse_segment(source: &str, part: &str) -> Result<Segment> {
    let Some(name) = part.strip_prefix(':') else {
        if part.is_empty() {
            return Err(CoreError::pattern(source, "empty path segment"));
        }
        if part.contains('*') {
            return Err(CoreError::pattern(
                source,
                "wildcards are only allowed on named parameters",
            ));
        }
        return Ok(Segment::Literal(part.to_string()));
    };

    let (name, catch_all) = match name.strip_suffix('*') {
        Some(name) => (name, true),
        None => (name, false),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CoreError::pattern(
            source,
            format!("invalid parameter name in segment {part:?}"),
        ));
    }

    Ok(if catch_all {
        Segment::CatchAll(name.to_string())
    } else {
        Segment::Param(name.to_string())
    })
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for RoutePattern {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoutePattern {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RoutePattern> for String {
    fn from(pattern: RoutePattern) -> Self {
        pattern.source
    }
}
