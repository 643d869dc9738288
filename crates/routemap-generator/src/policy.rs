//! Route policy resolution.
//!
//! Resolves what the web framework should do for a given path: which legacy
//! redirect applies, which response headers are sent, and whether the page may
//! be embedded in a frame on another origin. The policy is exported as a JSON
//! manifest for the framework to consume at serve time.

use std::{
    fs,
    path::{Path, PathBuf},
};

use routemap_core::{Config, Header, HeaderRule, RedirectRule, SitePath};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Route policy errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A redirect produced something that is not a valid site path.
    #[error("redirect {source_pattern} produced an invalid path: {error}")]
    Rewrite {
        source_pattern: String,
        error: routemap_core::CoreError,
    },

    /// JSON encoding error.
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Header controlling whether a page may be framed.
pub const FRAME_OPTIONS: &str = "X-Frame-Options";

/// Whether a path may be embedded in a frame on another origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbedPolicy {
    AllowEmbed,
    DenyEmbed,
}

/// Outcome of applying redirects to a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Path after redirects.
    pub path: SitePath,

    /// Whether a redirect rule applied.
    pub redirected: bool,

    /// Whether the applied redirect is permanent.
    pub permanent: bool,
}

/// Resolved route policy for a site.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    site_url: String,
    site_name: String,
    headers: Vec<HeaderRule>,
    redirects: Vec<RedirectRule>,
}

impl RoutePolicy {
    /// Create a route policy from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            site_url: config.site.url.clone(),
            site_name: config.site.name.clone(),
            headers: config.headers.clone(),
            redirects: config.redirects.clone(),
        }
    }

    /// Apply the first matching redirect to `path`.
    ///
    /// Redirect targets are not re-matched, so a rule can never loop.
    pub fn rewrite(&self, path: &SitePath) -> Result<Rewrite> {
        for rule in &self.redirects {
            let Some(params) = rule.source.captures(path.as_str()) else {
                continue;
            };

            let rewritten = rule
                .destination
                .render(&params)
                .and_then(SitePath::parse)
                .map_err(|error| PolicyError::Rewrite {
                    source_pattern: rule.source.to_string(),
                    error,
                })?;

            debug!(from = %path, to = %rewritten, permanent = rule.permanent, "rewrote legacy path");

            return Ok(Rewrite {
                path: rewritten,
                redirected: true,
                permanent: rule.permanent,
            });
        }

        Ok(Rewrite {
            path: path.clone(),
            redirected: false,
            permanent: false,
        })
    }

    /// Headers for `path`. Every matching rule applies; later rules override
    /// earlier values for the same (case-insensitive) key.
    #[must_use]
    pub fn headers_for(&self, path: &SitePath) -> Vec<Header> {
        let mut resolved: Vec<Header> = Vec::new();

        for rule in self.headers.iter().filter(|r| r.source.matches(path.as_str())) {
            for header in &rule.headers {
                match resolved
                    .iter_mut()
                    .find(|h| h.key.eq_ignore_ascii_case(&header.key))
                {
                    Some(existing) => existing.value.clone_from(&header.value),
                    None => resolved.push(header.clone()),
                }
            }
        }

        resolved
    }

    /// Embed policy for `path`, derived from its resolved frame options.
    #[must_use]
    pub fn embed_policy(&self, path: &SitePath) -> EmbedPolicy {
        let frame_options = self
            .headers_for(path)
            .into_iter()
            .find(|h| h.key.eq_ignore_ascii_case(FRAME_OPTIONS));

        match frame_options {
            Some(header) if header.value.eq_ignore_ascii_case("ALLOWALL") => {
                EmbedPolicy::AllowEmbed
            }
            _ => EmbedPolicy::DenyEmbed,
        }
    }

    /// Serialize the policy as a JSON manifest.
    pub fn to_json(&self) -> Result<String> {
        let manifest = Manifest {
            constants: Constants {
                site_url: &self.site_url,
                site_name: &self.site_name,
            },
            headers: &self.headers,
            redirects: self
                .redirects
                .iter()
                .map(|rule| ManifestRedirect {
                    source: rule.source.as_str(),
                    destination: rule.destination.as_str(),
                    permanent: rule.permanent,
                    status_code: if rule.permanent { 308 } else { 307 },
                })
                .collect(),
        };

        Ok(serde_json::to_string_pretty(&manifest)?)
    }

    /// Write `route-policy.json` into `output_dir`.
    pub fn write_manifest(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join("route-policy.json");
        fs::write(&path, self.to_json()?)?;

        info!(path = %path.display(), "generated route policy manifest");
        Ok(path)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    constants: Constants<'a>,
    headers: &'a [HeaderRule],
    redirects: Vec<ManifestRedirect<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct Constants<'a> {
    site_url: &'a str,
    site_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestRedirect<'a> {
    source: &'a str,
    destination: &'a str,
    permanent: bool,
    status_code: u16,
}
