//! Robots.txt generation.
//!
//! Generates the robots.txt file for search engine crawlers. The output is a
//! straight, order-preserving serialization of the configured crawl policies
//! and does not depend on the site's route list.

use std::{
    fs,
    path::{Path, PathBuf},
};

use routemap_core::{Config, CrawlPolicy};
use thiserror::Error;
use tracing::info;

/// Robots generation errors.
#[derive(Debug, Error)]
pub enum RobotsError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for robots generation.
pub type Result<T> = std::result::Result<T, RobotsError>;

/// Robots.txt generator.
#[derive(Debug)]
pub struct RobotsGenerator {
    config: Config,
}

impl RobotsGenerator {
    /// Create a new robots generator.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Render robots.txt, pointing crawlers at `sitemap_url`.
    #[must_use]
    pub fn render(&self, sitemap_url: &str) -> String {
        let mut out = String::new();

        for policy in &self.config.robots.policies {
            out.push_str(&format!("# {}\n", policy.user_agent));
            out.push_str(&format!("User-agent: {}\n", policy.user_agent));

            for prefix in &policy.allow {
                out.push_str(&format!("Allow: {prefix}\n"));
            }

            for prefix in &policy.disallow {
                out.push_str(&format!("Disallow: {prefix}\n"));
            }

            out.push('\n');
        }

        out.push_str("# Host\n");
        out.push_str(&format!("Host: {}\n", self.config.site.url.trim_end_matches('/')));
        out.push('\n');

        out.push_str("# Sitemaps\n");
        out.push_str(&format!("Sitemap: {sitemap_url}\n"));
        for extra in &self.config.robots.additional_sitemaps {
            out.push_str(&format!("Sitemap: {extra}\n"));
        }

        out
    }

    /// Write robots.txt into `output_dir`. Returns `None` when disabled.
    pub fn generate(&self, output_dir: &Path, sitemap_url: &str) -> Result<Option<PathBuf>> {
        if !self.config.robots.enabled {
            return Ok(None);
        }

        let path = output_dir.join("robots.txt");
        fs::write(&path, self.render(sitemap_url))?;

        info!(path = %path.display(), policies = self.config.robots.policies.len(), "generated robots.txt");
        Ok(Some(path))
    }
}

/// The policy group that applies to `user_agent`: an exact (case-insensitive)
/// match, else the `*` group.
#[must_use]
pub fn policy_for<'a>(policies: &'a [CrawlPolicy], user_agent: &str) -> Option<&'a CrawlPolicy> {
    policies
        .iter()
        .find(|p| p.user_agent.eq_ignore_ascii_case(user_agent))
        .or_else(|| policies.iter().find(|p| p.is_wildcard()))
}

/// Whether `user_agent` may crawl `path` under `policies`.
///
/// The longest matching prefix wins; on a tie, allow wins. Paths no rule
/// mentions are allowed.
#[must_use]
pub fn is_crawl_allowed(policies: &[CrawlPolicy], user_agent: &str, path: &str) -> bool {
    let Some(policy) = policy_for(policies, user_agent) else {
        return true;
    };

    let longest = |prefixes: &[String]| {
        prefixes
            .iter()
            .filter(|prefix| path.starts_with(prefix.as_str()))
            .map(String::len)
            .max()
    };

    match (longest(&policy.allow), longest(&policy.disallow)) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(allow), Some(disallow)) => allow >= disallow,
    }
}
