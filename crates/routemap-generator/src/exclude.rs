//! Sitemap exclusion filter.

use routemap_core::{PathPattern, SitePath};
use tracing::debug;

/// Drops paths matching any exclusion pattern before metadata assignment.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    patterns: Vec<PathPattern>,
}

impl ExclusionFilter {
    /// Create a filter from exclusion patterns.
    #[must_use]
    pub fn new(patterns: Vec<PathPattern>) -> Self {
        Self { patterns }
    }

    /// The first pattern excluding `path`, if any.
    #[must_use]
    pub fn matching_pattern(&self, path: &SitePath) -> Option<&PathPattern> {
        self.patterns.iter().find(|p| p.matches(path.as_str()))
    }

    /// Whether `path` is excluded.
    #[must_use]
    pub fn is_excluded(&self, path: &SitePath) -> bool {
        self.matching_pattern(path).is_some()
    }

    /// Keep the paths that are not excluded, preserving order.
    pub fn filter(&self, paths: impl IntoIterator<Item = SitePath>) -> Vec<SitePath> {
        paths
            .into_iter()
            .filter(|path| match self.matching_pattern(path) {
                Some(pattern) => {
                    debug!(path = %path, pattern = %pattern, "excluded from sitemap");
                    false
                }
                None => true,
            })
            .collect()
    }
}
