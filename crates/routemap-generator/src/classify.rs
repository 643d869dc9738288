//! Sitemap metadata assignment.
//!
//! Every site path is classified against a fixed, ordered rule table. The first
//! rule that matches decides the priority and change frequency; paths no rule
//! matches fall into the configured default bucket. The table order matters
//! because prefixes can overlap.

use chrono::{DateTime, Utc};
use routemap_core::{ChangeFreq, SitePath, config::SitemapConfig};

use crate::sitemap::SitemapEntry;

/// Priority and change frequency assigned to a class of paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    /// Relative crawl importance, 0.0 to 1.0.
    pub priority: f32,

    /// Expected change frequency.
    pub changefreq: ChangeFreq,
}

#[derive(Debug, Clone, Copy)]
enum Matcher {
    Exact(&'static str),
    Prefix(&'static str),
}

impl Matcher {
    fn matches(self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(prefix) => path.starts_with(prefix),
        }
    }
}

#[derive(Debug)]
struct Rule {
    name: &'static str,
    matcher: Matcher,
    bucket: Bucket,
}

/// Evaluated top to bottom, first match wins.
const RULES: &[Rule] = &[
    Rule {
        name: "home",
        matcher: Matcher::Exact("/"),
        bucket: Bucket {
            priority: 1.0,
            changefreq: ChangeFreq::Daily,
        },
    },
    Rule {
        name: "category",
        matcher: Matcher::Prefix("/category/"),
        bucket: Bucket {
            priority: 0.8,
            changefreq: ChangeFreq::Weekly,
        },
    },
    Rule {
        name: "calculator",
        matcher: Matcher::Prefix("/calculators/"),
        bucket: Bucket {
            priority: 0.9,
            changefreq: ChangeFreq::Monthly,
        },
    },
];

/// Name reported for paths that fall through every rule.
pub const DEFAULT_CLASS: &str = "default";

/// Result of classifying a single path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Name of the matching rule, or [`DEFAULT_CLASS`].
    pub class: &'static str,

    /// Assigned priority and change frequency.
    pub bucket: Bucket,
}

/// Assigns sitemap metadata to site paths.
#[derive(Debug, Clone)]
pub struct MetadataEngine {
    default: Bucket,
}

impl MetadataEngine {
    /// Create an engine with an explicit default bucket.
    #[must_use]
    pub fn new(default: Bucket) -> Self {
        Self { default }
    }

    /// Create an engine whose default bucket comes from the sitemap config.
    #[must_use]
    pub fn from_config(config: &SitemapConfig) -> Self {
        Self::new(Bucket {
            priority: config.priority,
            changefreq: config.changefreq,
        })
    }

    /// Classify a path. Total: every path gets exactly one bucket.
    #[must_use]
    pub fn classify(&self, path: &SitePath) -> Classification {
        for rule in RULES {
            if rule.matcher.matches(path.as_str()) {
                return Classification {
                    class: rule.name,
                    bucket: rule.bucket,
                };
            }
        }

        Classification {
            class: DEFAULT_CLASS,
            bucket: self.default,
        }
    }

    /// Build the sitemap entry for `path`, stamped with `now`.
    #[must_use]
    pub fn assign(&self, path: SitePath, now: DateTime<Utc>) -> SitemapEntry {
        let Classification { bucket, .. } = self.classify(&path);

        SitemapEntry {
            loc: path,
            changefreq: bucket.changefreq,
            priority: bucket.priority,
            lastmod: now,
        }
    }
}

impl Default for MetadataEngine {
    fn default() -> Self {
        Self::from_config(&SitemapConfig::default())
    }
}
