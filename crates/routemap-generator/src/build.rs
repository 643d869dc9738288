//! Build orchestration.
//!
//! Runs one pass over the route list: rewrite legacy paths, drop excluded
//! paths, assign sitemap metadata, then write the sitemap, robots.txt and the
//! route policy manifest.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use chrono::{DateTime, Utc};
use routemap_core::{Config, SitePath};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    classify::MetadataEngine,
    collector::{CollectorError, RouteCollector, RouteSource},
    exclude::ExclusionFilter,
    policy::{PolicyError, RoutePolicy},
    robots::{RobotsError, RobotsGenerator},
    sitemap::{SitemapEntry, SitemapError, SitemapGenerator},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Collector error.
    #[error("collector error: {0}")]
    Collector(#[from] CollectorError),

    /// Route policy error.
    #[error("route policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Sitemap generation error.
    #[error("sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    /// Robots generation error.
    #[error("robots error: {0}")]
    Robots(#[from] RobotsError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] routemap_core::CoreError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of routes read from the source.
    pub routes: usize,

    /// Number of routes rewritten by a redirect.
    pub rewritten: usize,

    /// Number of duplicate routes dropped after rewriting.
    pub duplicates: usize,

    /// Number of routes dropped by the exclusion filter.
    pub excluded: usize,

    /// Number of sitemap entries written.
    pub entries: usize,

    /// Number of sitemap files written, index included.
    pub sitemap_files: usize,

    /// Whether robots.txt was written.
    pub robots: bool,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Sitemap entries planned for a route list, with counters.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Entries in route order.
    pub entries: Vec<SitemapEntry>,

    /// Counters gathered while planning.
    pub stats: BuildStats,
}

/// Orchestrates a full build.
#[derive(Debug)]
pub struct Builder {
    config: Config,
    source: RouteSource,
    output_dir: PathBuf,
    now: DateTime<Utc>,
}

impl Builder {
    /// Create a new builder. The generation time defaults to now.
    #[must_use]
    pub fn new(config: Config, source: RouteSource, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            source,
            output_dir: output_dir.into(),
            now: Utc::now(),
        }
    }

    /// Use a fixed generation time, for reproducible output.
    #[must_use]
    pub fn with_timestamp(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Execute the full build.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();

        info!(
            source = ?self.source,
            output = %self.output_dir.display(),
            "starting build"
        );

        self.config.validate()?;

        let routes = RouteCollector::new(self.source.clone()).collect()?;
        let Plan { entries, mut stats } = plan(&self.config, routes, self.now)?;

        fs::create_dir_all(&self.output_dir)?;

        let sitemap = SitemapGenerator::new(self.config.clone()).write(
            &entries,
            &self.output_dir,
            self.now,
        )?;
        stats.sitemap_files = sitemap.files.len();

        stats.robots = RobotsGenerator::new(self.config.clone())
            .generate(&self.output_dir, &sitemap.url)?
            .is_some();

        RoutePolicy::new(&self.config).write_manifest(&self.output_dir)?;

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            routes = stats.routes,
            rewritten = stats.rewritten,
            excluded = stats.excluded,
            entries = stats.entries,
            sitemap_files = stats.sitemap_files,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Turn a route list into sitemap entries without touching the filesystem.
///
/// Legacy paths are rewritten first, so the exclusion filter and the
/// metadata engine only ever see current paths. When a rewrite makes two
/// routes equal, the first occurrence wins.
pub fn plan(config: &Config, routes: Vec<SitePath>, now: DateTime<Utc>) -> Result<Plan> {
    let policy = RoutePolicy::new(config);
    let filter = ExclusionFilter::new(config.sitemap.exclude.clone());
    let engine = MetadataEngine::from_config(&config.sitemap);

    let mut stats = BuildStats {
        routes: routes.len(),
        ..BuildStats::default()
    };

    let mut seen = HashSet::with_capacity(routes.len());
    let mut current = Vec::with_capacity(routes.len());

    for route in routes {
        let rewrite = policy.rewrite(&route)?;
        if rewrite.redirected {
            stats.rewritten += 1;
        }

        if seen.insert(rewrite.path.clone()) {
            current.push(rewrite.path);
        } else {
            debug!(path = %rewrite.path, "dropping duplicate route");
            stats.duplicates += 1;
        }
    }

    let kept = filter.filter(current);
    stats.excluded = seen.len() - kept.len();

    let entries: Vec<SitemapEntry> = kept
        .into_iter()
        .map(|path| engine.assign(path, now))
        .collect();
    stats.entries = entries.len();

    Ok(Plan { entries, stats })
}
