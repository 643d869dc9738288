//! Route enumeration.
//!
//! Produces the ordered list of site paths a build runs over, either from a
//! plain routes file or by walking a static export of the site.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use routemap_core::{CoreError, SitePath};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Route collection errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Route source does not exist.
    #[error("route source not found: {0}")]
    NotFound(PathBuf),

    /// A routes file line that is not a valid site path.
    #[error("invalid route on line {line}: {error}")]
    InvalidRoute { line: usize, error: CoreError },
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Where the route list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSource {
    /// Text file, one path per line.
    File(PathBuf),

    /// Static export directory of HTML files.
    ExportDir(PathBuf),
}

/// Collects site routes from a [`RouteSource`].
#[derive(Debug)]
pub struct RouteCollector {
    source: RouteSource,
}

impl RouteCollector {
    /// Create a new route collector.
    #[must_use]
    pub fn new(source: RouteSource) -> Self {
        Self { source }
    }

    /// Collect every route, in source order.
    pub fn collect(&self) -> Result<Vec<SitePath>> {
        let routes = match &self.source {
            RouteSource::File(path) => {
                if !path.is_file() {
                    return Err(CollectorError::NotFound(path.clone()));
                }
                info!(file = %path.display(), "reading routes file");
                parse_routes(&fs::read_to_string(path)?)?
            }
            RouteSource::ExportDir(dir) => {
                if !dir.is_dir() {
                    return Err(CollectorError::NotFound(dir.clone()));
                }
                info!(dir = %dir.display(), "scanning exported site");
                scan_export_dir(dir)?
            }
        };

        info!(count = routes.len(), "collected routes");
        Ok(routes)
    }
}

/// Parse a routes file: one path per line, blank lines and `#` comments skipped.
pub fn parse_routes(text: &str) -> Result<Vec<SitePath>> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, route)| {
            SitePath::parse(route).map_err(|error| CollectorError::InvalidRoute { line, error })
        })
        .collect()
}

/// Walk a static export and map its HTML files to routes, sorted.
pub fn scan_export_dir(dir: &Path) -> Result<Vec<SitePath>> {
    let mut routes = Vec::new();

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_internal(&e.file_name().to_string_lossy()));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };

        match html_route(relative) {
            Some(route) => match SitePath::parse(route) {
                Ok(path) => routes.push(path),
                Err(e) => warn!(file = %relative.display(), error = %e, "skipping file"),
            },
            None => debug!(file = %relative.display(), "not a page"),
        }
    }

    routes.sort();
    routes.dedup();
    Ok(routes)
}

/// Map a file path relative to the export root to its route.
///
/// `index.html` → `/`, `a/index.html` → `/a`, `a/b.html` → `/a/b`.
fn html_route(relative: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?),
            _ => return None,
        }
    }

    let file = segments.pop()?;
    let stem = file.strip_suffix(".html")?;
    if stem != "index" {
        segments.push(stem);
    }

    Some(format!("/{}", segments.join("/")))
}

/// Framework internals (`_next`) and hidden files are not pages.
fn is_internal(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}
