//! Sitemap generation.
//!
//! Serializes sitemap entries to the sitemaps.org XML protocol, splitting into
//! several files plus a sitemap index when the entry count exceeds the
//! configured per-file maximum.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};
use routemap_core::{ChangeFreq, Config, SitePath};
use thiserror::Error;
use tracing::{debug, info};

/// Sitemap generation errors.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sitemap operations.
pub type Result<T> = std::result::Result<T, SitemapError>;

/// A single sitemap row. Identity is `loc`.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    /// Root-relative location, joined with the site URL on output.
    pub loc: SitePath,

    /// Change frequency.
    pub changefreq: ChangeFreq,

    /// Priority (0.0 to 1.0).
    pub priority: f32,

    /// Generation time.
    pub lastmod: DateTime<Utc>,
}

/// Files written for one sitemap run.
#[derive(Debug, Clone, Default)]
pub struct SitemapOutput {
    /// Sitemap files, in order. The index (if any) comes last.
    pub files: Vec<PathBuf>,

    /// Absolute URL crawlers should be pointed at.
    pub url: String,

    /// Whether a sitemap index was written.
    pub indexed: bool,

    /// Number of entries written across all files.
    pub entries: usize,
}

/// Sitemap generator.
#[derive(Debug)]
pub struct SitemapGenerator {
    config: Config,
}

impl SitemapGenerator {
    /// Create a new sitemap generator.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Generate a single `<urlset>` document.
    #[must_use]
    pub fn generate(&self, entries: &[SitemapEntry]) -> String {
        debug!(count = entries.len(), "generating sitemap");

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        xml.push('\n');

        for entry in entries {
            xml.push_str(&self.entry_to_xml(entry));
        }

        xml.push_str("</urlset>\n");
        xml
    }

    fn entry_to_xml(&self, entry: &SitemapEntry) -> String {
        let mut xml = String::from("  <url>\n");

        xml.push_str(&format!(
            "    <loc>{}</loc>\n",
            escape_xml(&self.config.url_for(entry.loc.as_str()))
        ));
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            format_lastmod(&entry.lastmod)
        ));
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.changefreq.as_str()
        ));
        xml.push_str(&format!(
            "    <priority>{}</priority>\n",
            format_priority(entry.priority)
        ));

        xml.push_str("  </url>\n");
        xml
    }

    /// Generate a sitemap index pointing at `sitemaps` (file names relative to
    /// the site root).
    #[must_use]
    pub fn generate_index(&self, sitemaps: &[String], now: DateTime<Utc>) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        xml.push('\n');

        let lastmod = format_lastmod(&now);

        for sitemap in sitemaps {
            xml.push_str("  <sitemap>\n");
            xml.push_str(&format!(
                "    <loc>{}</loc>\n",
                escape_xml(&self.config.url_for(sitemap))
            ));
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
            xml.push_str("  </sitemap>\n");
        }

        xml.push_str("</sitemapindex>\n");
        xml
    }

    /// Write the sitemap file(s) for `entries` into `output_dir`.
    ///
    /// At most `sitemap.size` entries go into one file. When that limit is
    /// exceeded, or `sitemap.index` is set, numbered part files are written
    /// and `sitemap.file_name` becomes an index over them. An empty entry list
    /// still produces an (empty) sitemap. Part files left by an earlier run
    /// are removed first.
    pub fn write(
        &self,
        entries: &[SitemapEntry],
        output_dir: &Path,
        now: DateTime<Utc>,
    ) -> Result<SitemapOutput> {
        let sitemap = &self.config.sitemap;
        let size = sitemap.size.max(1);
        let main_path = output_dir.join(&sitemap.file_name);
        let url = self.config.url_for(&sitemap.file_name);

        let stem = sitemap
            .file_name
            .strip_suffix(".xml")
            .unwrap_or(&sitemap.file_name);
        remove_stale_parts(output_dir, stem)?;

        let mut chunks: Vec<&[SitemapEntry]> = entries.chunks(size).collect();
        if chunks.is_empty() {
            chunks.push(&[]);
        }

        if chunks.len() == 1 && !sitemap.index {
            fs::write(&main_path, self.generate(chunks[0]))?;
            info!(path = %main_path.display(), entries = entries.len(), "generated sitemap");

            return Ok(SitemapOutput {
                files: vec![main_path],
                url,
                indexed: false,
                entries: entries.len(),
            });
        }

        let mut files = Vec::with_capacity(chunks.len() + 1);
        let mut names = Vec::with_capacity(chunks.len());

        for (idx, chunk) in chunks.iter().enumerate() {
            let name = format!("{stem}-{idx}.xml");
            let path = output_dir.join(&name);
            fs::write(&path, self.generate(chunk))?;
            debug!(path = %path.display(), entries = chunk.len(), "wrote sitemap part");

            names.push(name);
            files.push(path);
        }

        fs::write(&main_path, self.generate_index(&names, now))?;
        info!(
            path = %main_path.display(),
            parts = names.len(),
            entries = entries.len(),
            "generated sitemap index"
        );
        files.push(main_path);

        Ok(SitemapOutput {
            files,
            url,
            indexed: true,
            entries: entries.len(),
        })
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-10-18T09:30:00.000Z`.
#[must_use]
pub fn format_lastmod(lastmod: &DateTime<Utc>) -> String {
    lastmod.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Priority with up to three decimals, keeping one for whole numbers
/// (`1.0`, `0.25`).
fn format_priority(priority: f32) -> String {
    let fixed = format!("{priority:.3}");
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

/// Delete `{stem}-N.xml` part files in `dir`.
fn remove_stale_parts(dir: &Path, stem: &str) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    let prefix = format!("{stem}-");
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };

        let is_part = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(".xml"))
            .is_some_and(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()));

        if is_part && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            debug!(path = %entry.path().display(), "removed stale sitemap part");
        }
    }

    Ok(())
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap()
    }

    fn entry(path: &str, priority: f32, changefreq: ChangeFreq) -> SitemapEntry {
        SitemapEntry {
            loc: SitePath::parse(path).unwrap(),
            changefreq,
            priority,
            lastmod: now(),
        }
    }

    fn entries(count: usize) -> Vec<SitemapEntry> {
        (0..count)
            .map(|i| entry(&format!("/calculators/c{i}"), 0.9, ChangeFreq::Monthly))
            .collect()
    }

    #[test]
    fn test_generate_sitemap() {
        let generator = SitemapGenerator::new(Config::default());
        let xml = generator.generate(&[
            entry("/", 1.0, ChangeFreq::Daily),
            entry("/about", 0.7, ChangeFreq::Weekly),
        ]);

        assert!(xml.starts_with(r#"<?xml version="1.0""#));
        assert!(xml.contains("<urlset"));
        assert!(xml.contains("<loc>https://microcalc.app/</loc>"));
        assert!(xml.contains("<loc>https://microcalc.app/about</loc>"));
        assert!(xml.contains("<changefreq>daily</changefreq>"));
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<priority>0.7</priority>"));
        assert!(xml.contains("<lastmod>2026-10-18T09:30:00.000Z</lastmod>"));
    }

    #[test]
    fn test_generate_is_deterministic_with_frozen_clock() {
        let generator = SitemapGenerator::new(Config::default());
        let list = vec![entry("/calculators/loan", 0.9, ChangeFreq::Monthly)];
        assert_eq!(generator.generate(&list), generator.generate(&list));
    }

    #[test]
    fn test_empty_sitemap() {
        let generator = SitemapGenerator::new(Config::default());
        let xml = generator.generate(&[]);
        assert!(xml.contains("<urlset"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_xml("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_loc_is_escaped() {
        let generator = SitemapGenerator::new(Config::default());
        let xml = generator.generate(&[entry("/terms&conditions", 0.7, ChangeFreq::Weekly)]);
        assert!(xml.contains("<loc>https://microcalc.app/terms&amp;conditions</loc>"));
    }

    #[test]
    fn test_generate_index() {
        let generator = SitemapGenerator::new(Config::default());
        let names = vec!["sitemap-0.xml".to_string(), "sitemap-1.xml".to_string()];

        let xml = generator.generate_index(&names, now());

        assert!(xml.contains("<sitemapindex"));
        assert!(xml.contains("<loc>https://microcalc.app/sitemap-0.xml</loc>"));
        assert!(xml.contains("<loc>https://microcalc.app/sitemap-1.xml</loc>"));
    }

    #[test]
    fn test_write_single_file() {
        let dir = TempDir::new().unwrap();
        let generator = SitemapGenerator::new(Config::default());

        let output = generator.write(&entries(3), dir.path(), now()).unwrap();

        assert!(!output.indexed);
        assert_eq!(output.entries, 3);
        assert_eq!(output.files, vec![dir.path().join("sitemap.xml")]);
        assert_eq!(output.url, "https://microcalc.app/sitemap.xml");
        assert!(!dir.path().join("sitemap-0.xml").exists());
    }

    #[test]
    fn test_write_splits_over_size() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.sitemap.size = 2;
        let generator = SitemapGenerator::new(config);

        let output = generator.write(&entries(5), dir.path(), now()).unwrap();

        assert!(output.indexed);
        assert_eq!(output.files.len(), 4);
        for idx in 0..3 {
            assert!(dir.path().join(format!("sitemap-{idx}.xml")).exists());
        }

        let last = fs::read_to_string(dir.path().join("sitemap-2.xml")).unwrap();
        assert_eq!(last.matches("<url>").count(), 1);

        let index = fs::read_to_string(dir.path().join("sitemap.xml")).unwrap();
        assert!(index.contains("<sitemapindex"));
        assert_eq!(index.matches("<sitemap>").count(), 3);
    }

    #[test]
    fn test_write_exact_size_stays_single() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.sitemap.size = 3;
        let generator = SitemapGenerator::new(config);

        let output = generator.write(&entries(3), dir.path(), now()).unwrap();
        assert!(!output.indexed);
        assert_eq!(output.files.len(), 1);
    }

    #[test]
    fn test_write_forced_index() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.sitemap.index = true;
        let generator = SitemapGenerator::new(config);

        let output = generator.write(&entries(1), dir.path(), now()).unwrap();
        assert!(output.indexed);
        assert!(dir.path().join("sitemap-0.xml").exists());
    }

    #[test]
    fn test_write_empty_entries() {
        let dir = TempDir::new().unwrap();
        let generator = SitemapGenerator::new(Config::default());

        let output = generator.write(&[], dir.path(), now()).unwrap();
        assert_eq!(output.entries, 0);

        let xml = fs::read_to_string(dir.path().join("sitemap.xml")).unwrap();
        assert!(xml.contains("<urlset"));
    }

    #[test]
    fn test_configured_priority_is_not_rounded() {
        let mut config = Config::default();
        config.sitemap.priority = 0.25;
        config.validate().unwrap();

        let engine = crate::classify::MetadataEngine::from_config(&config.sitemap);
        let about = engine.assign(SitePath::parse("/about").unwrap(), now());

        let xml = SitemapGenerator::new(config).generate(&[about]);
        assert!(xml.contains("<priority>0.25</priority>"), "{xml}");
    }

    #[test]
    fn test_format_priority() {
        assert_eq!(format_priority(1.0), "1.0");
        assert_eq!(format_priority(0.0), "0.0");
        assert_eq!(format_priority(0.7), "0.7");
        assert_eq!(format_priority(0.65), "0.65");
        assert_eq!(format_priority(0.125), "0.125");
    }

    #[test]
    fn test_single_file_write_removes_stale_parts() {
        let dir = TempDir::new().unwrap();

        let mut split = Config::default();
        split.sitemap.size = 2;
        SitemapGenerator::new(split)
            .write(&entries(5), dir.path(), now())
            .unwrap();
        assert!(dir.path().join("sitemap-2.xml").exists());

        fs::write(dir.path().join("sitemap-extra.xml"), "<urlset/>").unwrap();

        let output = SitemapGenerator::new(Config::default())
            .write(&entries(5), dir.path(), now())
            .unwrap();

        assert!(!output.indexed);
        for idx in 0..3 {
            assert!(!dir.path().join(format!("sitemap-{idx}.xml")).exists());
        }
        assert!(dir.path().join("sitemap-extra.xml").exists());

        let xml = fs::read_to_string(dir.path().join("sitemap.xml")).unwrap();
        assert_eq!(xml.matches("<url>").count(), 5);
    }

    #[test]
    fn test_smaller_split_removes_extra_parts() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.sitemap.size = 2;
        let generator = SitemapGenerator::new(config);

        generator.write(&entries(5), dir.path(), now()).unwrap();
        let output = generator.write(&entries(3), dir.path(), now()).unwrap();

        assert_eq!(output.files.len(), 3);
        assert!(dir.path().join("sitemap-1.xml").exists());
        assert!(!dir.path().join("sitemap-2.xml").exists());
    }
}
