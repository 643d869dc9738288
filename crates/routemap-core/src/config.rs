//! Site policy configuration.
//!
//! The defaults reproduce the MicroCalc site policy, so an empty file (or no
//! file at all) yields a working configuration.

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    path::PathPattern,
    pattern::RoutePattern,
};

/// Main configuration structure for routemap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Sitemap settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// robots.txt settings.
    #[serde(default)]
    pub robots: RobotsConfig,

    /// Response header rules, applied in order.
    #[serde(default = "default_headers")]
    pub headers: Vec<HeaderRule>,

    /// Redirect rules, first match wins.
    #[serde(default = "default_redirects")]
    pub redirects: Vec<RedirectRule>,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL for the site (e.g., "https://microcalc.app").
    #[serde(default = "default_site_url")]
    pub url: String,

    /// Human-readable site name.
    #[serde(default = "default_site_name")]
    pub name: String,
}

/// Sitemap configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Maximum number of entries per sitemap file.
    #[serde(default = "default_sitemap_size")]
    pub size: usize,

    /// Priority for paths no classification rule matches.
    #[serde(default = "default_priority")]
    pub priority: f32,

    /// Change frequency for paths no classification rule matches.
    #[serde(default = "default_changefreq")]
    pub changefreq: ChangeFreq,

    /// Paths that never appear in the sitemap.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<PathPattern>,

    /// Always write a sitemap index, even for a single sitemap file.
    #[serde(default)]
    pub index: bool,

    /// File name of the sitemap (or sitemap index when split).
    #[serde(default = "default_sitemap_file")]
    pub file_name: String,
}

/// Change frequency hint for sitemap entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    /// The sitemap protocol spelling.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// robots.txt configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotsConfig {
    /// Whether robots.txt is generated.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per user-agent crawl rules, emitted in order.
    #[serde(default = "default_policies")]
    pub policies: Vec<CrawlPolicy>,

    /// Extra absolute sitemap URLs to advertise.
    #[serde(default)]
    pub additional_sitemaps: Vec<String>,
}

/// Crawl permissions for one user agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlPolicy {
    /// User agent token, `*` for all crawlers.
    pub user_agent: String,

    /// Allowed path prefixes.
    #[serde(default)]
    pub allow: Vec<String>,

    /// Disallowed path prefixes.
    #[serde(default)]
    pub disallow: Vec<String>,
}

impl CrawlPolicy {
    /// Whether this policy applies to every crawler.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.user_agent == "*"
    }
}

/// Headers attached to every path matching `source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderRule {
    /// Route pattern selecting paths.
    pub source: RoutePattern,

    /// Headers to set, in order.
    pub headers: Vec<Header>,
}

/// A single response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Rewrite of a legacy route to its current location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectRule {
    /// Pattern the legacy path must match.
    pub source: RoutePattern,

    /// Destination pattern, filled with parameters bound by `source`.
    pub destination: RoutePattern,

    /// Whether the redirect is permanent (308) or temporary (307).
    #[serde(default = "default_true")]
    pub permanent: bool,
}

// Default value functions
fn default_site_url() -> String {
    "https://microcalc.app".to_string()
}

fn default_site_name() -> String {
    "MicroCalc".to_string()
}

fn default_sitemap_size() -> usize {
    7000
}

fn default_priority() -> f32 {
    0.7
}

fn default_changefreq() -> ChangeFreq {
    ChangeFreq::Weekly
}

fn default_exclude() -> Vec<PathPattern> {
    vec![
        PathPattern::prefix("/api/"),
        PathPattern::prefix("/embed/"),
        PathPattern::exact("/404"),
        PathPattern::exact("/500"),
    ]
}

fn default_sitemap_file() -> String {
    "sitemap.xml".to_string()
}

fn default_true() -> bool {
    true
}

fn default_policies() -> Vec<CrawlPolicy> {
    vec![
        CrawlPolicy {
            user_agent: "*".to_string(),
            allow: vec!["/".to_string()],
            disallow: vec!["/api/".to_string(), "/embed/".to_string()],
        },
        CrawlPolicy {
            user_agent: "Googlebot".to_string(),
            allow: vec!["/".to_string()],
            disallow: Vec::new(),
        },
    ]
}

fn route(source: &str) -> RoutePattern {
    // Only called with the literal patterns below.
    RoutePattern::parse(source).unwrap_or_else(|e| unreachable!("built-in route {source}: {e}"))
}

fn default_headers() -> Vec<HeaderRule> {
    vec![
        HeaderRule {
            source: route("/:path*"),
            headers: vec![
                Header::new("X-Frame-Options", "SAMEORIGIN"),
                Header::new("X-Content-Type-Options", "nosniff"),
                Header::new("Referrer-Policy", "origin-when-cross-origin"),
            ],
        },
        HeaderRule {
            source: route("/embed/:path*"),
            headers: vec![Header::new("X-Frame-Options", "ALLOWALL")],
        },
    ]
}

fn default_redirects() -> Vec<RedirectRule> {
    vec![RedirectRule {
        source: route("/calculator/:slug"),
        destination: route("/calculators/:slug"),
        permanent: true,
    }]
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: default_site_url(),
            name: default_site_name(),
        }
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            size: default_sitemap_size(),
            priority: default_priority(),
            changefreq: default_changefreq(),
            exclude: default_exclude(),
            index: false,
            file_name: default_sitemap_file(),
        }
    }
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policies: default_policies(),
            additional_sitemaps: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            sitemap: SitemapConfig::default(),
            robots: RobotsConfig::default(),
            headers: default_headers(),
            redirects: default_redirects(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, letting `ROUTEMAP__SECTION__KEY` variables override
    /// values from the file. A missing file leaves the built-in defaults with
    /// the environment applied on top.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        Self::load_layered(path, None)
    }

    /// `env` replaces the process environment when given.
    fn load_layered(path: &Path, env: Option<config::Map<String, String>>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .source(env),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Every check here runs before any path is processed.
    pub fn validate(&self) -> Result<()> {
        self.validate_site()?;
        self.validate_sitemap()?;
        self.validate_robots()?;
        self.validate_redirects()?;
        self.validate_crawl_consistency()
    }

    fn validate_site(&self) -> Result<()> {
        let url = &self.site.url;
        if url.is_empty() {
            return Err(CoreError::config("site.url cannot be empty"));
        }

        if !is_absolute_url(url) {
            return Err(CoreError::config(format!(
                "site.url must start with http:// or https://, got {url:?}"
            )));
        }

        if url.ends_with('/') {
            tracing::warn!("site.url should not have a trailing slash");
        }

        Ok(())
    }

    fn validate_sitemap(&self) -> Result<()> {
        let sitemap = &self.sitemap;

        if sitemap.size == 0 {
            return Err(CoreError::config("sitemap.size must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&sitemap.priority) {
            return Err(CoreError::config(format!(
                "sitemap.priority must be between 0.0 and 1.0, got {}",
                sitemap.priority
            )));
        }

        if sitemap.file_name.is_empty()
            || sitemap.file_name.contains('/')
            || !sitemap.file_name.ends_with(".xml")
        {
            return Err(CoreError::config(format!(
                "sitemap.file_name must be a bare .xml file name, got {:?}",
                sitemap.file_name
            )));
        }

        Ok(())
    }

    fn validate_robots(&self) -> Result<()> {
        for policy in &self.robots.policies {
            if policy.user_agent.trim().is_empty() {
                return Err(CoreError::config("robots.policies.user_agent cannot be empty"));
            }

            for prefix in policy.allow.iter().chain(&policy.disallow) {
                if !prefix.starts_with('/') {
                    return Err(CoreError::config(format!(
                        "robots prefix {prefix:?} for user agent {:?} must start with '/'",
                        policy.user_agent
                    )));
                }
            }
        }

        for url in &self.robots.additional_sitemaps {
            if !is_absolute_url(url) {
                return Err(CoreError::config(format!(
                    "robots.additional_sitemaps entry {url:?} must be an absolute URL"
                )));
            }
        }

        Ok(())
    }

    fn validate_redirects(&self) -> Result<()> {
        for rule in &self.redirects {
            let bound: Vec<&str> = rule.source.param_names().collect();
            if let Some(missing) = rule
                .destination
                .param_names()
                .find(|name| !bound.contains(name))
            {
                return Err(CoreError::config(format!(
                    "redirect {} -> {} uses :{missing}, which the source does not bind",
                    rule.source, rule.destination
                )));
            }
        }

        Ok(())
    }

    /// Every prefix the wildcard agent may not crawl must also be kept out of
    /// the sitemap.
    fn validate_crawl_consistency(&self) -> Result<()> {
        for policy in self.robots.policies.iter().filter(|p| p.is_wildcard()) {
            for prefix in &policy.disallow {
                let covered = self
                    .sitemap
                    .exclude
                    .iter()
                    .any(|pattern| pattern.covers_prefix(prefix));

                if !covered {
                    return Err(CoreError::config(format!(
                        "robots disallows {prefix:?} for all agents but sitemap.exclude has no \
                         pattern covering it (add \"{prefix}*\")"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Get the full URL for a path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.site.url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

/// Prefix of environment variables overriding configuration values.
const ENV_PREFIX: &str = "ROUTEMAP";

fn is_absolute_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn create_test_config() -> String {
        r#"
[site]
url = "https://calc.example.com"
name = "Example Calc"

[sitemap]
size = 500
priority = 0.5
changefreq = "monthly"
exclude = ["/api/*", "/embed/*", "/drafts/*", "/404"]
index = true

[robots]
additional_sitemaps = ["https://calc.example.com/extra.xml"]

[[robots.policies]]
user_agent = "*"
allow = ["/"]
disallow = ["/api/", "/embed/", "/drafts/"]

[[headers]]
source = "/:path*"
headers = [{ key = "X-Frame-Options", value = "DENY" }]

[[redirects]]
source = "/calc/:slug"
destination = "/calculators/:slug"
permanent = false
"#
        .to_string()
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("routemap.toml");
        let mut file = std::fs::File::create(&config_path).expect("create file");
        file.write_all(create_test_config().as_bytes())
            .expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.url, "https://calc.example.com");
        assert_eq!(config.site.name, "Example Calc");
        assert_eq!(config.sitemap.size, 500);
        assert_eq!(config.sitemap.priority, 0.5);
        assert_eq!(config.sitemap.changefreq, ChangeFreq::Monthly);
        assert_eq!(config.sitemap.exclude.len(), 4);
        assert!(config.sitemap.index);
        assert_eq!(config.robots.policies.len(), 1);
        assert_eq!(config.robots.additional_sitemaps.len(), 1);
        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.headers[0].headers[0].value, "DENY");
        assert_eq!(config.redirects.len(), 1);
        assert!(!config.redirects[0].permanent);
    }

    #[test]
    fn test_config_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("routemap.toml");
        std::fs::write(&config_path, "").expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.url, "https://microcalc.app");
        assert_eq!(config.site.name, "MicroCalc");
        assert_eq!(config.sitemap.size, 7000);
        assert_eq!(config.sitemap.priority, 0.7);
        assert_eq!(config.sitemap.changefreq, ChangeFreq::Weekly);
        assert_eq!(
            config
                .sitemap
                .exclude
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["/api/*", "/embed/*", "/404", "/500"]
        );
        assert!(!config.sitemap.index);
        assert_eq!(config.sitemap.file_name, "sitemap.xml");
        assert!(config.robots.enabled);
        assert_eq!(config.robots.policies[0].user_agent, "*");
        assert_eq!(config.robots.policies[1].user_agent, "Googlebot");
        assert_eq!(config.headers.len(), 2);
        assert_eq!(config.redirects[0].source.as_str(), "/calculator/:slug");
    }

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().expect("defaults validate");
    }

    #[test]
    fn test_url_for() {
        let config = Config::default();

        assert_eq!(
            config.url_for("/calculators/loan"),
            "https://microcalc.app/calculators/loan"
        );
        assert_eq!(config.url_for("/"), "https://microcalc.app/");
    }

    #[test]
    fn test_zero_sitemap_size_rejected() {
        let mut config = Config::default();
        config.sitemap.size = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sitemap.size"));
    }

    #[test]
    fn test_priority_out_of_range_rejected() {
        let mut config = Config::default();
        config.sitemap.priority = 1.5;
        assert!(config.validate().is_err());

        config.sitemap.priority = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_exclude_pattern_fails_at_load() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("routemap.toml");
        std::fs::write(&config_path, "[sitemap]\nexclude = [\"api/*\"]\n").expect("write");

        let result = Config::load(&config_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_sitemap_size_fails_at_load() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("routemap.toml");
        std::fs::write(&config_path, "[sitemap]\nsize = -1\n").expect("write");

        assert!(Config::load(&config_path).is_err());
    }

    #[test]
    fn test_site_url_requires_scheme() {
        let mut config = Config::default();
        config.site.url = "microcalc.app".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("site.url"));

        config.site.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_robots_prefix_must_be_rooted() {
        let mut config = Config::default();
        config.robots.policies[1].disallow.push("private".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redirect_destination_must_use_bound_params() {
        let mut config = Config::default();
        config.redirects.push(RedirectRule {
            source: RoutePattern::parse("/old/:id").unwrap(),
            destination: RoutePattern::parse("/new/:slug").unwrap(),
            permanent: true,
        });

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(":slug"));
    }

    #[test]
    fn test_wildcard_disallow_must_be_excluded() {
        let mut config = Config::default();
        config.sitemap.exclude.retain(|p| p.to_string() != "/embed/*");

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("/embed/"));
    }

    #[test]
    fn test_named_agent_disallow_not_required_in_exclude() {
        let mut config = Config::default();
        config.robots.policies[1].disallow.push("/beta/".to_string());
        config.validate().expect("only wildcard agent is checked");
    }

    #[test]
    fn test_config_not_found() {
        let result = Config::load(Path::new("/nonexistent/routemap.toml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_load_with_env_reads_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("routemap.toml");
        std::fs::write(
            &config_path,
            "[site]\nurl = \"https://env.example.com\"\n[sitemap]\nsize = 10\n",
        )
        .expect("write");

        let config = Config::load_with_env(&config_path).expect("load config");
        assert_eq!(config.sitemap.size, 10);
        assert_eq!(config.sitemap.file_name, "sitemap.xml");
    }

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_env_overrides_defaults_without_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let missing = dir.path().join("routemap.toml");

        let config = Config::load_layered(
            &missing,
            env(&[("ROUTEMAP__SITE__URL", "https://staging.microcalc.app")]),
        )
        .expect("load config");

        assert_eq!(config.site.url, "https://staging.microcalc.app");
        assert_eq!(config.site.name, "MicroCalc");
        assert_eq!(config.sitemap.size, 7000);
        assert_eq!(config.redirects.len(), 1);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("routemap.toml");
        std::fs::write(&config_path, "[site]\nurl = \"https://calc.example.com\"\n")
            .expect("write");

        let config = Config::load_layered(
            &config_path,
            env(&[("ROUTEMAP__SITE__URL", "https://staging.microcalc.app")]),
        )
        .expect("load config");
        assert_eq!(config.site.url, "https://staging.microcalc.app");

        let config = Config::load_layered(&config_path, env(&[])).expect("load config");
        assert_eq!(config.site.url, "https://calc.example.com");
    }

    #[test]
    fn test_env_override_is_validated() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let missing = dir.path().join("routemap.toml");

        let result =
            Config::load_layered(&missing, env(&[("ROUTEMAP__SITE__URL", "microcalc.app")]));
        assert!(result.is_err());
    }
}
