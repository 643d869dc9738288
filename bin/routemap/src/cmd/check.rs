//! Check command - validate configuration and crawl policy consistency

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use routemap_core::Config;
use routemap_generator::{is_crawl_allowed, policy::FRAME_OPTIONS};

/// Entry limit per sitemap file in the sitemaps.org protocol.
const PROTOCOL_MAX_URLS: usize = 50_000;

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    if !config_path.exists() {
        result.add_warning(format!(
            "{} not found, built-in defaults will be used",
            config_path.display()
        ));
        println!("  ⚠ {} missing, checking built-in defaults", config_path.display());
    }

    let config = match Config::load_with_env(config_path) {
        Ok(c) => {
            println!("  ✓ Configuration valid");
            Some(c)
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e}"));
            println!("  ✗ Configuration invalid: {e}");
            None
        }
    };

    if let Some(ref cfg) = config {
        println!("\nChecking configuration values...");
        check_config_values(cfg, &mut result);

        println!("\nChecking embed policy...");
        check_embed_consistency(cfg, &mut result);
    }

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Check configuration values for issues that are legal but likely mistakes.
fn check_config_values(config: &Config, result: &mut ValidationResult) {
    if let Err(e) = config.validate() {
        result.add_error(format!("Configuration error: {e}"));
        return;
    }

    if config.site.url.ends_with('/') {
        result.add_warning("site.url has a trailing slash");
    }

    if config.site.name.trim().is_empty() {
        result.add_warning("site.name is empty");
    }

    if config.sitemap.size > PROTOCOL_MAX_URLS {
        result.add_warning(format!(
            "sitemap.size {} exceeds the protocol limit of {PROTOCOL_MAX_URLS} URLs per file",
            config.sitemap.size
        ));
    }

    if !config.robots.enabled {
        result.add_warning("robots.txt generation is disabled");
    } else if !config.robots.policies.iter().any(|p| p.is_wildcard()) {
        result.add_warning("robots has no policy for user agent '*'");
    }

    for rule in &config.redirects {
        if rule.source == rule.destination {
            result.add_warning(format!("redirect {} points at itself", rule.source));
        }
    }

    println!("  ✓ Configuration values checked");
}

/// Pages that may be framed by other origins must be kept out of the sitemap
/// and away from generic crawlers.
fn check_embed_consistency(config: &Config, result: &mut ValidationResult) {
    let mut embeddable = 0;

    for rule in &config.headers {
        let allows_framing = rule.headers.iter().any(|h| {
            h.key.eq_ignore_ascii_case(FRAME_OPTIONS) && h.value.eq_ignore_ascii_case("ALLOWALL")
        });
        if !allows_framing {
            continue;
        }

        embeddable += 1;
        let prefix = rule.source.literal_prefix();

        let excluded = config
            .sitemap
            .exclude
            .iter()
            .any(|pattern| pattern.covers_prefix(&prefix) || pattern.matches(&prefix));
        if !excluded {
            result.add_warning(format!(
                "{} allows embedding but {prefix} is not excluded from the sitemap",
                rule.source
            ));
        }

        if config.robots.enabled && is_crawl_allowed(&config.robots.policies, "*", &prefix) {
            result.add_warning(format!(
                "{} allows embedding but {prefix} is not disallowed for all crawlers",
                rule.source
            ));
        }
    }

    println!("  ✓ {embeddable} embeddable route rule(s) checked");
}

#[cfg(test)]
mod tests {
    use std::fs;

    use routemap_core::{Header, HeaderRule, RoutePattern};
    use tempfile::TempDir;

    use super::*;

    fn check(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();
        check_config_values(config, &mut result);
        check_embed_consistency(config, &mut result);
        result
    }

    #[test]
    fn test_default_config_is_clean() {
        let result = check(&Config::default());
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_embeddable_route_must_be_hidden() {
        let mut config = Config::default();
        config.headers.push(HeaderRule {
            source: RoutePattern::parse("/widgets/:path*").unwrap(),
            headers: vec![Header::new("X-Frame-Options", "ALLOWALL")],
        });

        let result = check(&config);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("/widgets/ is not excluded from the sitemap"));
        assert!(result.warnings[1].contains("not disallowed for all crawlers"));
    }

    #[test]
    fn test_oversized_sitemap_warns() {
        let mut config = Config::default();
        config.sitemap.size = 60_000;

        let result = check(&config);
        assert!(result.warnings.iter().any(|w| w.contains("protocol limit")));
    }

    #[test]
    fn test_disabled_robots_warns() {
        let mut config = Config::default();
        config.robots.enabled = false;

        let result = check(&config);
        assert!(result.warnings.iter().any(|w| w.contains("disabled")));
    }

    #[test]
    fn test_run_strict_fails_on_missing_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("routemap.toml");

        assert!(run(&path, false).is_ok());
        assert!(run(&path, true).is_err());
    }

    #[test]
    fn test_run_reports_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("routemap.toml");
        fs::write(&path, "[site]\nurl = \"microcalc.app\"\n").unwrap();

        assert!(run(&path, false).is_err());
    }
}
