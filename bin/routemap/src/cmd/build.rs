//! Build command - writes the sitemap, robots.txt and route policy manifest

use std::{path::PathBuf, time::Instant};

use chrono::{DateTime, Utc};
use color_eyre::eyre::{Result, WrapErr};
use routemap_generator::{Builder, RouteSource};

/// Arguments of the build command.
#[derive(Debug, Clone)]
pub struct BuildArgs {
    /// Directory the artifacts are written to.
    pub output: PathBuf,

    /// Where the route list comes from.
    pub source: RouteSource,

    /// Override for `site.url`.
    pub site_url: Option<String>,

    /// Fixed generation time instead of now.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Run the build command.
pub fn run(config_path: &std::path::Path, args: &BuildArgs) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?args, "Starting build");

    let mut config = super::load_config(config_path)?;

    if let Some(url) = &args.site_url {
        tracing::info!(url, "Overriding site url from CLI");
        config.site.url = url.clone();
    }

    let mut builder = Builder::new(config, args.source.clone(), &args.output);
    if let Some(timestamp) = args.timestamp {
        builder = builder.with_timestamp(timestamp);
    }

    let stats = builder.build().wrap_err("Build failed")?;
    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Routes:     {}", stats.routes);
    println!("  Rewritten:  {}", stats.rewritten);
    println!("  Duplicates: {}", stats.duplicates);
    println!("  Excluded:   {}", stats.excluded);
    println!("  Entries:    {}", stats.entries);
    println!("  Sitemaps:   {}", stats.sitemap_files);
    println!("  robots.txt: {}", if stats.robots { "written" } else { "disabled" });
    println!();
    println!("  Duration:   {:.2}s", duration.as_secs_f64());
    println!("  Output:     {}", builder.output_dir().display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}
