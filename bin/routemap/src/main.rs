//! routemap CLI
//!
//! Generates sitemap.xml, robots.txt and a route policy manifest from a
//! site's route list.
//!
//! This is the binary entry point. The command implementations are in `lib.rs`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use routemap::cmd::build::BuildArgs;
use routemap_generator::RouteSource;

/// Command-line interface for routemap.
#[derive(Parser)]
#[command(
    name = "routemap",
    version,
    about = "Sitemap and robots.txt generator for statically exported sites"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "routemap.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Generate the sitemap, robots.txt and route policy manifest
    Build {
        /// Output directory
        #[arg(short, long, default_value = "public")]
        output: PathBuf,
        /// Read routes from a file, one path per line
        #[arg(long, conflicts_with = "pages", required_unless_present = "pages")]
        routes: Option<PathBuf>,
        /// Derive routes from a static export directory
        #[arg(long)]
        pages: Option<PathBuf>,
        /// Override site url (e.g., https://staging.microcalc.app)
        #[arg(long)]
        site_url: Option<String>,
        /// Fixed generation time (RFC 3339) for reproducible output
        #[arg(long, value_parser = parse_timestamp)]
        timestamp: Option<DateTime<Utc>>,
    },
    /// Validate configuration and crawl policy consistency
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Show how paths are rewritten, classified and served
    Classify {
        /// Site paths (e.g., /calculators/loan)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn parse_timestamp(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp: {e}"))
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    routemap::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            output,
            routes,
            pages,
            site_url,
            timestamp,
        } => {
            let source = routes
                .map(RouteSource::File)
                .or_else(|| pages.map(RouteSource::ExportDir))
                .ok_or_else(|| eyre!("either --routes or --pages is required"))?;

            routemap::cmd::build::run(
                &cli.config,
                &BuildArgs {
                    output,
                    source,
                    site_url,
                    timestamp,
                },
            )?;
        }
        Commands::Check { strict } => {
            routemap::cmd::check::run(&cli.config, strict)?;
        }
        Commands::Classify { paths } => {
            routemap::cmd::classify::run(&cli.config, &paths)?;
        }
    }

    Ok(())
}
