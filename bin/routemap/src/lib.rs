//! routemap CLI Library
//!
//! Command implementations for the `routemap` binary, exposed as a library so
//! they can be driven from integration tests.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, check, classify)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use routemap::cmd::{self, build::BuildArgs};
//! use routemap_generator::RouteSource;
//!
//! let args = BuildArgs {
//!     output: Path::new("out").to_path_buf(),
//!     source: RouteSource::File("routes.txt".into()),
//!     site_url: None,
//!     timestamp: None,
//! };
//! cmd::build::run(Path::new("routemap.toml"), &args).unwrap();
//! ```

pub mod cmd;

pub use routemap_core::Config;
pub use routemap_generator::{BuildStats, Builder, RouteSource};

/// Initialize tracing with the specified verbosity level.
///
/// `0` is WARN, `1` INFO, `2` DEBUG and anything higher TRACE. `RUST_LOG`
/// directives still apply on top.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
