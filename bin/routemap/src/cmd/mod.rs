//! Command implementations.

pub mod build;
pub mod check;
pub mod classify;

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use routemap_core::Config;

/// Load the configuration file, or fall back to the built-in MicroCalc
/// defaults when it does not exist. `ROUTEMAP__*` variables apply either way.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::warn!(
            config = %path.display(),
            "configuration file not found, using built-in defaults"
        );
    }

    let config = Config::load_with_env(path)
        .wrap_err_with(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}
