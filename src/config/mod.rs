// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variables with this prefix override file values,
/// e.g. `REACHABILITY_TELEGRAM__TOKEN` sets `telegram.token`.
pub const ENV_PREFIX: &str = "REACHABILITY";

/// Load configuration from a file (YAML or JSON, by extension) layered with
/// environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: Config = settings
        .try_deserialize()
        .context("Failed to parse config")?;

    config.validate()?;
    Ok(config)
}
