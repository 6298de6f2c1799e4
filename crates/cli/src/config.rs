//! Configuration management for the CLI

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use estimator_lib::EstimatorConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of the environment overrides, e.g. `KCE_CLUSTER__NODES_COUNT=5`
pub const ENV_PREFIX: &str = "KCE";

/// Load the file (explicit path, or the default one when it exists) and the environment
pub fn load(path: Option<&Path>) -> Result<EstimatorConfig> {
    let mut builder = Config::builder();

    match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading config file");
            builder = builder.add_source(File::from(path).required(true));
        }
        None => {
            if let Some(default) = default_path().filter(|p| p.exists()) {
                debug!(path = %default.display(), "Loading default config file");
                builder = builder.add_source(File::from(default).required(false));
            }
        }
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read configuration")?;

    settings
        .try_deserialize()
        .context("Failed to parse configuration")
}

/// `~/.config/kce/config.yaml`
pub fn default_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("kce").join("config.yaml"))
}
