// src/config/loader.rs

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Overrides the config path when `--config` is not given.
pub const CONFIG_ENV: &str = "LEADTIME_CONFIG";

/// Overrides `[ledger].db_location`.
pub const DB_LOCATION_ENV: &str = "LEADTIME_DB_LOCATION";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file, apply environment overrides and validate.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw = load_from_path(&path)?;
    let raw = apply_overrides(raw, env::var(DB_LOCATION_ENV).ok());
    ConfigFile::try_from(raw)
}

/// Apply an explicit `db_location` override (from the environment in
/// production) before validation.
pub fn apply_overrides(mut raw: RawConfigFile, db_location: Option<String>) -> RawConfigFile {
    if let Some(location) = db_location {
        debug!(%location, "db_location overridden from environment");
        raw.ledger.db_location = location;
    }
    raw
}

/// Pick the config path: `--config`, then `LEADTIME_CONFIG`, then
/// `Leadtime.toml` in the working directory.
pub fn resolve_config_path(cli: Option<PathBuf>) -> PathBuf {
    choose_config_path(cli, env::var_os(CONFIG_ENV).map(PathBuf::from))
}

pub fn choose_config_path(cli: Option<PathBuf>, from_env: Option<PathBuf>) -> PathBuf {
    cli.or(from_env).unwrap_or_else(default_config_path)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Leadtime.toml")
}
