// src/config/mod.rs

//! Configuration loading and validation for leadtime.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and apply environment overrides (`loader.rs`).
//! - Turn the raw model into a validated `ConfigFile` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    apply_overrides, choose_config_path, load_and_validate, load_from_path, resolve_config_path,
};
pub use model::{
    ConfigFile, IngestSection, LaunchSection, LedgerSection, ProcessingSection, RawConfigFile,
    TimeSection,
};
