// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{LeadtimeError, Result};
use crate::readiness::{LaunchSettings, TimeSettings};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = LeadtimeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_ledger(cfg)?;
    TimeSettings::new(cfg.time.tincr, cfg.time.tstart)
        .map_err(|_| config_error("[time].tincr must be >= 1 (got 0)"))?;
    validate_ingest(cfg)?;
    validate_processing(cfg)?;
    if let Some(launch) = &cfg.launch {
        LaunchSettings::new(launch.tdelta, launch.tfreq_f, launch.tfreq, launch.tincr)?;
    }
    Ok(())
}

fn config_error(msg: impl Into<String>) -> LeadtimeError {
    LeadtimeError::ConfigError(msg.into())
}

fn validate_ledger(cfg: &RawConfigFile) -> Result<()> {
    if cfg.ledger.db_location.trim().is_empty() {
        return Err(config_error("[ledger].db_location must not be empty"));
    }
    if cfg.ledger.max_connections == 0 {
        return Err(config_error("[ledger].max_connections must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_ingest(cfg: &RawConfigFile) -> Result<()> {
    if cfg.ingest.default_stream.trim().is_empty() {
        return Err(config_error("[ingest].default_stream must not be empty"));
    }
    Ok(())
}

fn validate_processing(cfg: &RawConfigFile) -> Result<()> {
    if cfg
        .processing
        .cmd
        .as_deref()
        .is_some_and(|c| c.trim().is_empty())
    {
        return Err(config_error("[processing].cmd must not be blank"));
    }
    if cfg.processing.timeout_secs == Some(0) {
        return Err(config_error("[processing].timeout_secs must be >= 1 (got 0)"));
    }
    Ok(())
}
