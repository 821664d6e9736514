// tests/config_loading.rs

mod common;

use common::*;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use leadtime::config::{
    ConfigFile, apply_overrides, choose_config_path, load_and_validate, load_from_path,
};
use leadtime::errors::LeadtimeError;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn full_config_round_trips_through_validation() -> TestResult {
    let file = write_config(
        r#"
[ledger]
db_location = "/var/lib/leadtime/ledger.db"
max_connections = 2

[time]
tincr = 3
tstart = 0

[ingest]
default_stream = "S"

[processing]
cmd = "transform-step"
timeout_secs = 600

[launch]
tdelta = 6
tfreq_f = 6
tfreq = 6
tincr = 1
"#,
    );

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.ledger.db_location, "/var/lib/leadtime/ledger.db");
    assert_eq!(cfg.ledger.max_connections, 2);
    assert_eq!(cfg.time_settings()?.tincr(), 3);
    assert_eq!(cfg.ingest.default_stream, "S");
    assert_eq!(cfg.processing.cmd.as_deref(), Some("transform-step"));
    assert_eq!(cfg.processing_timeout(), Some(Duration::from_secs(600)));
    assert_eq!(cfg.launch_settings()?.map(|l| l.tdelta), Some(6));
    Ok(())
}

#[test]
fn only_time_section_is_required() -> TestResult {
    let file = write_config("[time]\ntincr = 1\n");
    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.ledger.db_location, "leadtime.db");
    assert_eq!(cfg.ledger.max_connections, 4);
    assert_eq!(cfg.time.tstart, 0);
    assert_eq!(cfg.ingest.default_stream, "oper");
    assert_eq!(cfg.processing.cmd, None);
    assert!(cfg.launch.is_none());
    Ok(())
}

#[test]
fn missing_time_section_is_a_parse_error() {
    let file = write_config("[ledger]\ndb_location = \"x.db\"\n");
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, LeadtimeError::TomlError(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_from_path("/definitely/not/here/Leadtime.toml").unwrap_err();
    assert!(matches!(err, LeadtimeError::IoError(_)));
}

#[test]
fn semantic_violations_are_config_errors() {
    let cases = [
        ConfigFileBuilder::new(0).raw(),
        ConfigFileBuilder::new(3).db_location("  ").raw(),
        ConfigFileBuilder::new(3).cmd(" ").raw(),
        ConfigFileBuilder::new(3).timeout_secs(0).raw(),
        ConfigFileBuilder::new(3).launch(0, 6, 6, 1).raw(),
        ConfigFileBuilder::new(3).launch(2, 6, 6, 3).raw(),
    ];

    for raw in cases {
        let err = ConfigFile::try_from(raw.clone()).unwrap_err();
        assert!(
            matches!(err, LeadtimeError::ConfigError(_)),
            "expected config error for {raw:?}, got {err:?}"
        );
    }
}

#[test]
fn zero_connections_rejected() {
    let mut raw = ConfigFileBuilder::new(3).raw();
    raw.ledger.max_connections = 0;
    assert!(ConfigFile::try_from(raw).is_err());
}

#[test]
fn db_location_override_applies_before_validation() -> TestResult {
    let raw = ConfigFileBuilder::new(3).raw();
    let cfg = ConfigFile::try_from(apply_overrides(raw, Some("override.db".to_string())))?;
    assert_eq!(cfg.ledger.db_location, "override.db");

    let raw = ConfigFileBuilder::new(3).raw();
    let err = ConfigFile::try_from(apply_overrides(raw, Some(String::new())));
    assert!(err.is_err());
    Ok(())
}

#[test]
fn config_path_precedence() {
    let cli = Some(PathBuf::from("cli.toml"));
    let env = Some(PathBuf::from("env.toml"));

    assert_eq!(choose_config_path(cli.clone(), env.clone()), PathBuf::from("cli.toml"));
    assert_eq!(choose_config_path(None, env), PathBuf::from("env.toml"));
    assert_eq!(choose_config_path(None, None), PathBuf::from("Leadtime.toml"));
}

#[test]
fn builder_config_is_valid() {
    let cfg = ConfigFileBuilder::new(3).tstart(1).cmd("true").build();
    assert_eq!(cfg.time_settings().unwrap().tstart(), 1);
}
