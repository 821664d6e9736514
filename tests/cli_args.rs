// tests/cli_args.rs

mod common;

use common::*;

use clap::Parser;

use leadtime::cli::{CliArgs, Command, NotifyArgs};
use leadtime::logging::resolve_level;
use leadtime::{arrival_from_args, parse_run_time};

fn notify_args(location: &str) -> NotifyArgs {
    NotifyArgs {
        location: location.to_string(),
        date: None,
        time: None,
        step: None,
        stream: None,
        year: Some(2024),
    }
}

#[test]
fn run_time_from_date_and_hour() {
    assert_eq!(parse_run_time("20240618", "12").unwrap(), run_at(12));
    assert_eq!(parse_run_time("20240618", "0").unwrap(), run_at(0));
    assert!(parse_run_time("20240618", "24").is_err());
    assert!(parse_run_time("2024-06-18", "00").is_err());
}

#[test]
fn key_is_parsed_from_the_location_file_name() {
    let arrival =
        arrival_from_args(&notify_args("s3://bucket/in/P1S06180000061803001"), "oper").unwrap();
    assert_eq!(arrival.run_time, run_at(0));
    assert_eq!(arrival.step, 3);
    assert_eq!(arrival.key, "P1S06180000061803001");
    assert_eq!(arrival.stream, "S");
}

#[test]
fn explicit_run_and_step_win() {
    let mut args = notify_args("/data/anything.grib");
    args.date = Some("20240618".to_string());
    args.time = Some("06".to_string());
    args.step = Some(9);

    let arrival = arrival_from_args(&args, "oper").unwrap();
    assert_eq!(arrival.run_time, run_at(6));
    assert_eq!(arrival.step, 9);
    assert_eq!(arrival.key, "anything.grib");
    assert_eq!(arrival.stream, "oper");

    args.stream = Some("ens".to_string());
    assert_eq!(arrival_from_args(&args, "oper").unwrap().stream, "ens");
}

#[test]
fn unparseable_key_without_run_is_rejected() {
    assert!(arrival_from_args(&notify_args("/data/anything.grib"), "oper").is_err());
    assert!(arrival_from_args(&notify_args("/"), "oper").is_err());
}

#[test]
fn clap_parses_subcommands() {
    let args = CliArgs::try_parse_from([
        "leadtime",
        "--config",
        "cfg.toml",
        "notify",
        "--location",
        "x/P1S06180000061803001",
    ])
    .unwrap();
    assert_eq!(args.config.as_deref(), Some(std::path::Path::new("cfg.toml")));
    assert!(matches!(args.command, Command::Notify(_)));

    let args = CliArgs::try_parse_from(["leadtime", "status", "--limit", "3"]).unwrap();
    match args.command {
        Command::Status(s) => {
            assert_eq!(s.limit, 3);
            assert!(s.date.is_none());
        }
        other => panic!("unexpected command {other:?}"),
    }

    // A partial explicit run is refused.
    assert!(
        CliArgs::try_parse_from(["leadtime", "notify", "--location", "f", "--date", "20240618"])
            .is_err()
    );
}

#[test]
fn log_level_precedence() {
    use leadtime::cli::LogLevel;

    assert_eq!(resolve_level(Some(LogLevel::Debug), Some("error")), tracing::Level::DEBUG);
    assert_eq!(resolve_level(None, Some("warning")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, Some("nonsense")), tracing::Level::INFO);
    assert_eq!(resolve_level(None, None), tracing::Level::INFO);
}
