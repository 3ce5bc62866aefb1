//! Tests for fetch and list argument parsing.

use super::{command, parse, parse_err};
use crate::cli::CliCommand;
use chrono::{TimeZone, Utc};
use std::path::Path;

const PERSON: &str = "6f1c2b8e-3d4a-4f5b-9c6d-7e8f9a0b1c2d";

#[test]
fn cli_parse_fetch_all_flags() {
    match command(&[
        "ppdl",
        "fetch",
        "--api-url",
        "https://photos.example.org/api",
        "--api-key",
        "secret",
        "--person-id",
        PERSON,
        "--after",
        "2024-01-01T00:00:00Z",
        "--save-to",
        "/srv/photos",
        "--threads",
        "8",
        "--dry",
    ]) {
        CliCommand::Fetch { target, dry } => {
            assert!(dry);
            assert_eq!(target.api_url.as_deref(), Some("https://photos.example.org/api"));
            assert_eq!(target.api_key.as_deref(), Some("secret"));
            assert_eq!(target.person_id.unwrap().to_string(), PERSON);
            assert_eq!(
                target.after,
                Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            );
            assert_eq!(target.last_days, None);
            assert_eq!(target.save_to.as_deref(), Some(Path::new("/srv/photos")));
            assert_eq!(target.threads, Some(8));
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_last_days() {
    match command(&["ppdl", "fetch", "--last-days", "7"]) {
        CliCommand::Fetch { target, .. } => {
            assert_eq!(target.last_days, Some(7));
            assert!(target.after.is_none());
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_rejects_after_with_last_days() {
    let err = parse_err(&[
        "ppdl",
        "fetch",
        "--after",
        "2024-01-01T00:00:00Z",
        "--last-days",
        "3",
    ]);
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
fn cli_rejects_bad_person_id() {
    let err = parse_err(&["ppdl", "fetch", "--person-id", "not-a-uuid"]);
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[test]
fn cli_parse_list() {
    match command(&["ppdl", "list", "--config", "/etc/ppdl.toml"]) {
        CliCommand::List { target } => {
            assert_eq!(target.config.as_deref(), Some(Path::new("/etc/ppdl.toml")));
        }
        _ => panic!("expected List"),
    }
}

#[test]
fn cli_list_has_no_dry_flag() {
    let err = parse_err(&["ppdl", "list", "--dry"]);
    assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
}

#[test]
fn cli_global_flags_after_subcommand() {
    let cli = parse(&["ppdl", "fetch", "--verbose", "--log-file"]);
    assert!(cli.verbose);
    assert!(cli.log_file);
    let cli = parse(&["ppdl", "-v", "list"]);
    assert!(cli.verbose);
    assert!(!cli.log_file);
}
