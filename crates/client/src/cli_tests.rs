// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn watch_defaults() {
    let cli = parse(&["mirra", "watch", "persons"]).unwrap();
    assert!(!cli.verbose);
    assert!(cli.config.is_none());
    match cli.command {
        Command::Watch { kind, filter, sort, once, output, server } => {
            assert_eq!(kind, "persons");
            assert!(filter.is_empty());
            assert!(sort.is_empty());
            assert!(!once);
            assert_eq!(output, OutputFormat::Text);
            assert!(server.base_url.is_none());
            assert!(server.push_url.is_none());
        }
        _ => panic!("expected Watch"),
    }
}

#[test]
fn watch_with_everything() {
    let cli = parse(&[
        "mirra",
        "-v",
        "watch",
        "persons",
        "--filter",
        r#"{"age":[18,65]}"#,
        "-s",
        r#"{"name":"asc"}"#,
        "--once",
        "--output",
        "json",
        "--base-url",
        "http://api.test",
        "--push-url",
        "ws://api.test/ws",
        "--config",
        "/tmp/mirra.toml",
    ])
    .unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/mirra.toml")));
    match cli.command {
        Command::Watch { filter, sort, once, output, server, .. } => {
            assert_eq!(filter, r#"{"age":[18,65]}"#);
            assert_eq!(sort, r#"{"name":"asc"}"#);
            assert!(once);
            assert_eq!(output, OutputFormat::Json);
            assert_eq!(server.base_url.as_deref(), Some("http://api.test"));
            assert_eq!(server.push_url.as_deref(), Some("ws://api.test/ws"));
        }
        _ => panic!("expected Watch"),
    }
}

#[test]
fn get_takes_kind_and_id() {
    let cli = parse(&["mirra", "get", "persons", "42"]).unwrap();
    match cli.command {
        Command::Get { kind, id, .. } => {
            assert_eq!(kind, "persons");
            assert_eq!(id, "42");
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn watch_requires_kind() {
    assert!(parse(&["mirra", "watch"]).is_err());
}

#[test]
fn unknown_output_format_is_rejected() {
    assert!(parse(&["mirra", "watch", "persons", "--output", "yaml"]).is_err());
}
