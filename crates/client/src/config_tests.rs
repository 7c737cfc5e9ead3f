// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use std::time::Duration;
use tempfile::TempDir;
use yare::parameterized;

#[test]
fn empty_file_takes_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.server.push_url, "ws://localhost:8000/ws");
    assert_eq!(config.channel.initial_backoff_ms, 1000);
    assert_eq!(config.channel.max_backoff_ms, 30000);
    assert_eq!(config.lists.tombstones, TombstonePolicy::Hide);
    assert_eq!(config.adapter.field_case, FieldCase::Identity);
}

#[test]
fn partial_sections_fill_in() {
    let config: Config = toml::from_str(
        r#"
        [server]
        base_url = "https://api.example.com"

        [lists]
        tombstones = "show"

        [adapter]
        field_case = "snake_case"
        "#,
    )
    .unwrap();
    assert_eq!(config.server.base_url, "https://api.example.com");
    assert_eq!(config.server.push_url, "ws://localhost:8000/ws");
    assert_eq!(config.settings().tombstones, TombstonePolicy::Show);
    assert_eq!(config.adapter.field_case, FieldCase::SnakeCase);
}

#[test]
fn save_then_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    let mut config = Config::default();
    config.origin_file = Some(temp.path().join("origin"));
    config.channel.max_backoff_ms = 5000;
    config.save(&path).unwrap();

    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn load_reports_missing_file() {
    let temp = TempDir::new().unwrap();
    let err = Config::load(&temp.path().join(CONFIG_FILE_NAME)).unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}

#[test]
fn load_reports_bad_toml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[lists]\ntombstones = \"sometimes\"\n").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse"));
}

#[parameterized(
    http_push = { "http://localhost/ws", "http://localhost" },
    ws_base = { "ws://localhost/ws", "ws://localhost" },
)]
fn validate_rejects_wrong_schemes(push_url: &str, base_url: &str) {
    let mut config = Config::default();
    config.server.push_url = push_url.to_string();
    config.server.base_url = base_url.to_string();
    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

#[test]
fn find_config_walks_up() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("a").join("b");
    std::fs::create_dir_all(&nested).unwrap();
    Config::default().save(&temp.path().join(CONFIG_FILE_NAME)).unwrap();

    assert_eq!(find_config_from(&nested), Some(temp.path().join(CONFIG_FILE_NAME)));
}

#[test]
fn find_config_without_file() {
    let temp = TempDir::new().expect("tempdir");
    let found = find_config_from(temp.path());
    assert!(found.is_none() || !found.unwrap().starts_with(temp.path()));
}

#[test]
fn backoff_follows_channel_section() {
    let config = ChannelConfig { initial_backoff_ms: 250, max_backoff_ms: 1000 };
    let mut backoff = config.backoff();
    assert_eq!(backoff.next_delay(), Duration::from_millis(250));
    assert_eq!(backoff.next_delay(), Duration::from_millis(500));
    assert_eq!(backoff.next_delay(), Duration::from_millis(1000));
    assert_eq!(backoff.next_delay(), Duration::from_millis(1000));
}
