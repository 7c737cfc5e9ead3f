// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is stored in `mirra.toml`:
//!
//! ```toml
//! origin_file = "/var/lib/app/origin"   # optional
//!
//! [server]
//! base_url = "http://localhost:8000"
//! push_url = "ws://localhost:8000/ws"
//!
//! [channel]
//! initial_backoff_ms = 1000
//! max_backoff_ms = 30000
//!
//! [lists]
//! tombstones = "hide"    # or "show"
//!
//! [adapter]
//! field_case = "identity"    # or "snake_case"
//! ```
//!
//! Every section is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::adapter::FieldCase;
use crate::channel::backoff::{DEFAULT_CEILING_MS, DEFAULT_FLOOR_MS};
use crate::channel::Backoff;
use crate::context::{Settings, TombstonePolicy};
use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "mirra.toml";

/// Client configuration stored in `mirra.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where the origin id is kept. Defaults to the user data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_file: Option<PathBuf>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub lists: ListsConfig,
    #[serde(default)]
    pub adapter: AdapterConfig,
}

/// Server endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the REST endpoints.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// URL of the push channel (`ws://` or `wss://`).
    #[serde(default = "default_push_url")]
    pub push_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { base_url: default_base_url(), push_url: default_push_url() }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_push_url() -> String {
    "ws://localhost:8000/ws".to_string()
}

/// Push channel reconnect tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl ChannelConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.initial_backoff_ms, self.max_backoff_ms)
    }
}

fn default_initial_backoff_ms() -> u64 {
    DEFAULT_FLOOR_MS
}

fn default_max_backoff_ms() -> u64 {
    DEFAULT_CEILING_MS
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListsConfig {
    #[serde(default)]
    pub tombstones: TombstonePolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(default)]
    pub field_case: FieldCase,
}

impl Config {
    /// Loads configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Loads the nearest `mirra.toml`, or the defaults if there is none.
    pub fn discover() -> Result<Self> {
        match Self::find()? {
            Some(path) => Self::load(&path),
            None => Ok(Config::default()),
        }
    }

    /// Checks URL schemes.
    pub fn validate(&self) -> Result<()> {
        let push = &self.server.push_url;
        if !(push.starts_with("ws://") || push.starts_with("wss://")) {
            return Err(Error::Config(format!("push_url must be ws:// or wss://, got '{push}'")));
        }
        let base = &self.server.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::Config(format!("base_url must be http:// or https://, got '{base}'")));
        }
        Ok(())
    }

    /// Finds `mirra.toml` by walking up from the current directory.
    pub fn find() -> Result<Option<PathBuf>> {
        let current = std::env::current_dir()?;
        Ok(find_config_from(&current))
    }

    /// Context settings derived from this config.
    pub fn settings(&self) -> Settings {
        Settings { tombstones: self.lists.tombstones }
    }
}

/// Finds `mirra.toml` by walking up from `start`.
pub fn find_config_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
