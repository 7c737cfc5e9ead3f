// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Stable per-installation origin id.
//!
//! The origin id is the third component of every write stamp. It must stay
//! the same across restarts so that notifications echoing writes made before
//! a restart are still recognized as our own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const ORIGIN_DIR_NAME: &str = "mirra";
const ORIGIN_FILE_NAME: &str = "origin";

/// Identifier of one client installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginId(String);

impl OriginId {
    /// Generates a fresh random origin id.
    pub fn generate() -> Self {
        OriginId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads the origin id stored at `path`, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or written, and
    /// [`Error::InvalidOrigin`] if it contains whitespace inside the id.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => {
                let id = content.trim();
                if id.is_empty() {
                    return Self::create_at(path);
                }
                if id.contains(char::is_whitespace) {
                    return Err(Error::InvalidOrigin(format!(
                        "'{}' in {}",
                        id,
                        path.display()
                    )));
                }
                Ok(OriginId(id.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::create_at(path),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves the origin id for this process.
    ///
    /// Resolution order:
    /// 1. The explicitly configured file
    /// 2. `<data dir>/mirra/origin`
    /// 3. A fresh id that lives only as long as the process
    pub fn resolve(configured: Option<&Path>) -> Result<Self> {
        if let Some(path) = configured {
            return Self::load_or_create(path);
        }
        match default_origin_path() {
            Some(path) => Self::load_or_create(&path),
            None => {
                tracing::debug!("no data directory, using an ephemeral origin id");
                Ok(Self::generate())
            }
        }
    }

    fn create_at(path: &Path) -> Result<Self> {
        let id = Self::generate();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, format!("{}\n", id.0))?;
        tracing::debug!(origin = %id, path = %path.display(), "created origin id");
        Ok(id)
    }
}

impl From<&str> for OriginId {
    fn from(s: &str) -> Self {
        OriginId(s.to_string())
    }
}

impl From<String> for OriginId {
    fn from(s: String) -> Self {
        OriginId(s)
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Default location of the origin file.
pub fn default_origin_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(ORIGIN_DIR_NAME).join(ORIGIN_FILE_NAME))
}

#[cfg(test)]
#[path = "origin_tests.rs"]
mod tests;
