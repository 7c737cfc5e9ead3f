// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::adapter::AdapterError;

/// All possible errors that can occur in the mirra library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown kind: '{0}'\n  hint: register the kind with the object store first")]
    UnknownKind(String),

    #[error("kind already registered: '{0}'")]
    KindExists(String),

    #[error("entity already exists: {kind}/{id}")]
    EntityExists { kind: String, id: String },

    #[error("record of kind '{0}' has no id")]
    MissingId(String),

    #[error("cannot set reserved field '{0}'\n  hint: fields starting with '_' carry sync metadata")]
    ReservedField(String),

    #[error("entity not found on server: {kind}/{id}")]
    NotFound { kind: String, id: String },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] mirra_core::Error),

    #[error("storage error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for mirra operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
