// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for mirra-core operations.

use thiserror::Error;

/// All possible errors that can occur in mirra-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid sort: {0}\n  hint: use \"asc\", \"desc\" or [nullsFirst, \"asc\"|\"desc\"]")]
    InvalidSort(String),

    #[error("invalid topic pattern '{topic}': {source}")]
    InvalidTopic {
        topic: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid origin id: {0}")]
    InvalidOrigin(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for mirra-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
