// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Storage adapters: the server-side half of every entity operation.
//!
//! An adapter fulfils five capabilities for a kind: fetch a filtered list,
//! read one record, and create, update or delete one record. The object store
//! holds one adapter per registered kind.

pub mod codec;
pub mod memory;
pub mod rest;

use std::future::Future;
use std::pin::Pin;

use mirra_core::{Fields, Filter, SortSpec};

pub use codec::FieldCase;
pub use memory::MemoryAdapter;
pub use rest::RestAdapter;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {text}")]
    Status { status: u16, text: String },

    /// The response body was not what the adapter expected.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The adapter refused the operation.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AdapterError::Decode(err.to_string())
        } else {
            AdapterError::Request(err.to_string())
        }
    }
}

/// Result type for storage operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Boxed future returned by adapter methods.
pub type AdapterFuture<'a, T> = Pin<Box<dyn Future<Output = AdapterResult<T>> + Send + 'a>>;

/// Server-side storage for entity kinds.
///
/// Records travel as field maps that include the metadata keys (`_id`, `_s`,
/// `_t`, `_u`, `_x`).
pub trait StorageAdapter: Send + Sync {
    /// Fetches every record of `kind`. The filter and sort are hints: the
    /// caller re-applies both locally.
    fn fetch_all<'a>(
        &'a self,
        kind: &'a str,
        filter: &'a Filter,
        sort: &'a SortSpec,
    ) -> AdapterFuture<'a, Vec<Fields>>;

    /// Reads one record. Returns `None` if the server has no such record.
    fn read_one<'a>(&'a self, kind: &'a str, id: &'a str) -> AdapterFuture<'a, Option<Fields>>;

    fn create_one<'a>(&'a self, kind: &'a str, id: &'a str, fields: &'a Fields) -> AdapterFuture<'a, ()>;

    fn update_one<'a>(&'a self, kind: &'a str, id: &'a str, fields: &'a Fields) -> AdapterFuture<'a, ()>;

    fn delete_one<'a>(&'a self, kind: &'a str, id: &'a str, fields: &'a Fields) -> AdapterFuture<'a, ()>;

    /// Converts a pushed record to client field names, as fetched records are.
    fn decode_push(&self, fields: &Fields) -> Fields {
        fields.clone()
    }
}
