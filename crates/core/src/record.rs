// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Field maps and the metadata keys carried alongside them.
//!
//! Entity payloads are open JSON objects. A handful of underscore-prefixed
//! keys are reserved for synchronization metadata:
//!
//! | key  | meaning                              |
//! |------|--------------------------------------|
//! | `_id`| entity id                            |
//! | `_s` | per-client write sequence            |
//! | `_t` | wall-clock time of the write (ms)    |
//! | `_u` | origin id of the writer              |
//! | `_x` | tombstone (soft delete)              |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An open mapping of field names to JSON values.
pub type Fields = Map<String, Value>;

pub const ID_KEY: &str = "_id";
pub const SEQ_KEY: &str = "_s";
pub const TIME_KEY: &str = "_t";
pub const ORIGIN_KEY: &str = "_u";
pub const TOMBSTONE_KEY: &str = "_x";

/// Returns true for reserved metadata keys (leading underscore).
pub fn is_meta_key(key: &str) -> bool {
    key.starts_with('_')
}

/// Returns a copy of `fields` without any metadata keys.
pub fn strip_meta(fields: &Fields) -> Fields {
    fields
        .iter()
        .filter(|(k, _)| !is_meta_key(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Returns true if the tombstone flag is set.
pub fn is_tombstoned(fields: &Fields) -> bool {
    matches!(fields.get(TOMBSTONE_KEY), Some(Value::Bool(true)))
}

/// Anything that exposes a field map for filtering and sorting.
pub trait HasFields {
    fn fields(&self) -> &Fields;
}

impl HasFields for Fields {
    fn fields(&self) -> &Fields {
        self
    }
}

impl<T: HasFields + ?Sized> HasFields for &T {
    fn fields(&self) -> &Fields {
        (*self).fields()
    }
}

/// An id plus a field snapshot, as handed to live list callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Record { id: id.into(), fields }
    }

    /// Returns the value of a field, or `None` if absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn is_tombstoned(&self) -> bool {
        is_tombstoned(&self.fields)
    }
}

impl HasFields for Record {
    fn fields(&self) -> &Fields {
        &self.fields
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
