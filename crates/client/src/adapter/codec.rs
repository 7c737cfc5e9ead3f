// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Field-name translation between client and server spellings.

use mirra_core::record::is_meta_key;
use mirra_core::Fields;
use serde::{Deserialize, Serialize};

/// Naming convention used by the server for field names.
///
/// Client code always uses camelCase. Metadata keys are never renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCase {
    /// Names pass through unchanged.
    #[default]
    Identity,
    /// The server uses snake_case.
    SnakeCase,
}

impl FieldCase {
    /// Renames fields on the way to the server.
    pub fn encode(&self, fields: &Fields) -> Fields {
        self.rename(fields, camel_to_snake)
    }

    /// Renames fields on the way back from the server.
    pub fn decode(&self, fields: &Fields) -> Fields {
        self.rename(fields, snake_to_camel)
    }

    fn rename(&self, fields: &Fields, convert: fn(&str) -> String) -> Fields {
        match self {
            FieldCase::Identity => fields.clone(),
            FieldCase::SnakeCase => fields
                .iter()
                .map(|(key, value)| {
                    let key = if is_meta_key(key) { key.clone() } else { convert(key) };
                    (key, value.clone())
                })
                .collect(),
        }
    }
}

/// `firstName` → `first_name`.
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `first_name` → `firstName`.
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' && !out.is_empty() {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
