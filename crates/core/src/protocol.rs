// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push channel frames for server-client communication.
//!
//! The protocol is simple:
//! - Server pushes one JSON object per change: `{path, mode, id, data}`
//! - Server probes liveness with `{"type": "ping"}`
//! - Client answers probes with `{"action": "pong"}`
//!
//! Mutations do not travel over the push channel; they go through the
//! storage adapter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{Fields, ID_KEY};

/// What happened to the record named by a push message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushMode {
    Create,
    Update,
    Delete,
}

/// A change notification pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Kind path (`/persons`) or entity path (`/persons/<id>`).
    #[serde(alias = "entity")]
    pub path: String,
    pub mode: PushMode,
    /// Entity id; older servers leave it out.
    #[serde(default, alias = "key", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Full record as stored by the server, metadata keys included.
    #[serde(default)]
    pub data: Fields,
}

impl PushMessage {
    pub fn new(path: impl Into<String>, mode: PushMode, id: impl Into<String>, data: Fields) -> Self {
        PushMessage { path: path.into(), mode, id: Some(id.into()), data }
    }

    /// Returns the path split into non-empty segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }

    /// Resolves the target entity id.
    ///
    /// Resolution order:
    /// 1. The explicit `id`
    /// 2. The second path segment (`/persons/<id>`)
    /// 3. The `_id` key of the payload
    pub fn target_id(&self) -> Option<String> {
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return Some(id.to_string());
        }
        if let Some(tail) = self.segments().nth(1) {
            return Some(tail.to_string());
        }
        match self.data.get(ID_KEY) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frames received from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    /// Liveness probe; must be answered with [`ClientFrame::Pong`].
    Ping,
    /// A change notification.
    Push(PushMessage),
    /// Anything else the server sends (greetings, replay batches).
    Other(Value),
}

impl ServerFrame {
    /// Decodes a frame from its JSON text.
    ///
    /// Objects that are neither a ping nor a well-formed push message decode
    /// as [`ServerFrame::Other`]; only invalid JSON is an error.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(s)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        if value.get("type").and_then(Value::as_str) == Some("ping") {
            return ServerFrame::Ping;
        }
        let looks_like_push = value.get("mode").is_some()
            && (value.get("path").is_some() || value.get("entity").is_some());
        if looks_like_push {
            if let Ok(msg) = serde_json::from_value::<PushMessage>(value.clone()) {
                return ServerFrame::Push(msg);
            }
        }
        ServerFrame::Other(value)
    }
}

/// Frames sent from the client to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Heartbeat acknowledgment.
    Pong,
}

impl ClientFrame {
    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
