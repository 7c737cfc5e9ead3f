// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The push channel: one persistent connection to the server that survives
//! disconnects.

pub mod backoff;
pub mod resilient;
pub mod transport;

pub use backoff::Backoff;
pub use resilient::{ChannelHandle, ResilientChannel};
pub use transport::{Transport, TransportError, TransportFuture, TransportResult, WebSocketTransport};
