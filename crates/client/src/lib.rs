// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! mirra - a live, synchronized object cache.
//!
//! Entities are kept in an [`ObjectStore`] and written through a per-kind
//! storage adapter. A push channel feeds server-side changes back into the
//! store, and [`LiveList`]s keep filtered, sorted views up to date.
//!
//! # Main Components
//!
//! - [`Context`] - Event bus, write stamper and deferred queue shared by everything
//! - [`ObjectStore`] - Entities by kind and id, and push message routing
//! - [`Entity`] - One record with optimistic and confirmed versions
//! - [`LiveList`] - Filtered, sorted view that follows the store
//! - [`Runtime`] - Wires a push channel into a store
//!
//! # Usage
//!
//! ```rust,ignore
//! use mirra::{Config, LiveList, Runtime};
//! use mirra::channel::WebSocketTransport;
//! use mirra_core::{Filter, SortSpec};
//!
//! let mut runtime = Runtime::from_config(Config::discover()?)?;
//! runtime.register_rest_kind("persons")?;
//! let list = LiveList::open(runtime.store(), "persons", Filter::all(), SortSpec::new().asc("name")).await?;
//! list.on_change(|records| println!("{} persons", records.len()));
//! runtime.connect(WebSocketTransport::default());
//! loop {
//!     runtime.next_batch().await;
//! }
//! ```

mod cli;
mod commands;

pub mod adapter;
pub mod channel;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod live_list;
pub mod runtime;
pub mod store;

#[cfg(test)]
mod test_helpers;

pub use cli::{Cli, Command, OutputFormat, ServerArgs};
pub use commands::{format_records, load_config, run};
pub use config::Config;
pub use context::{Context, EntityEvent, EventKind, Settings, TombstonePolicy};
pub use entity::Entity;
pub use error::{Error, Result};
pub use live_list::{CallbackId, ListStatus, LiveList};
pub use runtime::Runtime;
pub use store::{DropReason, InterestHandle, KindSpec, ObjectStore, RouteOutcome};
