// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! mirra-core: building blocks for the mirra live object cache.
//!
//! This crate has no I/O beyond the origin file. It provides the wire frames,
//! the write stamp used for echo suppression, the event bus, and the filter
//! and sort engines that live lists are built on. The `mirra` crate wires
//! these into entities, the object store and the push channel.

pub mod bus;
pub mod error;
pub mod filter;
pub mod origin;
pub mod protocol;
pub mod record;
pub mod sort;
pub mod stamp;

pub use bus::{EventBus, SubscriptionId};
pub use error::{Error, Result};
pub use filter::{parse_filter, Filter, Predicate};
pub use origin::OriginId;
pub use protocol::{ClientFrame, PushMessage, PushMode, ServerFrame};
pub use record::{Fields, HasFields, Record};
pub use sort::{Direction, NullsPosition, SortKey, SortSpec};
pub use stamp::{ClockSource, Stamp, Stamper, SystemClock};
