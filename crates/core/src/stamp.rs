// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Write stamps for echo suppression.
//!
//! Every local mutation of an entity is stamped with a triple:
//!
//! ```text
//! (seq, written_at, origin)
//! ```
//!
//! - `seq` is a per-client counter that only moves forward
//! - `written_at` is the wall-clock time of the write in milliseconds
//! - `origin` identifies the client installation that made the write
//!
//! The server stores the triple with the record (`_s`, `_t`, `_u`) and sends it
//! back in push notifications. When an inbound triple equals the entity's
//! current triple, the notification is an echo of our own write and is
//! discarded.

use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::origin::OriginId;
use crate::record::{Fields, ORIGIN_KEY, SEQ_KEY, TIME_KEY};

/// The `(seq, written_at, origin)` triple of a write.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stamp {
    /// Per-client write counter.
    pub seq: u64,
    /// Wall clock time in milliseconds since Unix epoch.
    pub written_at: i64,
    /// Origin id of the writing client.
    pub origin: OriginId,
}

impl Stamp {
    pub fn new(seq: u64, written_at: i64, origin: OriginId) -> Self {
        Stamp { seq, written_at, origin }
    }

    /// Reads a stamp from the `_s`/`_t`/`_u` keys of a payload.
    ///
    /// Returns `None` unless all three keys are present with the right types.
    pub fn read(fields: &Fields) -> Option<Stamp> {
        let seq = fields.get(SEQ_KEY)?.as_u64()?;
        let written_at = fields.get(TIME_KEY)?.as_i64()?;
        let origin = fields.get(ORIGIN_KEY)?.as_str()?;
        Some(Stamp::new(seq, written_at, OriginId::from(origin)))
    }

    /// Writes this stamp into the `_s`/`_t`/`_u` keys of a payload.
    pub fn write_into(&self, fields: &mut Fields) {
        fields.insert(SEQ_KEY.to_string(), Value::from(self.seq));
        fields.insert(TIME_KEY.to_string(), Value::from(self.written_at));
        fields.insert(ORIGIN_KEY.to_string(), Value::from(self.origin.as_str()));
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.seq, self.written_at, self.origin)
    }
}

/// Trait for getting the current wall clock time.
///
/// This allows injecting a mock clock for testing.
pub trait ClockSource {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> i64;
}

/// System clock implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Box<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Produces stamps for local writes.
///
/// The sequence is shared by all entities of one client, so two writes never
/// carry the same triple even within the same millisecond.
pub struct Stamper<C: ClockSource = SystemClock> {
    clock: C,
    origin: OriginId,
    seq: AtomicU64,
}

impl Stamper<SystemClock> {
    /// Creates a stamper with the system clock.
    pub fn new(origin: OriginId) -> Self {
        Self::with_clock(SystemClock, origin)
    }
}

impl<C: ClockSource> Stamper<C> {
    /// Creates a stamper with a custom clock source.
    pub fn with_clock(clock: C, origin: OriginId) -> Self {
        Stamper { clock, origin, seq: AtomicU64::new(0) }
    }

    pub fn origin(&self) -> &OriginId {
        &self.origin
    }

    /// Returns the last sequence number handed out.
    pub fn last_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Stamps a new local write.
    pub fn next(&self) -> Stamp {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        Stamp::new(seq, self.clock.now_ms(), self.origin.clone())
    }

    /// Moves the counter past a sequence seen from our own origin.
    ///
    /// An origin id persisted across restarts would otherwise reuse sequence
    /// numbers the server already holds.
    pub fn observe(&self, stamp: &Stamp) {
        if stamp.origin == self.origin {
            self.seq.fetch_max(stamp.seq, Ordering::SeqCst);
        }
    }
}

impl<C: ClockSource> fmt::Debug for Stamper<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stamper")
            .field("origin", &self.origin)
            .field("seq", &self.last_seq())
            .finish()
    }
}

#[cfg(test)]
#[path = "stamp_tests.rs"]
mod tests;
