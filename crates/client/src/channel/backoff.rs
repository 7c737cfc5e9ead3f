// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential reconnect delay.

use std::time::Duration;

pub const DEFAULT_FLOOR_MS: u64 = 1_000;
pub const DEFAULT_CEILING_MS: u64 = 30_000;

/// Doubling delay between `floor` and `ceiling`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    floor_ms: u64,
    ceiling_ms: u64,
    current_ms: u64,
}

impl Backoff {
    /// Creates a backoff. A ceiling below the floor is raised to the floor.
    pub fn new(floor_ms: u64, ceiling_ms: u64) -> Self {
        let floor_ms = floor_ms.max(1);
        Backoff { floor_ms, ceiling_ms: ceiling_ms.max(floor_ms), current_ms: floor_ms }
    }

    /// Returns the delay to wait now and doubles the next one, up to the ceiling.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_ms;
        self.current_ms = std::cmp::min(self.current_ms.saturating_mul(2), self.ceiling_ms);
        Duration::from_millis(delay)
    }

    /// Returns to the floor. Called when a connection opens.
    pub fn reset(&mut self) {
        self.current_ms = self.floor_ms;
    }

    /// The delay [`next_delay`](Self::next_delay) will return.
    pub fn peek(&self) -> Duration {
        Duration::from_millis(self.current_ms)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::new(DEFAULT_FLOOR_MS, DEFAULT_CEILING_MS)
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
