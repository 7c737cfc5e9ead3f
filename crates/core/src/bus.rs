// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-process publish/subscribe with wildcard topics.
//!
//! Topics are plain strings. A subscription topic containing `*` is a
//! pattern: each `*` matches any run of characters, including `/` and `.`,
//! so `a.*.c` accepts both `a.x.c` and `a.x.y.c`.
//!
//! Dispatch is synchronous and single-threaded. On `publish`, handlers for
//! the exact topic run first, then matching wildcard handlers, each group in
//! registration order. Handlers may subscribe, unsubscribe or publish from
//! inside a dispatch; the handler list of an in-flight dispatch is fixed when
//! it starts.

use regex::Regex;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Rc<dyn Fn(&E, &str)>;

struct ExactEntry<E> {
    id: SubscriptionId,
    handler: Handler<E>,
}

struct WildcardEntry<E> {
    id: SubscriptionId,
    pattern: String,
    matcher: Regex,
    handler: Handler<E>,
}

/// Event bus carrying events of type `E`.
pub struct EventBus<E> {
    next_id: Cell<u64>,
    exact: RefCell<HashMap<String, Vec<ExactEntry<E>>>>,
    wildcard: RefCell<Vec<WildcardEntry<E>>>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        EventBus {
            next_id: Cell::new(0),
            exact: RefCell::new(HashMap::new()),
            wildcard: RefCell::new(Vec::new()),
        }
    }

    /// Registers `handler` for `topic`.
    ///
    /// Wildcard topics are compiled here, once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTopic`] if the compiled pattern is rejected by
    /// the regex engine (only possible for pathologically long topics).
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&E, &str) + 'static,
    {
        let id = self.allocate_id();
        let handler: Handler<E> = Rc::new(handler);

        if is_pattern(topic) {
            let matcher = compile_pattern(topic)?;
            self.wildcard.borrow_mut().push(WildcardEntry {
                id,
                pattern: topic.to_string(),
                matcher,
                handler,
            });
        } else {
            self.exact
                .borrow_mut()
                .entry(topic.to_string())
                .or_default()
                .push(ExactEntry { id, handler });
        }
        Ok(id)
    }

    /// Removes a subscription. Returns true if it was registered under `topic`.
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> bool {
        if is_pattern(topic) {
            let mut wildcard = self.wildcard.borrow_mut();
            let before = wildcard.len();
            wildcard.retain(|w| !(w.id == id && w.pattern == topic));
            return wildcard.len() != before;
        }

        let mut exact = self.exact.borrow_mut();
        let Some(entries) = exact.get_mut(topic) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            exact.remove(topic);
        }
        removed
    }

    /// Delivers `event` to every handler matching `topic`.
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&self, topic: &str, event: &E) -> usize {
        let handlers = self.handlers_for(topic);
        for handler in &handlers {
            handler(event, topic);
        }
        handlers.len()
    }

    /// Returns the number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        let exact: usize = self.exact.borrow().values().map(Vec::len).sum();
        exact + self.wildcard.borrow().len()
    }

    fn handlers_for(&self, topic: &str) -> Vec<Handler<E>> {
        let mut handlers: Vec<Handler<E>> = self
            .exact
            .borrow()
            .get(topic)
            .map(|entries| entries.iter().map(|e| Rc::clone(&e.handler)).collect())
            .unwrap_or_default();

        handlers.extend(
            self.wildcard
                .borrow()
                .iter()
                .filter(|w| w.matcher.is_match(topic))
                .map(|w| Rc::clone(&w.handler)),
        );
        handlers
    }

    fn allocate_id(&self) -> SubscriptionId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        SubscriptionId(id)
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<String> = self.wildcard.borrow().iter().map(|w| w.pattern.clone()).collect();
        f.debug_struct("EventBus")
            .field("exact_topics", &self.exact.borrow().len())
            .field("patterns", &patterns)
            .finish()
    }
}

/// Returns true if `topic` is a wildcard pattern.
pub fn is_pattern(topic: &str) -> bool {
    topic.contains('*')
}

/// Compiles a wildcard topic into an anchored matcher.
pub fn compile_pattern(topic: &str) -> Result<Regex> {
    let body = topic
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).map_err(|source| Error::InvalidTopic {
        topic: topic.to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
