// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared services for one client: the event bus, the write stamper, the
//! deferred-task queue and list settings.
//!
//! A [`Context`] is a cheap handle. Entities, the object store and live
//! lists each hold a clone; nothing is global.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use mirra_core::{ClockSource, EventBus, Fields, OriginId, Record, Stamper, SystemClock};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What happened to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Updated,
    Saving,
    Saved,
    Deleting,
    Deleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Saving => "saving",
            EventKind::Saved => "saved",
            EventKind::Deleting => "deleting",
            EventKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity lifecycle event as carried on the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityEvent {
    pub kind: EventKind,
    pub entity_kind: String,
    pub id: String,
    /// Snapshot of the entity's fields at publish time, metadata included.
    pub data: Fields,
}

impl EntityEvent {
    pub fn record(&self) -> Record {
        Record::new(self.id.clone(), self.data.clone())
    }
}

/// How live lists treat tombstoned records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TombstonePolicy {
    /// Tombstoned records fail every filter.
    #[default]
    Hide,
    /// Tombstoned records are left to the filter.
    Show,
}

/// Tunables shared by everything built on one context.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub tombstones: TombstonePolicy,
}

/// Topic under which every event for a kind is published: `/<kind>`.
pub fn kind_topic(kind: &str) -> String {
    format!("/{kind}")
}

/// Topic for one entity: `/<kind>/<id>`.
pub fn entity_topic(kind: &str, id: &str) -> String {
    format!("/{kind}/{id}")
}

type Deferred = Box<dyn FnOnce()>;

struct Inner {
    bus: EventBus<EntityEvent>,
    stamper: Stamper<Box<dyn ClockSource>>,
    deferred: RefCell<VecDeque<Deferred>>,
    settings: Settings,
}

/// Handle to the services of one client.
#[derive(Clone)]
pub struct Context(Rc<Inner>);

impl Context {
    /// Creates a context using the system clock.
    pub fn new(origin: OriginId, settings: Settings) -> Self {
        Self::with_clock(Box::new(SystemClock), origin, settings)
    }

    /// Creates a context with a custom clock source.
    pub fn with_clock(clock: Box<dyn ClockSource>, origin: OriginId, settings: Settings) -> Self {
        Context(Rc::new(Inner {
            bus: EventBus::new(),
            stamper: Stamper::with_clock(clock, origin),
            deferred: RefCell::new(VecDeque::new()),
            settings,
        }))
    }

    pub fn bus(&self) -> &EventBus<EntityEvent> {
        &self.0.bus
    }

    pub fn stamper(&self) -> &Stamper<Box<dyn ClockSource>> {
        &self.0.stamper
    }

    pub fn origin(&self) -> &OriginId {
        self.0.stamper.origin()
    }

    pub fn settings(&self) -> &Settings {
        &self.0.settings
    }

    /// Publishes an event on the entity topic, then on the kind topic.
    pub fn publish(&self, event: &EntityEvent) {
        let delivered = self
            .0
            .bus
            .publish(&entity_topic(&event.entity_kind, &event.id), event)
            + self.0.bus.publish(&kind_topic(&event.entity_kind), event);
        debug!(
            kind = %event.entity_kind,
            id = %event.id,
            event = %event.kind,
            delivered,
            "published"
        );
    }

    /// Queues a task for the next [`tick`](Self::tick).
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.0.deferred.borrow_mut().push_back(Box::new(task));
    }

    /// Returns the number of queued tasks.
    pub fn pending(&self) -> usize {
        self.0.deferred.borrow().len()
    }

    /// Runs every task queued before this call.
    ///
    /// Tasks queued while the batch runs wait for the next tick. Returns the
    /// number of tasks run.
    pub fn tick(&self) -> usize {
        let batch: Vec<Deferred> = self.0.deferred.borrow_mut().drain(..).collect();
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }

    /// Ticks until the queue stays empty, up to `max_rounds` times.
    pub fn settle(&self, max_rounds: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_rounds {
            let ran = self.tick();
            if ran == 0 {
                break;
            }
            total += ran;
        }
        total
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("origin", self.origin())
            .field("settings", &self.0.settings)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
