// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use mirra_core::{ClockSource, Fields, OriginId};
use serde_json::Value;

use crate::adapter::MemoryAdapter;
use crate::context::{Context, EntityEvent, Settings};
use crate::store::ObjectStore;

pub const ORIGIN: &str = "origin-under-test";

/// Clock that only moves when told to.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<i64>>);

impl ManualClock {
    pub fn advance(&self, ms: i64) {
        self.0.set(self.0.get() + ms);
    }
}

impl ClockSource for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }
}

/// Builds a context with a manual clock starting at 1000 ms.
pub fn test_context(settings: Settings) -> (Context, ManualClock) {
    let clock = ManualClock::default();
    clock.advance(1000);
    let ctx = Context::with_clock(Box::new(clock.clone()), OriginId::from(ORIGIN), settings);
    (ctx, clock)
}

/// Builds a store with `persons` registered on a memory adapter.
pub fn test_store() -> (ObjectStore, MemoryAdapter) {
    test_store_with(Settings::default())
}

pub fn test_store_with(settings: Settings) -> (ObjectStore, MemoryAdapter) {
    let (ctx, _) = test_context(settings);
    let store = ObjectStore::new(ctx);
    let adapter = MemoryAdapter::new();
    let shared: Arc<dyn crate::adapter::StorageAdapter> = Arc::new(adapter.clone());
    let _ = store.register_kind("persons", shared);
    (store, adapter)
}

/// Converts a `json!` object into a field map.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Records every event published under `topic`.
pub fn record_events(ctx: &Context, topic: &str) -> Rc<RefCell<Vec<EntityEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _ = ctx
        .bus()
        .subscribe(topic, move |event: &EntityEvent, _: &str| sink.borrow_mut().push(event.clone()));
    seen
}
