// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Live lists: filtered, sorted views of one kind that stay current.
//!
//! Opening a list registers its filter with the store, fetches the kind
//! through its adapter, seeds the members and then follows `/<kind>` on the
//! bus. Each event admits, refreshes or evicts one member and marks the
//! list dirty. Dirty lists re-sort and notify their callbacks on the next
//! deferred tick, so a burst of events produces one notification.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use mirra_core::filter::apply;
use mirra_core::record::is_tombstoned;
use mirra_core::sort::sort;
use mirra_core::{Fields, Filter, Record, SortSpec, SubscriptionId};
use tracing::{debug, warn};

use crate::context::{kind_topic, Context, EntityEvent, EventKind, TombstonePolicy};
use crate::error::Result;
use crate::store::{InterestHandle, ObjectStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    /// Fetching; events are ignored.
    Pending,
    /// Following the bus.
    Active,
}

/// Identifies a callback registered with [`LiveList::on_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type ChangeCallback = Rc<dyn Fn(&[Record])>;

struct ListState {
    ctx: Context,
    kind: String,
    filter: Filter,
    sort: SortSpec,
    policy: TombstonePolicy,
    status: Cell<ListStatus>,
    members: RefCell<BTreeMap<String, Fields>>,
    view: RefCell<Vec<Record>>,
    dirty: Cell<bool>,
    scheduled: Cell<bool>,
    callbacks: RefCell<Vec<(CallbackId, ChangeCallback)>>,
    next_callback: Cell<u64>,
    flushes: Cell<u64>,
}

impl ListState {
    fn passes(&self, data: &Fields) -> bool {
        if self.policy == TombstonePolicy::Hide && is_tombstoned(data) {
            return false;
        }
        self.filter.matches(data)
    }

    fn on_event(self: &Rc<Self>, event: &EntityEvent) {
        if self.status.get() != ListStatus::Active {
            return;
        }
        let changed = match event.kind {
            EventKind::Created => self.passes(&event.data) && self.admit(event),
            EventKind::Updated => {
                let member = self.members.borrow().contains_key(&event.id);
                match (member, self.passes(&event.data)) {
                    (true, false) => self.evict(&event.id),
                    (_, true) => self.admit(event),
                    (false, false) => false,
                }
            }
            EventKind::Deleted => self.evict(&event.id),
            EventKind::Saving | EventKind::Saved | EventKind::Deleting => false,
        };
        if changed {
            self.mark_dirty();
        }
    }

    fn admit(&self, event: &EntityEvent) -> bool {
        self.members.borrow_mut().insert(event.id.clone(), event.data.clone());
        true
    }

    fn evict(&self, id: &str) -> bool {
        self.members.borrow_mut().remove(id).is_some()
    }

    fn mark_dirty(self: &Rc<Self>) {
        self.dirty.set(true);
        if self.scheduled.replace(true) {
            return;
        }
        let weak: Weak<ListState> = Rc::downgrade(self);
        self.ctx.defer(move || {
            if let Some(state) = weak.upgrade() {
                state.flush();
            }
        });
    }

    /// Rebuilds the sorted view from the members.
    fn rebuild(&self) -> Vec<Record> {
        let mut records: Vec<Record> = self
            .members
            .borrow()
            .iter()
            .map(|(id, data)| Record::new(id.clone(), data.clone()))
            .collect();
        sort(&mut records, &self.sort);
        *self.view.borrow_mut() = records.clone();
        records
    }

    fn flush(&self) {
        self.scheduled.set(false);
        if !self.dirty.replace(false) {
            return;
        }
        let records = self.rebuild();
        self.flushes.set(self.flushes.get() + 1);
        debug!(kind = %self.kind, members = records.len(), "live list changed");

        let callbacks: Vec<ChangeCallback> =
            self.callbacks.borrow().iter().map(|(_, cb)| Rc::clone(cb)).collect();
        for callback in callbacks {
            callback(&records);
        }
    }
}

/// A continuously updated query over one kind.
///
/// Dropping the list unsubscribes it from the bus and withdraws its filter
/// from create gating.
pub struct LiveList {
    state: Rc<ListState>,
    topic: String,
    subscription: SubscriptionId,
    _interest: InterestHandle,
}

impl LiveList {
    /// Opens a list over `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownKind`](crate::Error::UnknownKind) for
    /// unregistered kinds and propagates adapter failures from the fetch.
    pub async fn open(store: &ObjectStore, kind: &str, filter: Filter, sort_spec: SortSpec) -> Result<LiveList> {
        let adapter = store.adapter(kind)?;
        let interest = store.register_interest(kind, filter.clone())?;
        let ctx = store.context().clone();
        let state = Rc::new(ListState {
            policy: ctx.settings().tombstones,
            ctx: ctx.clone(),
            kind: kind.to_string(),
            filter,
            sort: sort_spec,
            status: Cell::new(ListStatus::Pending),
            members: RefCell::new(BTreeMap::new()),
            view: RefCell::new(Vec::new()),
            dirty: Cell::new(false),
            scheduled: Cell::new(false),
            callbacks: RefCell::new(Vec::new()),
            next_callback: Cell::new(0),
            flushes: Cell::new(0),
        });

        let fetched = adapter.fetch_all(kind, &state.filter, &state.sort).await?;
        debug!(kind, count = fetched.len(), "live list fetched");
        for data in &fetched {
            if let Err(e) = store.materialize(kind, data) {
                warn!(kind, error = %e, "skipping fetched record");
            }
        }

        let candidates: Vec<Record> = store.all(kind).iter().map(|e| e.record()).collect();
        let seeded: BTreeMap<String, Fields> = apply(&candidates, &state.filter)
            .into_iter()
            .filter(|r| state.policy == TombstonePolicy::Show || !r.is_tombstoned())
            .map(|r| (r.id.clone(), r.fields.clone()))
            .collect();
        *state.members.borrow_mut() = seeded;
        state.rebuild();
        state.status.set(ListStatus::Active);

        let topic = kind_topic(kind);
        let weak = Rc::downgrade(&state);
        let subscription = ctx.bus().subscribe(&topic, move |event: &EntityEvent, _: &str| {
            if let Some(state) = weak.upgrade() {
                state.on_event(event);
            }
        })?;

        Ok(LiveList { state, topic, subscription, _interest: interest })
    }

    pub fn kind(&self) -> &str {
        &self.state.kind
    }

    pub fn filter(&self) -> &Filter {
        &self.state.filter
    }

    pub fn sort_spec(&self) -> &SortSpec {
        &self.state.sort
    }

    pub fn status(&self) -> ListStatus {
        self.state.status.get()
    }

    /// Returns the members in sort order, as of the last tick.
    pub fn records(&self) -> Vec<Record> {
        self.state.view.borrow().clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.state.view.borrow().iter().map(|r| r.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.state.view.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.view.borrow().is_empty()
    }

    /// Returns true if `id` is a member, counting changes not yet flushed.
    pub fn contains(&self, id: &str) -> bool {
        self.state.members.borrow().contains_key(id)
    }

    /// Returns true if changes are waiting for the next tick.
    pub fn is_dirty(&self) -> bool {
        self.state.dirty.get()
    }

    /// Number of notifications delivered so far.
    pub fn flush_count(&self) -> u64 {
        self.state.flushes.get()
    }

    /// Registers a callback run with the sorted members after each change.
    pub fn on_change(&self, callback: impl Fn(&[Record]) + 'static) -> CallbackId {
        let id = CallbackId(self.state.next_callback.get() + 1);
        self.state.next_callback.set(id.0);
        self.state.callbacks.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    pub fn remove_callback(&self, id: CallbackId) -> bool {
        let mut callbacks = self.state.callbacks.borrow_mut();
        let before = callbacks.len();
        callbacks.retain(|(cb_id, _)| *cb_id != id);
        callbacks.len() != before
    }
}

impl Drop for LiveList {
    fn drop(&mut self) {
        self.state.ctx.bus().unsubscribe(&self.topic, self.subscription);
    }
}

impl fmt::Debug for LiveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveList")
            .field("kind", &self.state.kind)
            .field("status", &self.status())
            .field("len", &self.len())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

#[cfg(test)]
#[path = "live_list_tests.rs"]
mod tests;
