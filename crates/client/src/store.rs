// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The object store: every known entity, partitioned by kind.
//!
//! Each kind is registered with the adapter that persists it and, optionally,
//! a server-side filter and extra path aliases. Partitions are created on
//! first insertion and entities are never removed; deletion is a tombstone.
//!
//! Inbound push messages are routed here. Creates for unknown ids pass a gate
//! first: the kind's server filter, then the union of the filters of every
//! live list open on the kind.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use mirra_core::record::{ID_KEY, TOMBSTONE_KEY};
use mirra_core::{Fields, Filter, PushMessage, PushMode};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::adapter::StorageAdapter;
use crate::context::{kind_topic, Context, EventKind};
use crate::entity::Entity;
use crate::error::{Error, Result};

/// Registration of one entity kind.
pub struct KindSpec {
    name: String,
    adapter: Arc<dyn StorageAdapter>,
    server_filter: Option<Filter>,
    paths: Vec<String>,
}

impl KindSpec {
    pub fn new(name: impl Into<String>, adapter: Arc<dyn StorageAdapter>) -> Self {
        KindSpec { name: name.into(), adapter, server_filter: None, paths: Vec::new() }
    }

    /// Restricts inbound creates to records the server would return for this filter.
    pub fn server_filter(mut self, filter: Filter) -> Self {
        self.server_filter = Some(filter);
        self
    }

    /// Adds a path that routes to this kind, besides `/<kind>`.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }
}

/// What [`ObjectStore::route`] did with a push message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A new entity was inserted and announced.
    Created(String),
    /// An existing entity took the new state.
    Reconciled(String),
    /// The message carried the entity's current stamp.
    Echo(String),
    /// Nothing happened.
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    UnknownKind,
    MissingId,
    MissingTarget,
    Filtered,
}

struct KindEntry {
    adapter: Arc<dyn StorageAdapter>,
    server_filter: Option<Filter>,
    interests: Vec<(u64, Filter)>,
}

#[derive(Default)]
struct State {
    kinds: HashMap<String, KindEntry>,
    paths: HashMap<String, String>,
    partitions: HashMap<String, BTreeMap<String, Entity>>,
    next_interest: u64,
}

struct Shared {
    ctx: Context,
    state: RefCell<State>,
}

/// Handle to the store. Clones share the same store.
#[derive(Clone)]
pub struct ObjectStore(Rc<Shared>);

impl ObjectStore {
    pub fn new(ctx: Context) -> Self {
        ObjectStore(Rc::new(Shared { ctx, state: RefCell::new(State::default()) }))
    }

    pub fn context(&self) -> &Context {
        &self.0.ctx
    }

    /// Registers a kind with its adapter.
    pub fn register_kind(&self, kind: &str, adapter: Arc<dyn StorageAdapter>) -> Result<()> {
        self.register(KindSpec::new(kind, adapter))
    }

    /// Registers a kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KindExists`] if the kind is already registered.
    pub fn register(&self, spec: KindSpec) -> Result<()> {
        let mut state = self.0.state.borrow_mut();
        if state.kinds.contains_key(&spec.name) {
            return Err(Error::KindExists(spec.name));
        }
        state.paths.insert(kind_topic(&spec.name), spec.name.clone());
        for path in spec.paths {
            state.paths.insert(path, spec.name.clone());
        }
        state.kinds.insert(
            spec.name,
            KindEntry { adapter: spec.adapter, server_filter: spec.server_filter, interests: Vec::new() },
        );
        Ok(())
    }

    /// Returns the registered kinds, sorted.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.0.state.borrow().kinds.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.0.state.borrow().kinds.contains_key(kind)
    }

    /// Returns the adapter registered for `kind`.
    pub fn adapter(&self, kind: &str) -> Result<Arc<dyn StorageAdapter>> {
        self.0
            .state
            .borrow()
            .kinds
            .get(kind)
            .map(|entry| Arc::clone(&entry.adapter))
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))
    }

    /// Inserts an entity without announcing it. Returns the entity it replaced.
    pub fn put(&self, entity: Entity) -> Option<Entity> {
        self.0
            .state
            .borrow_mut()
            .partitions
            .entry(entity.kind().to_string())
            .or_default()
            .insert(entity.id().to_string(), entity)
    }

    pub fn get(&self, kind: &str, id: &str) -> Option<Entity> {
        self.0.state.borrow().partitions.get(kind).and_then(|p| p.get(id)).cloned()
    }

    pub fn has(&self, kind: &str, id: &str) -> bool {
        self.0.state.borrow().partitions.get(kind).is_some_and(|p| p.contains_key(id))
    }

    /// Returns every entity of `kind`, tombstoned ones included, in id order.
    pub fn all(&self, kind: &str) -> Vec<Entity> {
        self.0
            .state
            .borrow()
            .partitions
            .get(kind)
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, kind: &str) -> usize {
        self.0.state.borrow().partitions.get(kind).map_or(0, BTreeMap::len)
    }

    /// Creates a local entity with a fresh UUIDv4 id and announces `created`.
    pub fn create(&self, kind: &str, fields: Fields) -> Result<Entity> {
        self.create_with_id(kind, &Uuid::new_v4().to_string(), fields)
    }

    /// Creates a local entity with a caller-chosen id and announces `created`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownKind`] for unregistered kinds and
    /// [`Error::EntityExists`] if the id is taken.
    pub fn create_with_id(&self, kind: &str, id: &str, fields: Fields) -> Result<Entity> {
        let adapter = self.adapter(kind)?;
        if self.has(kind, id) {
            return Err(Error::EntityExists { kind: kind.to_string(), id: id.to_string() });
        }
        let entity = Entity::local(&self.0.ctx, adapter, kind, id, &fields);
        self.put(entity.clone());
        entity.announce(EventKind::Created);
        Ok(entity)
    }

    /// Brings a fetched server record into the store.
    ///
    /// Known ids are reconciled; new ones are inserted and announced. No
    /// create gating applies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownKind`] or [`Error::MissingId`].
    pub fn materialize(&self, kind: &str, data: &Fields) -> Result<Entity> {
        let id = record_id(data).ok_or_else(|| Error::MissingId(kind.to_string()))?;
        if let Some(existing) = self.get(kind, &id) {
            existing.reconcile(data);
            return Ok(existing);
        }
        let adapter = self.adapter(kind)?;
        let entity = Entity::from_server(&self.0.ctx, adapter, kind, &id, data);
        self.put(entity.clone());
        entity.announce(EventKind::Created);
        Ok(entity)
    }

    /// Registers a live list's filter for create gating.
    ///
    /// The interest lasts until the returned handle is dropped.
    pub fn register_interest(&self, kind: &str, filter: Filter) -> Result<InterestHandle> {
        let mut state = self.0.state.borrow_mut();
        state.next_interest += 1;
        let id = state.next_interest;
        let entry = state
            .kinds
            .get_mut(kind)
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))?;
        entry.interests.push((id, filter));
        Ok(InterestHandle { store: Rc::downgrade(&self.0), kind: kind.to_string(), id })
    }

    pub fn interest_count(&self, kind: &str) -> usize {
        self.0.state.borrow().kinds.get(kind).map_or(0, |e| e.interests.len())
    }

    /// Returns true if an inbound create of `data` should be admitted.
    pub fn admits(&self, kind: &str, data: &Fields) -> bool {
        let state = self.0.state.borrow();
        let Some(entry) = state.kinds.get(kind) else {
            return false;
        };
        if let Some(filter) = &entry.server_filter {
            if !filter.matches(data) {
                return false;
            }
        }
        entry.interests.is_empty() || entry.interests.iter().any(|(_, f)| f.matches(data))
    }

    /// Resolves a push path to a registered kind.
    ///
    /// Tries the whole path first, then its first segment.
    pub fn resolve_kind(&self, path: &str) -> Option<String> {
        let state = self.0.state.borrow();
        if let Some(kind) = state.paths.get(path) {
            return Some(kind.clone());
        }
        let first = path.split('/').find(|s| !s.is_empty())?;
        state.paths.get(&kind_topic(first)).cloned()
    }

    /// Applies a push message.
    ///
    /// The payload is first decoded by the kind's adapter. Messages for
    /// unknown kinds or missing entities are dropped with a debug log.
    pub fn route(&self, msg: &PushMessage) -> RouteOutcome {
        let Some(kind) = self.resolve_kind(&msg.path) else {
            return dropped(msg, DropReason::UnknownKind);
        };
        let Some(id) = msg.target_id() else {
            return dropped(msg, DropReason::MissingId);
        };
        let Ok(adapter) = self.adapter(&kind) else {
            return dropped(msg, DropReason::UnknownKind);
        };

        let mut data = adapter.decode_push(&msg.data);
        if msg.mode == PushMode::Delete && !data.contains_key(TOMBSTONE_KEY) {
            data.insert(TOMBSTONE_KEY.to_string(), Value::Bool(true));
        }

        if let Some(entity) = self.get(&kind, &id) {
            return if entity.reconcile(&data) {
                RouteOutcome::Reconciled(id)
            } else {
                RouteOutcome::Echo(id)
            };
        }

        match msg.mode {
            PushMode::Create => {
                if !self.admits(&kind, &data) {
                    return dropped(msg, DropReason::Filtered);
                }
                let entity = Entity::from_server(&self.0.ctx, adapter, &kind, &id, &data);
                self.put(entity.clone());
                entity.announce(EventKind::Created);
                RouteOutcome::Created(id)
            }
            PushMode::Update | PushMode::Delete => dropped(msg, DropReason::MissingTarget),
        }
    }
}

fn dropped(msg: &PushMessage, reason: DropReason) -> RouteOutcome {
    debug!(path = %msg.path, mode = ?msg.mode, ?reason, "push dropped");
    RouteOutcome::Dropped(reason)
}

/// Reads `_id` as a string. Numeric ids are accepted.
fn record_id(data: &Fields) -> Option<String> {
    match data.get(ID_KEY)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.borrow();
        let sizes: BTreeMap<&str, usize> =
            state.partitions.iter().map(|(k, p)| (k.as_str(), p.len())).collect();
        f.debug_struct("ObjectStore").field("partitions", &sizes).finish()
    }
}

/// Keeps a live list's filter registered for create gating.
pub struct InterestHandle {
    store: Weak<Shared>,
    kind: String,
    id: u64,
}

impl Drop for InterestHandle {
    fn drop(&mut self) {
        let Some(shared) = self.store.upgrade() else {
            return;
        };
        if withdraw_interest(&shared, &self.kind, self.id) {
            return;
        }
        debug!(kind = %self.kind, id = self.id, "store busy, withdrawing interest on next tick");
        let store = Weak::clone(&self.store);
        let kind = self.kind.clone();
        let id = self.id;
        shared.ctx.defer(move || {
            if let Some(shared) = store.upgrade() {
                if !withdraw_interest(&shared, &kind, id) {
                    warn!(%kind, id, "interest could not be withdrawn");
                }
            }
        });
    }
}

/// Removes one interest. Returns false if the store is borrowed.
fn withdraw_interest(shared: &Shared, kind: &str, id: u64) -> bool {
    let Ok(mut state) = shared.state.try_borrow_mut() else {
        return false;
    };
    if let Some(entry) = state.kinds.get_mut(kind) {
        entry.interests.retain(|(interest, _)| *interest != id);
    }
    true
}

impl fmt::Debug for InterestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterestHandle").field("kind", &self.kind).field("id", &self.id).finish()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
