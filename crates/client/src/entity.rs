// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronized entities.
//!
//! An entity keeps two copies of its fields: the optimistic copy that local
//! edits go to, and the confirmed copy last known to match the server. Each
//! copy carries the write stamp it was produced by. Every change is announced
//! on the bus under `/<kind>/<id>` and `/<kind>`.
//!
//! Inbound server state is applied with [`Entity::reconcile`]. A payload whose
//! stamp equals the current one is an echo of our own write and is ignored.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use mirra_core::record::{is_meta_key, is_tombstoned, strip_meta, ID_KEY, TOMBSTONE_KEY};
use mirra_core::{Fields, Record, Stamp};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::adapter::StorageAdapter;
use crate::context::{entity_topic, Context, EntityEvent, EventKind};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
struct Version {
    fields: Fields,
    stamp: Option<Stamp>,
    deleted: bool,
}

impl Version {
    fn from_payload(data: &Fields) -> Self {
        Version {
            fields: strip_meta(data),
            stamp: Stamp::read(data),
            deleted: is_tombstoned(data),
        }
    }
}

#[derive(Debug)]
struct State {
    local: Version,
    confirmed: Version,
    persisted: bool,
}

struct Inner {
    kind: String,
    id: String,
    ctx: Context,
    adapter: Arc<dyn StorageAdapter>,
    state: RefCell<State>,
    write_lock: Mutex<()>,
}

/// Handle to one synchronized record. Clones share the same entity.
#[derive(Clone)]
pub struct Entity(Rc<Inner>);

impl Entity {
    /// Builds a locally created entity. Not yet persisted and not announced.
    pub(crate) fn local(
        ctx: &Context,
        adapter: Arc<dyn StorageAdapter>,
        kind: &str,
        id: &str,
        fields: &Fields,
    ) -> Entity {
        let local = Version {
            fields: strip_meta(fields),
            stamp: Some(ctx.stamper().next()),
            deleted: false,
        };
        Self::build(ctx, adapter, kind, id, local, Version::default(), false)
    }

    /// Builds an entity from a server payload. Persisted and not announced.
    pub(crate) fn from_server(
        ctx: &Context,
        adapter: Arc<dyn StorageAdapter>,
        kind: &str,
        id: &str,
        data: &Fields,
    ) -> Entity {
        let version = Version::from_payload(data);
        if let Some(stamp) = &version.stamp {
            ctx.stamper().observe(stamp);
        }
        Self::build(ctx, adapter, kind, id, version.clone(), version, true)
    }

    fn build(
        ctx: &Context,
        adapter: Arc<dyn StorageAdapter>,
        kind: &str,
        id: &str,
        local: Version,
        confirmed: Version,
        persisted: bool,
    ) -> Entity {
        Entity(Rc::new(Inner {
            kind: kind.to_string(),
            id: id.to_string(),
            ctx: ctx.clone(),
            adapter,
            state: RefCell::new(State { local, confirmed, persisted }),
            write_lock: Mutex::new(()),
        }))
    }

    pub fn kind(&self) -> &str {
        &self.0.kind
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Server-relative path: `/<kind>/<id>`.
    pub fn path(&self) -> String {
        entity_topic(&self.0.kind, &self.0.id)
    }

    /// Returns a field of the optimistic copy.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.0.state.borrow().local.fields.get(field).cloned()
    }

    /// Returns the optimistic copy without metadata.
    pub fn fields(&self) -> Fields {
        self.0.state.borrow().local.fields.clone()
    }

    /// Returns the optimistic copy with `_id`, the stamp and `_x`.
    pub fn snapshot(&self) -> Fields {
        payload(&self.0.id, &self.0.state.borrow().local)
    }

    pub fn record(&self) -> Record {
        Record::new(self.0.id.clone(), self.snapshot())
    }

    pub fn stamp(&self) -> Option<Stamp> {
        self.0.state.borrow().local.stamp.clone()
    }

    pub fn is_persisted(&self) -> bool {
        self.0.state.borrow().persisted
    }

    pub fn is_deleted(&self) -> bool {
        self.0.state.borrow().local.deleted
    }

    /// Returns true if the optimistic copy differs from the confirmed one.
    pub fn is_dirty(&self) -> bool {
        let state = self.0.state.borrow();
        state.local.fields != state.confirmed.fields || state.local.deleted != state.confirmed.deleted
    }

    /// Returns true if both handles refer to the same entity.
    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Sets one field and announces `updated`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReservedField`] for metadata keys.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        let mut fields = Fields::new();
        fields.insert(field.to_string(), value.into());
        self.set_many(fields)
    }

    /// Sets several fields under one new stamp and announces `updated` once.
    pub fn set_many(&self, fields: Fields) -> Result<()> {
        if let Some(key) = fields.keys().find(|k| is_meta_key(k)) {
            return Err(Error::ReservedField(key.clone()));
        }
        {
            let mut state = self.0.state.borrow_mut();
            state.local.fields.extend(fields);
            state.local.stamp = Some(self.0.ctx.stamper().next());
        }
        self.announce(EventKind::Updated);
        Ok(())
    }

    /// Applies server state.
    ///
    /// Returns false, without announcing anything, when `incoming` carries the
    /// current stamp. Otherwise merges its fields over both copies, adopts its
    /// stamp and tombstone, marks the entity persisted and announces `updated`.
    pub fn reconcile(&self, incoming: &Fields) -> bool {
        let theirs = Version::from_payload(incoming);
        {
            let state = self.0.state.borrow();
            if theirs.stamp.is_some() && theirs.stamp == state.local.stamp {
                debug!(kind = %self.0.kind, id = %self.0.id, "echo suppressed");
                return false;
            }
        }
        if let Some(stamp) = &theirs.stamp {
            self.0.ctx.stamper().observe(stamp);
        }
        {
            let mut guard = self.0.state.borrow_mut();
            let state = &mut *guard;
            let carries_tombstone = incoming.contains_key(TOMBSTONE_KEY);
            for version in [&mut state.local, &mut state.confirmed] {
                version.fields.extend(theirs.fields.clone());
                if theirs.stamp.is_some() {
                    version.stamp = theirs.stamp.clone();
                }
                if carries_tombstone {
                    version.deleted = theirs.deleted;
                }
            }
            state.persisted = true;
        }
        self.announce(EventKind::Updated);
        true
    }

    /// Writes the optimistic copy to the server.
    ///
    /// Announces `saving`, calls `update_one` (or `create_one` for an entity
    /// the server has not seen), then records what was sent as confirmed and
    /// announces `saved`. Saves of one entity run one at a time.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures. Local state is left as it was.
    pub async fn save(&self) -> Result<()> {
        let _guard = self.0.write_lock.lock().await;
        self.announce(EventKind::Saving);

        let (sent, persisted) = {
            let state = self.0.state.borrow();
            (state.local.clone(), state.persisted)
        };
        let body = payload(&self.0.id, &sent);
        let adapter = Arc::clone(&self.0.adapter);
        if persisted {
            adapter.update_one(&self.0.kind, &self.0.id, &body).await?;
        } else {
            adapter.create_one(&self.0.kind, &self.0.id, &body).await?;
        }

        {
            let mut state = self.0.state.borrow_mut();
            state.persisted = true;
            state.confirmed = sent;
        }
        debug!(kind = %self.0.kind, id = %self.0.id, created = !persisted, "saved");
        self.announce(EventKind::Saved);
        Ok(())
    }

    /// Restores the confirmed copy and its stamp, then announces `updated`.
    pub fn revert(&self) {
        {
            let mut state = self.0.state.borrow_mut();
            state.local = state.confirmed.clone();
        }
        self.announce(EventKind::Updated);
    }

    /// Tombstones the entity on the server, then locally.
    ///
    /// Announces `deleting`, calls `delete_one`, sets `_x`, then announces
    /// `deleted` carrying the snapshot from before the deletion.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures; the entity stays live.
    pub async fn delete(&self) -> Result<()> {
        let _guard = self.0.write_lock.lock().await;
        let before = self.snapshot();
        self.announce_with(EventKind::Deleting, before.clone());

        let tombstone = {
            let state = self.0.state.borrow();
            Version {
                fields: state.local.fields.clone(),
                stamp: Some(self.0.ctx.stamper().next()),
                deleted: true,
            }
        };
        let body = payload(&self.0.id, &tombstone);
        let adapter = Arc::clone(&self.0.adapter);
        adapter.delete_one(&self.0.kind, &self.0.id, &body).await?;

        {
            let mut state = self.0.state.borrow_mut();
            state.local = tombstone.clone();
            state.confirmed = tombstone;
            state.persisted = true;
        }
        debug!(kind = %self.0.kind, id = %self.0.id, "deleted");
        self.announce_with(EventKind::Deleted, before);
        Ok(())
    }

    /// Re-reads the entity from the server and adopts it as confirmed.
    ///
    /// Server fields are merged over the optimistic copy. Announces `updated`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the server has no such record, and
    /// propagates adapter failures.
    pub async fn load(&self) -> Result<()> {
        let _guard = self.0.write_lock.lock().await;
        let adapter = Arc::clone(&self.0.adapter);
        let data = adapter
            .read_one(&self.0.kind, &self.0.id)
            .await?
            .ok_or_else(|| Error::NotFound { kind: self.0.kind.clone(), id: self.0.id.clone() })?;

        let server = Version::from_payload(&data);
        if let Some(stamp) = &server.stamp {
            self.0.ctx.stamper().observe(stamp);
        }
        {
            let mut state = self.0.state.borrow_mut();
            state.local.fields.extend(server.fields.clone());
            if server.stamp.is_some() {
                state.local.stamp = server.stamp.clone();
            }
            state.local.deleted = server.deleted;
            state.confirmed = server;
            state.persisted = true;
        }
        self.announce(EventKind::Updated);
        Ok(())
    }

    /// Announces an event carrying the current snapshot.
    pub(crate) fn announce(&self, kind: EventKind) {
        self.announce_with(kind, self.snapshot());
    }

    fn announce_with(&self, kind: EventKind, data: Fields) {
        self.0.ctx.publish(&EntityEvent {
            kind,
            entity_kind: self.0.kind.clone(),
            id: self.0.id.clone(),
            data,
        });
    }
}

/// Wire form of a version: `_id`, fields, stamp, `_x`.
fn payload(id: &str, version: &Version) -> Fields {
    let mut out = Fields::new();
    out.insert(ID_KEY.to_string(), Value::String(id.to_string()));
    out.extend(version.fields.clone());
    if let Some(stamp) = &version.stamp {
        stamp.write_into(&mut out);
    }
    out.insert(TOMBSTONE_KEY.to_string(), Value::Bool(version.deleted));
    out
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.borrow();
        f.debug_struct("Entity")
            .field("kind", &self.0.kind)
            .field("id", &self.0.id)
            .field("persisted", &state.persisted)
            .field("local", &state.local)
            .finish()
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
