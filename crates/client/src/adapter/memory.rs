// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-process storage adapter.
//!
//! Keeps records in memory and logs every call. Useful offline and as a
//! stand-in server in tests. Deletes keep the row and mark it with `_x`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use mirra_core::record::TOMBSTONE_KEY;
use mirra_core::{Fields, Filter, SortSpec};
use serde_json::Value;

use super::{AdapterError, AdapterFuture, AdapterResult, StorageAdapter};

/// One adapter call, as recorded by [`MemoryAdapter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FetchAll { kind: String },
    ReadOne { kind: String, id: String },
    CreateOne { kind: String, id: String, fields: Fields },
    UpdateOne { kind: String, id: String, fields: Fields },
    DeleteOne { kind: String, id: String, fields: Fields },
}

#[derive(Debug, Default)]
struct State {
    records: HashMap<String, BTreeMap<String, Fields>>,
    calls: Vec<Call>,
    fail_next: Option<String>,
}

/// Storage adapter backed by a map. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    state: Arc<Mutex<State>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seeds a record as if the server already held it.
    pub fn insert(&self, kind: &str, id: &str, fields: Fields) {
        self.lock()
            .records
            .entry(kind.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Returns the stored record, if any.
    pub fn get(&self, kind: &str, id: &str) -> Option<Fields> {
        self.lock().records.get(kind).and_then(|m| m.get(id)).cloned()
    }

    /// Returns every call made so far.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Makes the next call fail with [`AdapterError::Rejected`].
    pub fn fail_next(&self, reason: impl Into<String>) {
        self.lock().fail_next = Some(reason.into());
    }

    fn record(&self, call: Call) -> AdapterResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(reason) => Err(AdapterError::Rejected(reason)),
            None => Ok(state),
        }
    }
}

impl StorageAdapter for MemoryAdapter {
    fn fetch_all<'a>(
        &'a self,
        kind: &'a str,
        _filter: &'a Filter,
        _sort: &'a SortSpec,
    ) -> AdapterFuture<'a, Vec<Fields>> {
        let result: AdapterResult<Vec<Fields>> = self.record(Call::FetchAll { kind: kind.to_string() }).map(|state| {
            state
                .records
                .get(kind)
                .map(|m| m.values().cloned().collect())
                .unwrap_or_default()
        });
        Box::pin(async move { result })
    }

    fn read_one<'a>(&'a self, kind: &'a str, id: &'a str) -> AdapterFuture<'a, Option<Fields>> {
        let call = Call::ReadOne { kind: kind.to_string(), id: id.to_string() };
        let result = self
            .record(call)
            .map(|state| state.records.get(kind).and_then(|m| m.get(id)).cloned());
        Box::pin(async move { result })
    }

    fn create_one<'a>(&'a self, kind: &'a str, id: &'a str, fields: &'a Fields) -> AdapterFuture<'a, ()> {
        let call = Call::CreateOne { kind: kind.to_string(), id: id.to_string(), fields: fields.clone() };
        let result = self.record(call).and_then(|mut state| {
            let partition = state.records.entry(kind.to_string()).or_default();
            if partition.contains_key(id) {
                return Err(AdapterError::Rejected(format!("{kind}/{id} already exists")));
            }
            partition.insert(id.to_string(), fields.clone());
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn update_one<'a>(&'a self, kind: &'a str, id: &'a str, fields: &'a Fields) -> AdapterFuture<'a, ()> {
        let call = Call::UpdateOne { kind: kind.to_string(), id: id.to_string(), fields: fields.clone() };
        let result = self.record(call).map(|mut state| {
            state
                .records
                .entry(kind.to_string())
                .or_default()
                .insert(id.to_string(), fields.clone());
        });
        Box::pin(async move { result })
    }

    fn delete_one<'a>(&'a self, kind: &'a str, id: &'a str, fields: &'a Fields) -> AdapterFuture<'a, ()> {
        let call = Call::DeleteOne { kind: kind.to_string(), id: id.to_string(), fields: fields.clone() };
        let result = self.record(call).map(|mut state| {
            let mut tombstone = fields.clone();
            tombstone.insert(TOMBSTONE_KEY.to_string(), Value::Bool(true));
            state.records.entry(kind.to_string()).or_default().insert(id.to_string(), tombstone);
        });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
