// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the push channel into the object store.
//!
//! The channel runs as its own task and forwards push messages over an
//! unbounded queue. The runtime drains that queue on the store's thread,
//! routes each message, then ticks the context so live lists flush.

use std::sync::Arc;

use mirra_core::{OriginId, PushMessage};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::adapter::{RestAdapter, StorageAdapter};
use crate::channel::{ChannelHandle, ResilientChannel, Transport};
use crate::config::Config;
use crate::context::Context;
use crate::error::Result;
use crate::store::{KindSpec, ObjectStore, RouteOutcome};

/// An object store fed by a push channel.
pub struct Runtime {
    config: Config,
    store: ObjectStore,
    sender: UnboundedSender<PushMessage>,
    receiver: UnboundedReceiver<PushMessage>,
    channel: Option<ChannelHandle>,
}

impl Runtime {
    /// Builds a runtime with the origin and settings named by `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let origin = OriginId::resolve(config.origin_file.as_deref())?;
        let ctx = Context::new(origin, config.settings());
        Ok(Self::with_context(config, ctx))
    }

    /// Builds a runtime around an existing context.
    pub fn with_context(config: Config, ctx: Context) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Runtime { config, store: ObjectStore::new(ctx), sender, receiver, channel: None }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn context(&self) -> &Context {
        self.store.context()
    }

    /// Registers `kind` backed by the REST endpoints in the config.
    pub fn register_rest_kind(&self, kind: &str) -> Result<()> {
        let adapter = RestAdapter::new(self.config.server.base_url.clone())
            .with_codec(self.config.adapter.field_case);
        let adapter: Arc<dyn StorageAdapter> = Arc::new(adapter);
        self.store.register(KindSpec::new(kind, adapter))
    }

    /// Starts the push channel on `transport`. Replaces any running channel.
    pub fn connect<T: Transport + 'static>(&mut self, transport: T) {
        let sender = self.sender.clone();
        let channel = ResilientChannel::new(self.config.server.push_url.clone(), transport, move |msg| {
            let _ = sender.send(msg);
        })
        .with_backoff(self.config.channel.backoff());
        info!(url = %channel.url(), "starting push channel");
        self.channel = Some(channel.spawn());
    }

    /// Stops the push channel.
    pub fn disconnect(&mut self) {
        if let Some(handle) = self.channel.take() {
            handle.shutdown();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.channel.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Injects a message as if it came from the channel.
    pub fn sender(&self) -> UnboundedSender<PushMessage> {
        self.sender.clone()
    }

    /// Routes every queued message, then ticks once.
    pub fn pump_pending(&mut self) -> Vec<RouteOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            outcomes.push(self.route(&msg));
        }
        self.store.context().tick();
        outcomes
    }

    /// Waits for at least one message, routes everything queued, then ticks.
    pub async fn next_batch(&mut self) -> Vec<RouteOutcome> {
        // The runtime holds a sender, so the queue never closes.
        let Some(first) = self.receiver.recv().await else {
            return Vec::new();
        };
        let mut outcomes = vec![self.route(&first)];
        outcomes.extend(self.pump_pending());
        outcomes
    }

    fn route(&self, msg: &PushMessage) -> RouteOutcome {
        let outcome = self.store.route(msg);
        debug!(path = %msg.path, ?outcome, "routed");
        outcome
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
