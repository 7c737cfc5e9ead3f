// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnecting push channel.
//!
//! The channel owns one transport and keeps it connected for as long as it
//! runs. Heartbeat probes are answered in place; push messages go to the
//! callback in arrival order. Any close or error, including a failed connect,
//! schedules a reconnect after an exponentially growing delay that resets
//! once a connection opens. There is no retry limit.

use mirra_core::{ClientFrame, PushMessage, ServerFrame};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::backoff::Backoff;
use super::transport::{Transport, TransportError, TransportResult};

type MessageCallback = Box<dyn FnMut(PushMessage) + Send>;

pub struct ResilientChannel<T: Transport> {
    url: String,
    transport: T,
    backoff: Backoff,
    on_message: MessageCallback,
}

impl<T: Transport + 'static> ResilientChannel<T> {
    pub fn new(url: impl Into<String>, transport: T, on_message: impl FnMut(PushMessage) + Send + 'static) -> Self {
        ResilientChannel {
            url: url.into(),
            transport,
            backoff: Backoff::default(),
            on_message: Box::new(on_message),
        }
    }

    /// Replaces the default 1 s to 30 s backoff.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Runs the connect/receive/reconnect loop. Never returns.
    pub async fn run(mut self) {
        loop {
            match self.session().await {
                Ok(()) => warn!(url = %self.url, "push channel closed"),
                Err(e) => error!(url = %self.url, error = %e, "push channel error"),
            }
            if let Err(e) = self.transport.disconnect().await {
                debug!(error = %e, "disconnect after failure");
            }
            let delay = self.backoff.next_delay();
            warn!(url = %self.url, ?delay, "reconnecting");
            tokio::time::sleep(delay).await;
        }
    }

    /// Runs the loop as a background task.
    pub fn spawn(self) -> ChannelHandle {
        ChannelHandle { task: tokio::spawn(self.run()) }
    }

    /// One connection, from connect to close.
    async fn session(&mut self) -> TransportResult<()> {
        self.transport.connect(&self.url).await?;
        info!(url = %self.url, "push channel open");
        self.backoff.reset();

        loop {
            let frame = match self.transport.recv().await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(()),
                Err(TransportError::Frame(e)) => {
                    warn!(error = %e, "undecodable frame");
                    continue;
                }
                Err(e) => return Err(e),
            };
            match frame {
                ServerFrame::Ping => self.transport.send(ClientFrame::Pong).await?,
                ServerFrame::Push(msg) => (self.on_message)(msg),
                ServerFrame::Other(value) => debug!(frame = %value, "ignoring frame"),
            }
        }
    }
}

/// Handle to a spawned channel. Dropping it stops the channel.
#[derive(Debug)]
pub struct ChannelHandle {
    task: JoinHandle<()>,
}

impl ChannelHandle {
    /// Stops the channel.
    pub fn shutdown(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "resilient_tests.rs"]
mod tests;
