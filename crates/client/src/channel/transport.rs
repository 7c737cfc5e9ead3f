// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Frame-level connection to the push server.
//!
//! The resilient channel only sees [`Transport`]; production code plugs in
//! [`WebSocketTransport`] and tests plug in a scripted mock.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use mirra_core::{ClientFrame, ServerFrame};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    /// Send or receive without an open connection.
    #[error("not connected")]
    NotConnected,

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),

    /// A frame could not be encoded or decoded. The connection stays usable.
    #[error("bad frame: {0}")]
    Frame(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by transport methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// A duplex frame connection to the push server.
pub trait Transport: Send + Sync {
    /// Opens a connection, dropping any previous one.
    fn connect<'a>(&'a mut self, url: &'a str) -> TransportFuture<'a, ()>;

    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    fn send(&mut self, frame: ClientFrame) -> TransportFuture<'_, ()>;

    /// Waits for the next frame. `None` means the server closed the connection.
    fn recv(&mut self) -> TransportFuture<'_, Option<ServerFrame>>;

    fn is_connected(&self) -> bool;
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Push transport over a WebSocket.
#[derive(Default)]
pub struct WebSocketTransport {
    writer: Option<SplitSink<Socket, Message>>,
    reader: Option<SplitStream<Socket>>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn drop_connection(&mut self) {
        self.writer = None;
        self.reader = None;
    }

    async fn write(&mut self, frame: ClientFrame) -> TransportResult<()> {
        let text = frame.to_json().map_err(|e| TransportError::Frame(e.to_string()))?;
        let writer = self.writer.as_mut().ok_or(TransportError::NotConnected)?;
        let sent = writer.send(Message::text(text)).await;
        sent.map_err(|e| {
            self.drop_connection();
            TransportError::Send(e.to_string())
        })
    }

    async fn read(&mut self) -> TransportResult<Option<ServerFrame>> {
        let reader = self.reader.as_mut().ok_or(TransportError::NotConnected)?;
        let next = loop {
            match reader.next().await {
                // Push traffic is text only.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_) | Message::Binary(_))) => {}
                other => break other,
            }
        };
        match next {
            Some(Ok(Message::Text(text))) => ServerFrame::from_json(text.as_str())
                .map(Some)
                .map_err(|e| TransportError::Frame(e.to_string())),
            Some(Err(e)) => {
                self.drop_connection();
                Err(TransportError::Receive(e.to_string()))
            }
            _ => {
                self.drop_connection();
                Ok(None)
            }
        }
    }
}

impl Transport for WebSocketTransport {
    fn connect<'a>(&'a mut self, url: &'a str) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            self.drop_connection();
            let (socket, _response) = tokio_tungstenite::connect_async(url)
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            let (writer, reader) = socket.split();
            self.writer = Some(writer);
            self.reader = Some(reader);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.reader = None;
            match self.writer.take() {
                Some(mut writer) => writer.close().await.map_err(|e| TransportError::Send(e.to_string())),
                None => Ok(()),
            }
        })
    }

    fn send(&mut self, frame: ClientFrame) -> TransportFuture<'_, ()> {
        Box::pin(self.write(frame))
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerFrame>> {
        Box::pin(self.read())
    }

    fn is_connected(&self) -> bool {
        self.writer.is_some() && self.reader.is_some()
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
pub(crate) mod tests;
