// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::channel::transport::tests::{MockTransport, Session};
use mirra_core::{Fields, PushMode};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn gaps_ms(transport: &MockTransport) -> Vec<u128> {
    transport
        .attempts()
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).as_millis())
        .collect()
}

fn collecting_channel(transport: MockTransport) -> (ResilientChannel<MockTransport>, Arc<Mutex<Vec<PushMessage>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let channel = ResilientChannel::new("ws://test/ws", transport, move |msg| sink.lock().unwrap().push(msg));
    (channel, received)
}

#[tokio::test(start_paused = true)]
async fn failed_connects_back_off_exponentially() {
    let transport = MockTransport::new();
    let (channel, _) = collecting_channel(transport.clone());
    let handle = channel.spawn();

    tokio::time::sleep(Duration::from_millis(62_000)).await;
    handle.shutdown();

    assert_eq!(gaps_ms(&transport), vec![1000, 2000, 4000, 8000, 16000, 30000]);
}

#[tokio::test(start_paused = true)]
async fn backoff_is_capped_at_thirty_seconds() {
    let transport = MockTransport::new();
    let (channel, _) = collecting_channel(transport.clone());
    let handle = channel.spawn();

    tokio::time::sleep(Duration::from_millis(152_000)).await;
    handle.shutdown();

    let gaps = gaps_ms(&transport);
    assert_eq!(&gaps[5..], &[30000, 30000, 30000, 30000]);
}

#[tokio::test(start_paused = true)]
async fn open_connection_resets_backoff() {
    let transport = MockTransport::new();
    transport.script([Session::Fail, Session::Fail, Session::Open(vec![])]);
    let (channel, _) = collecting_channel(transport.clone());
    let handle = channel.spawn();

    tokio::time::sleep(Duration::from_millis(6_500)).await;
    handle.shutdown();

    assert_eq!(gaps_ms(&transport), vec![1000, 2000, 1000, 2000]);
}

#[tokio::test(start_paused = true)]
async fn ping_is_answered_and_pushes_are_forwarded() {
    let first = PushMessage::new("/persons", PushMode::Create, "1", Fields::new());
    let second = PushMessage::new("/persons/1", PushMode::Update, "1", Fields::new());
    let transport = MockTransport::new();
    transport.script([Session::Open(vec![
        ServerFrame::Push(first.clone()),
        ServerFrame::Ping,
        ServerFrame::Other(json!({"type": "hello"})),
        ServerFrame::Push(second.clone()),
    ])]);
    let (channel, received) = collecting_channel(transport.clone());
    let handle = channel.spawn();

    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.shutdown();

    assert_eq!(*received.lock().unwrap(), vec![first, second]);
    assert_eq!(transport.sent(), vec![ClientFrame::Pong]);
}

#[tokio::test(start_paused = true)]
async fn messages_from_successive_connections_keep_arrival_order() {
    let a = PushMessage::new("/persons", PushMode::Create, "a", Fields::new());
    let b = PushMessage::new("/persons", PushMode::Create, "b", Fields::new());
    let transport = MockTransport::new();
    transport.script([
        Session::Open(vec![ServerFrame::Push(a.clone())]),
        Session::Open(vec![ServerFrame::Push(b.clone()), ServerFrame::Push(b.clone())]),
    ]);
    let (channel, received) = collecting_channel(transport.clone());
    let handle = channel.spawn();

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    handle.shutdown();

    assert_eq!(*received.lock().unwrap(), vec![a, b.clone(), b]);
}

#[tokio::test]
async fn dropping_the_handle_stops_the_channel() {
    let transport = MockTransport::new();
    let (channel, _) = collecting_channel(transport.clone());
    let handle = channel.spawn();
    assert!(!handle.is_finished());
    drop(handle);
    tokio::task::yield_now().await;
    let attempts = transport.attempts().len();
    tokio::task::yield_now().await;
    assert_eq!(transport.attempts().len(), attempts);
}
