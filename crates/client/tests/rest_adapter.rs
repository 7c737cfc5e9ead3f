// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! REST adapter against a mock HTTP server.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use mirra::adapter::{AdapterError, FieldCase, RestAdapter, StorageAdapter};
use mirra::{Context, LiveList, ObjectStore, Settings};
use mirra_core::{Fields, Filter, OriginId, SortSpec};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

#[tokio::test]
async fn fetch_all_sends_filter_and_sort() {
    let server = MockServer::start().await;
    let filter = Filter::between("age", 18, 65);
    let sort = SortSpec::new().asc("name");

    Mock::given(method("GET"))
        .and(path("/persons"))
        .and(query_param("filter", filter.to_json().to_string()))
        .and(query_param("sort", sort.to_json().to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "1", "first_name": "Ann", "age": 34},
            {"_id": "2", "first_name": "Bob", "age": 40},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = RestAdapter::new(server.uri()).with_codec(FieldCase::SnakeCase);
    let records = adapter.fetch_all("persons", &filter, &sort).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["firstName"], "Ann");
    assert_eq!(records[1]["_id"], "2");
}

#[tokio::test]
async fn fetch_all_without_filter_sends_no_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/persons"))
        .and(query_param_is_missing("filter"))
        .and(query_param_is_missing("sort"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = RestAdapter::new(format!("{}/", server.uri()));
    let records = adapter.fetch_all("persons", &Filter::all(), &SortSpec::new()).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn fetch_all_rejects_non_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/persons"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"oops": true})))
        .mount(&server)
        .await;

    let adapter = RestAdapter::new(server.uri());
    let err = adapter.fetch_all("persons", &Filter::all(), &SortSpec::new()).await.unwrap_err();
    assert!(matches!(err, AdapterError::Decode(_)));
}

#[tokio::test]
async fn read_one_maps_404_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/persons/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": "1", "name": "Ann"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/persons/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = RestAdapter::new(server.uri());
    let found = adapter.read_one("persons", "1").await.unwrap().unwrap();
    assert_eq!(found["name"], "Ann");
    assert!(adapter.read_one("persons", "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn writes_use_the_right_verbs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/persons"))
        .and(body_partial_json(json!({"_id": "7", "first_name": "Ann"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/persons/7"))
        .and(body_partial_json(json!({"_id": "7", "first_name": "Anne"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/persons/7"))
        .and(body_partial_json(json!({"_id": "7", "_x": true})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = RestAdapter::new(server.uri()).with_codec(FieldCase::SnakeCase);
    adapter.create_one("persons", "7", &fields(json!({"firstName": "Ann"}))).await.unwrap();
    adapter.update_one("persons", "7", &fields(json!({"firstName": "Anne"}))).await.unwrap();
    adapter.delete_one("persons", "7", &fields(json!({"firstName": "Anne", "_x": true}))).await.unwrap();
}

#[tokio::test]
async fn failure_status_carries_text() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/persons/7"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let adapter = RestAdapter::new(server.uri());
    let err = adapter.update_one("persons", "7", &Fields::new()).await.unwrap_err();
    match err {
        AdapterError::Status { status, text } => {
            assert_eq!(status, 500);
            assert_eq!(text, "Internal Server Error: boom");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn entity_save_and_delete_go_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/persons"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "1", "name": "Ann", "_s": 1, "_t": 1, "_u": "server"},
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/persons"))
        .and(body_partial_json(json!({"_id": "2", "name": "Bob", "_u": "it-origin"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/persons/1"))
        .and(body_partial_json(json!({"_id": "1", "name": "Anna"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = ObjectStore::new(Context::new(OriginId::from("it-origin"), Settings::default()));
    store.register_kind("persons", Arc::new(RestAdapter::new(server.uri()))).unwrap();
    let list = LiveList::open(&store, "persons", Filter::all(), SortSpec::new().asc("name")).await.unwrap();
    assert_eq!(list.ids(), vec!["1"]);

    let bob = store.create_with_id("persons", "2", fields(json!({"name": "Bob"}))).unwrap();
    bob.save().await.unwrap();
    assert!(bob.is_persisted());

    let ann = store.get("persons", "1").unwrap();
    ann.set("name", "Anna").unwrap();
    ann.save().await.unwrap();
    assert!(!ann.is_dirty());

    store.context().tick();
    assert_eq!(list.ids(), vec!["1", "2"]);
}
