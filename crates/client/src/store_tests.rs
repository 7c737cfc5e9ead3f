// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::adapter::{FieldCase, MemoryAdapter, RestAdapter};
use crate::test_helpers::{fields, record_events, test_store};
use serde_json::json;
use yare::parameterized;

fn push(path: &str, mode: PushMode, id: Option<&str>, data: Value) -> PushMessage {
    PushMessage { path: path.to_string(), mode, id: id.map(String::from), data: fields(data) }
}

fn stamped(extra: Value) -> Value {
    let mut data = fields(json!({"_s": 1, "_t": 10, "_u": "server"}));
    data.extend(fields(extra));
    Value::Object(data)
}

#[test]
fn duplicate_registration_is_rejected() {
    let (store, _) = test_store();
    let err = store.register_kind("persons", Arc::new(MemoryAdapter::new())).unwrap_err();
    assert!(matches!(err, Error::KindExists(k) if k == "persons"));
    assert_eq!(store.kinds(), vec!["persons"]);
}

#[test]
fn create_requires_registered_kind() {
    let (store, _) = test_store();
    assert!(matches!(store.create("orders", Fields::new()), Err(Error::UnknownKind(_))));
}

#[test]
fn create_generates_uuid_ids() {
    let (store, _) = test_store();
    let a = store.create("persons", Fields::new()).unwrap();
    let b = store.create("persons", Fields::new()).unwrap();
    assert_ne!(a.id(), b.id());
    assert_eq!(a.id().len(), 36);
    assert_eq!(store.len("persons"), 2);
}

#[test]
fn create_with_taken_id_fails() {
    let (store, _) = test_store();
    store.create_with_id("persons", "1", Fields::new()).unwrap();
    assert!(matches!(
        store.create_with_id("persons", "1", Fields::new()),
        Err(Error::EntityExists { .. })
    ));
}

#[test]
fn get_has_all() {
    let (store, _) = test_store();
    let b = store.create_with_id("persons", "b", Fields::new()).unwrap();
    store.create_with_id("persons", "a", Fields::new()).unwrap();

    assert!(store.has("persons", "b"));
    assert!(!store.has("persons", "c"));
    assert!(!store.has("orders", "b"));
    assert!(store.get("persons", "b").unwrap().ptr_eq(&b));
    let ids: Vec<String> = store.all("persons").iter().map(|e| e.id().to_string()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(store.all("orders").is_empty());
}

#[test]
fn put_replaces_without_announcing() {
    let (store, _) = test_store();
    let a = store.create_with_id("persons", "a", Fields::new()).unwrap();
    let events = record_events(store.context(), "/persons");
    assert!(store.put(a.clone()).unwrap().ptr_eq(&a));
    assert!(events.borrow().is_empty());
}

#[parameterized(
    kind_path = { "/persons" },
    entity_path = { "/persons/7" },
    bare = { "persons" },
)]
fn resolves_paths(path: &str) {
    let (store, _) = test_store();
    assert_eq!(store.resolve_kind(path).as_deref(), Some("persons"));
}

#[test]
fn resolves_aliases_and_rejects_unknown() {
    let (store, _) = test_store();
    store
        .register(KindSpec::new("orders", Arc::new(MemoryAdapter::new())).path("/api/orders"))
        .unwrap();
    assert_eq!(store.resolve_kind("/api/orders").as_deref(), Some("orders"));
    assert_eq!(store.resolve_kind("/invoices/1"), None);
    assert_eq!(store.resolve_kind(""), None);
}

#[test]
fn route_create_inserts_and_announces() {
    let (store, _) = test_store();
    let events = record_events(store.context(), "/persons");
    let outcome = store.route(&push("/persons", PushMode::Create, Some("7"), stamped(json!({"name": "Zed"}))));

    assert_eq!(outcome, RouteOutcome::Created("7".into()));
    let zed = store.get("persons", "7").unwrap();
    assert!(zed.is_persisted());
    assert_eq!(zed.get("name"), Some(json!("Zed")));
    assert_eq!(events.borrow()[0].kind, EventKind::Created);
}

#[parameterized(
    path_tail = { "/persons/7", None, json!({}) },
    data_id = { "/persons", None, json!({"_id": "7"}) },
    numeric_data_id = { "/persons", None, json!({"_id": 7}) },
    explicit = { "/persons/ignored", Some("7"), json!({"_id": "also-ignored"}) },
)]
fn route_resolves_ids(path: &str, id: Option<&str>, data: Value) {
    let (store, _) = test_store();
    store.route(&push(path, PushMode::Create, id, data));
    assert!(store.has("persons", "7"));
}

#[test]
fn route_create_for_known_id_reconciles() {
    let (store, _) = test_store();
    store.create_with_id("persons", "7", fields(json!({"name": "Zed"}))).unwrap();
    let outcome = store.route(&push("/persons", PushMode::Create, Some("7"), stamped(json!({"age": 3}))));
    assert_eq!(outcome, RouteOutcome::Reconciled("7".into()));
    assert_eq!(store.get("persons", "7").unwrap().get("age"), Some(json!(3)));
}

#[test]
fn route_update_and_delete() {
    let (store, _) = test_store();
    store.route(&push("/persons", PushMode::Create, Some("7"), stamped(json!({"name": "Zed"}))));

    let update = json!({"name": "Zoe", "_s": 2, "_t": 20, "_u": "server"});
    assert_eq!(
        store.route(&push("/persons/7", PushMode::Update, None, update)),
        RouteOutcome::Reconciled("7".into())
    );
    let delete = json!({"_s": 3, "_t": 30, "_u": "server"});
    store.route(&push("/persons/7", PushMode::Delete, None, delete));

    let zoe = store.get("persons", "7").unwrap();
    assert_eq!(zoe.get("name"), Some(json!("Zoe")));
    assert!(zoe.is_deleted());
}

#[test]
fn route_echo_of_own_write() {
    let (store, _) = test_store();
    let ann = store.create_with_id("persons", "1", fields(json!({"name": "Ann"}))).unwrap();
    let events = record_events(store.context(), "/persons");
    let outcome = store.route(&push("/persons/1", PushMode::Update, None, Value::Object(ann.snapshot())));
    assert_eq!(outcome, RouteOutcome::Echo("1".into()));
    assert!(events.borrow().is_empty());
}

#[parameterized(
    unknown_kind = { push("/invoices", PushMode::Create, Some("1"), json!({})), DropReason::UnknownKind },
    missing_id = { push("/persons", PushMode::Create, None, json!({"name": "x"})), DropReason::MissingId },
    update_missing = { push("/persons", PushMode::Update, Some("9"), json!({})), DropReason::MissingTarget },
    delete_missing = { push("/persons/9", PushMode::Delete, None, json!({})), DropReason::MissingTarget },
)]
fn route_drops(msg: PushMessage, reason: DropReason) {
    let (store, _) = test_store();
    assert_eq!(store.route(&msg), RouteOutcome::Dropped(reason));
    assert!(!store.has("persons", "9"));
}

#[test]
fn creates_are_admitted_without_interest() {
    let (store, _) = test_store();
    assert!(store.admits("persons", &fields(json!({"age": 1}))));
    assert!(!store.admits("orders", &Fields::new()));
}

#[test]
fn creates_are_gated_by_union_of_interests() {
    let (store, _) = test_store();
    let adults = store.register_interest("persons", Filter::between("age", 18, 200)).unwrap();
    let kids = store.register_interest("persons", Filter::between("age", 0, 12)).unwrap();
    assert_eq!(store.interest_count("persons"), 2);

    assert!(store.admits("persons", &fields(json!({"age": 30}))));
    assert!(store.admits("persons", &fields(json!({"age": 5}))));
    assert!(!store.admits("persons", &fields(json!({"age": 15}))));

    let teen = push("/persons", PushMode::Create, Some("t"), json!({"age": 15}));
    assert_eq!(store.route(&teen), RouteOutcome::Dropped(DropReason::Filtered));

    drop(adults);
    drop(kids);
    assert_eq!(store.interest_count("persons"), 0);
    assert_eq!(store.route(&teen), RouteOutcome::Created("t".into()));
}

#[test]
fn server_filter_always_applies() {
    let (store, _) = test_store();
    store
        .register(
            KindSpec::new("orders", Arc::new(MemoryAdapter::new()))
                .server_filter(Filter::eq("status", "open")),
        )
        .unwrap();
    let closed = push("/orders", PushMode::Create, Some("1"), json!({"status": "closed"}));
    let open = push("/orders", PushMode::Create, Some("2"), json!({"status": "open"}));
    assert_eq!(store.route(&closed), RouteOutcome::Dropped(DropReason::Filtered));
    assert_eq!(store.route(&open), RouteOutcome::Created("2".into()));
}

#[test]
fn interest_on_unknown_kind_fails() {
    let (store, _) = test_store();
    assert!(matches!(
        store.register_interest("orders", Filter::all()),
        Err(Error::UnknownKind(_))
    ));
}

#[test]
fn materialize_inserts_or_reconciles() {
    let (store, _) = test_store();
    let first = store.materialize("persons", &fields(stamped(json!({"_id": "1", "n": 1})))).unwrap();
    assert!(first.is_persisted());

    let update = fields(json!({"_id": "1", "n": 2, "_s": 2, "_t": 20, "_u": "server"}));
    let second = store.materialize("persons", &update).unwrap();
    assert!(second.ptr_eq(&first));
    assert_eq!(first.get("n"), Some(json!(2)));

    assert!(matches!(
        store.materialize("persons", &fields(json!({"n": 3}))),
        Err(Error::MissingId(_))
    ));
}

#[test]
fn route_decodes_payload_with_kind_adapter() {
    let (store, _) = test_store();
    let rest = RestAdapter::new("http://localhost:8000").with_codec(FieldCase::SnakeCase);
    store.register_kind("people", Arc::new(rest)).unwrap();

    let create = push("/people", PushMode::Create, Some("1"), stamped(json!({"first_name": "Ann"})));
    assert_eq!(store.route(&create), RouteOutcome::Created("1".into()));
    let update = push(
        "/people/1",
        PushMode::Update,
        None,
        json!({"first_name": "Bo", "_s": 2, "_t": 20, "_u": "server"}),
    );
    assert_eq!(store.route(&update), RouteOutcome::Reconciled("1".into()));

    let person = store.get("people", "1").unwrap();
    assert_eq!(person.get("firstName"), Some(json!("Bo")));
    assert_eq!(person.get("first_name"), None);
}

#[test]
fn interest_dropped_while_store_is_busy_is_withdrawn_on_tick() {
    let (store, _) = test_store();
    let interest = store.register_interest("persons", Filter::eq("status", "open")).unwrap();

    let busy = store.0.state.borrow();
    drop(interest);
    drop(busy);
    assert_eq!(store.interest_count("persons"), 1);

    store.context().tick();
    assert_eq!(store.interest_count("persons"), 0);
}
