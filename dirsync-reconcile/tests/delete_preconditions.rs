mod helpers;

use std::cell::RefCell;
use std::time::Duration;

use serde_json::json;

use dirsync_core::EntityId;
use dirsync_reconcile::delete::{delete_with_pause, SETTLING_INTERVAL};
use dirsync_reconcile::{DeleteOutcome, Method, ReconcileError, TransportError};
use helpers::{conflict, not_found, ScriptedTransport};

fn id() -> EntityId {
    EntityId::from("5f1a")
}

#[test]
fn plain_entity_is_deleted_without_waiting() {
    helpers::init_logging();
    let transport = ScriptedTransport::new()
        .respond(json!({ "_id": "5f1a", "username": "alice" }))
        .respond(json!({}));
    let waits = RefCell::new(Vec::new());

    let outcome =
        delete_with_pause(&transport, &id(), &|d| waits.borrow_mut().push(d)).expect("delete");

    assert_eq!(outcome, DeleteOutcome::Deleted { disabled: vec![] });
    assert!(waits.borrow().is_empty());
    assert_eq!(
        transport.routes(),
        vec![
            (Method::Get, "/systemusers/5f1a".to_owned()),
            (Method::Delete, "/systemusers/5f1a".to_owned()),
        ]
    );
}

#[test]
fn file_sharing_flag_is_cleared_first() {
    let transport = ScriptedTransport::new()
        .respond(json!({ "_id": "5f1a", "username": "alice", "samba_service_user": true }))
        .respond(json!({}))
        .respond(json!({}));
    let waits = RefCell::new(Vec::new());

    let outcome =
        delete_with_pause(&transport, &id(), &|d| waits.borrow_mut().push(d)).expect("delete");

    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            disabled: vec!["samba_service_user"]
        }
    );
    assert_eq!(*waits.borrow(), vec![SETTLING_INTERVAL]);
    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].method, Method::Put);
    assert_eq!(calls[1].body, Some(json!({ "samba_service_user": false })));
    assert_eq!(calls[2].method, Method::Delete);
}

#[test]
fn refused_delete_disables_the_broader_set_and_retries_once() {
    let transport = ScriptedTransport::new()
        .respond(json!({ "_id": "5f1a", "username": "alice" }))
        .fail(conflict())
        .respond(json!({}))
        .respond(json!({}));
    let waits = RefCell::new(Vec::<Duration>::new());

    let outcome =
        delete_with_pause(&transport, &id(), &|d| waits.borrow_mut().push(d)).expect("delete");

    let DeleteOutcome::Deleted { disabled } = outcome else {
        panic!("expected deleted");
    };
    assert_eq!(
        disabled,
        vec!["samba_service_user", "ldap_binding_user", "enable_managed_uid"]
    );
    assert_eq!(waits.borrow().len(), 1);
    let calls = transport.calls();
    assert_eq!(
        calls[2].body,
        Some(json!({
            "enable_managed_uid": false,
            "ldap_binding_user": false,
            "samba_service_user": false,
        }))
    );
    assert_eq!(calls[3].method, Method::Delete);
}

#[test]
fn second_refusal_is_terminal() {
    let transport = ScriptedTransport::new()
        .respond(json!({ "_id": "5f1a", "username": "alice" }))
        .fail(conflict())
        .respond(json!({}))
        .fail(conflict());

    let err = delete_with_pause(&transport, &id(), &|_| {}).expect_err("blocked");

    assert!(matches!(err, ReconcileError::DeleteBlocked { .. }));
    assert_eq!(transport.calls().len(), 4);
    assert_eq!(transport.remaining(), 0);
}

#[test]
fn missing_entity_counts_as_deleted() {
    let transport = ScriptedTransport::new().fail(not_found());
    let outcome = delete_with_pause(&transport, &id(), &|_| {}).expect("delete");
    assert_eq!(outcome, DeleteOutcome::AlreadyAbsent);

    let raced = ScriptedTransport::new()
        .respond(json!({ "_id": "5f1a", "username": "alice" }))
        .fail(not_found());
    let outcome = delete_with_pause(&raced, &id(), &|_| {}).expect("delete");
    assert_eq!(outcome, DeleteOutcome::AlreadyAbsent);
}

#[test]
fn unrelated_refusal_is_not_retried() {
    let transport = ScriptedTransport::new()
        .respond(json!({ "_id": "5f1a", "username": "alice" }))
        .fail(TransportError::Forbidden {
            body: "insufficient permissions".to_owned(),
        });

    let err = delete_with_pause(&transport, &id(), &|_| {}).expect_err("forbidden");

    assert!(matches!(err, ReconcileError::Transport { .. }));
    assert_eq!(transport.calls().len(), 2);
}
