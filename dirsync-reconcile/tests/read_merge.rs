mod helpers;

use std::collections::BTreeMap;

use rstest::rstest;
use serde_json::{json, Value};

use dirsync_core::{DesiredState, FieldValue, RemoteEntity};
use dirsync_reconcile::merge;
use helpers::clock;

fn remote(body: Value) -> RemoteEntity {
    serde_json::from_value(body).expect("remote entity")
}

fn record(pairs: &[(&str, FieldValue)]) -> FieldValue {
    let map: BTreeMap<String, FieldValue> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect();
    FieldValue::Record(map)
}

#[test]
fn echo_unstable_flag_keeps_local_value() {
    let local = DesiredState::new().with("username", "alice").with("sudo", true);
    let server = remote(json!({ "_id": "5f1a", "username": "alice", "sudo": false }));

    let merged = merge(&local, &server, &clock()).expect("merge");
    assert_eq!(merged.fields.get("sudo"), Some(&FieldValue::Bool(true)));
}

#[test]
fn unmanaged_flag_is_adopted_only_when_on() {
    let local = DesiredState::new().with("username", "alice");
    let server = remote(json!({
        "_id": "5f1a",
        "username": "alice",
        "password_never_expires": true,
        "sudo": false,
    }));

    let merged = merge(&local, &server, &clock()).expect("merge");
    assert_eq!(
        merged.fields.get("password_never_expires"),
        Some(&FieldValue::Bool(true))
    );
    assert!(!merged.fields.is_present("sudo"));
}

#[test]
fn deprecated_spelling_survives_the_merge() {
    let local = DesiredState::new()
        .with("username", "alice")
        .with("enable_multifactor", true);
    let server = remote(json!({
        "_id": "5f1a",
        "username": "alice",
        "enable_user_portal_multifactor": false,
    }));

    let merged = merge(&local, &server, &clock()).expect("merge");
    assert_eq!(
        merged.fields.get("enable_multifactor"),
        Some(&FieldValue::Bool(true))
    );
    assert!(!merged.fields.is_present("enable_user_portal_multifactor"));
}

#[test]
fn server_profile_value_wins_over_local() {
    let local = DesiredState::new()
        .with("username", "alice")
        .with("job_title", "Engineer")
        .with("department", "R&D");
    let server = remote(json!({
        "_id": "5f1a",
        "username": "alice",
        "jobTitle": "Staff Engineer",
    }));

    let merged = merge(&local, &server, &clock()).expect("merge");
    assert_eq!(
        merged.fields.get("job_title"),
        Some(&FieldValue::from("Staff Engineer"))
    );
    // Not echoed: stays as authored.
    assert_eq!(merged.fields.get("department"), Some(&FieldValue::from("R&D")));
}

#[test]
fn pinned_recovery_email_ignores_server_value() {
    let local = DesiredState::new()
        .with("username", "alice")
        .with("recovery_email", "alice.recovery@example.com");
    let server = remote(json!({
        "_id": "5f1a",
        "username": "alice",
        "recoveryEmail": { "address": "someone.else@example.com", "verified": false },
    }));

    let merged = merge(&local, &server, &clock()).expect("merge");
    assert_eq!(
        merged.fields.get("recovery_email"),
        Some(&FieldValue::from("alice.recovery@example.com"))
    );

    let adopted = merge(&DesiredState::new().with("username", "alice"), &server, &clock())
        .expect("merge");
    assert_eq!(
        adopted.fields.get("recovery_email"),
        Some(&FieldValue::from("someone.else@example.com"))
    );
}

#[test]
fn scim_password_authority_reads_back_from_marker() {
    let server = remote(json!({
        "_id": "5f1a",
        "username": "alice",
        "passwordAuthority": null,
        "restrictedFields": [{ "field": "password", "type": "scim", "id": null }],
        "delegatedAuthority": { "id": "5f00ad", "name": "Corp AD" },
    }));

    let merged = merge(&DesiredState::new().with("username", "alice"), &server, &clock())
        .expect("merge");
    assert_eq!(
        merged.fields.get("password_authority"),
        Some(&FieldValue::from("Scim"))
    );
    assert_eq!(
        merged.fields.get("delegated_authority"),
        Some(&FieldValue::from("5f00ad"))
    );
}

#[rstest]
#[case(json!("5f00aa"))]
#[case(json!({ "id": "5f00aa", "name": "Bob" }))]
fn manager_shape_does_not_matter(#[case] manager: Value) {
    let local = DesiredState::new().with("username", "alice").with("manager", "5f00aa");
    let server = remote(json!({ "_id": "5f1a", "username": "alice", "manager": manager }));

    let merged = merge(&local, &server, &clock()).expect("merge");
    assert_eq!(merged.fields.get("manager"), Some(&FieldValue::from("5f00aa")));
}

#[test]
fn phone_keeps_local_formatting_when_digits_match() {
    let local = DesiredState::new().with("username", "alice").with(
        "phone_numbers",
        vec![record(&[
            ("type", FieldValue::from("work")),
            ("number", FieldValue::from("+1 (555) 010-2000")),
        ])],
    );
    let server = remote(json!({
        "_id": "5f1a",
        "username": "alice",
        "phoneNumbers": [
            { "type": "work", "number": "15550102000" },
            { "type": "mobile", "number": "15550109999" },
        ],
    }));

    let merged = merge(&local, &server, &clock()).expect("merge");
    let phones = merged
        .fields
        .get("phone_numbers")
        .and_then(FieldValue::as_list)
        .expect("phones");
    let numbers: Vec<_> = phones
        .iter()
        .filter_map(FieldValue::as_record)
        .filter_map(|r| r.get("number").and_then(FieldValue::as_str))
        .collect();
    assert_eq!(numbers, vec!["+1 (555) 010-2000", "15550109999"]);
}

#[test]
fn attribute_names_are_mapped_back_to_authored_form() {
    let local = DesiredState::new().with("username", "alice").with(
        "attributes",
        vec![record(&[
            ("name", FieldValue::from("badge-id")),
            ("value", FieldValue::from("B-17")),
        ])],
    );
    let server = remote(json!({
        "_id": "5f1a",
        "username": "alice",
        "attributes": [
            { "name": "badgeid", "value": "B-17" },
            { "name": "costCenter", "value": "42" },
        ],
    }));

    let merged = merge(&local, &server, &clock()).expect("merge");
    let names: Vec<_> = merged
        .fields
        .get("attributes")
        .and_then(FieldValue::as_list)
        .expect("attributes")
        .iter()
        .filter_map(FieldValue::as_record)
        .filter_map(|r| r.get("name").and_then(FieldValue::as_str))
        .collect();
    assert_eq!(names, vec!["badge-id", "costCenter"]);
}

#[test]
fn inactive_mfa_block_is_dropped() {
    let local = DesiredState::new().with("username", "alice").with(
        "mfa",
        record(&[("exclusion", FieldValue::Bool(false))]),
    );
    let server = remote(json!({
        "_id": "5f1a",
        "username": "alice",
        "mfa": { "exclusion": false, "configured": false },
    }));

    let merged = merge(&local, &server, &clock()).expect("merge");
    assert!(!merged.fields.is_present("mfa"));
}

#[test]
fn expired_exclusion_falls_back_to_pinned_days() {
    let local = DesiredState::new()
        .with("username", "alice")
        .with("state", "ACTIVATED")
        .with(
            "mfa",
            record(&[
                ("exclusion", FieldValue::Bool(true)),
                ("exclusionDays", FieldValue::Int(7)),
            ]),
        );
    let server = remote(json!({
        "_id": "5f1a",
        "username": "alice",
        "state": "ACTIVATED",
        "mfa": { "exclusion": true, "exclusionUntil": "2026-10-01T00:00:00Z" },
    }));

    let merged = merge(&local, &server, &clock()).expect("merge");
    assert_eq!(merged.fields.get("mfa"), local.get("mfa"));
}

#[test]
fn merging_twice_is_stable() {
    let local = DesiredState::new()
        .with("username", "alice")
        .with("manager_id", "5f00aa")
        .with("sudo", true);
    let server = remote(json!({
        "_id": "5f1a",
        "username": "alice",
        "state": "SUSPENDED",
        "firstname": "Alice",
        "manager": { "id": "5f00aa" },
        "unix_uid": 5001,
        "sudo": false,
        "ldap_binding_user": true,
        "phoneNumbers": [{ "type": "work", "number": "15550102000" }],
        "sshKeys": [{ "name": "laptop", "public_key": "ssh-ed25519 AAAA", "_id": "k1" }],
        "mfa": { "exclusion": false, "configured": true },
    }));

    let once = merge(&local, &server, &clock()).expect("first merge");
    let twice = merge(&once.fields, &server, &clock()).expect("second merge");
    assert_eq!(once, twice);
    assert_eq!(once.fields.get("state"), Some(&FieldValue::from("SUSPENDED")));
    assert_eq!(once.fields.get("unix_uid"), Some(&FieldValue::Int(5001)));
}
