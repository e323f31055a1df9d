mod helpers;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use serde_json::json;
use tempfile::TempDir;

use dirsync_core::EntityId;
use dirsync_reconcile::state_store;
use helpers::StubServer;

const ALICE: &str = "username: alice\nemail: alice@example.com\nstate: STAGED\n";

fn dirsync_cmd(home: &Path, server: &StubServer) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dirsync"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env("DIRSYNC_BASE_URL", &server.base_url)
        .env("DIRSYNC_API_KEY", "test-key")
        .env_remove("DIRSYNC_ORG_ID")
        .env_remove("RUST_LOG");
    cmd
}

fn write_doc(dir: &Path) -> PathBuf {
    let path = dir.join("alice.yaml");
    fs::write(&path, ALICE).expect("write document");
    path
}

#[test]
fn failed_secondary_write_on_create_keeps_the_entity_id() {
    let home = TempDir::new().expect("home");
    let docs = TempDir::new().expect("docs");
    let doc = write_doc(docs.path());
    let created = json!({
        "_id": "5f1a",
        "username": "alice",
        "email": "alice@example.com",
        "state": "STAGED",
    });

    let server = StubServer::start(vec![
        (200, created.clone()),
        (500, json!({ "message": "internal error" })),
        (500, json!({ "message": "internal error" })),
    ]);
    dirsync_cmd(home.path(), &server)
        .arg("apply")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(contains("re-run apply"));
    assert_eq!(
        server.requests(),
        vec![
            "POST /systemusers",
            "PUT /systemusers/5f1a",
            "PUT /systemusers/5f1a",
        ]
    );

    let record = state_store::load_at(home.path(), "alice")
        .expect("load state")
        .expect("state recorded after partial create");
    assert_eq!(record.id, EntityId::from("5f1a"));
    assert!(record.secondary_pending);

    let offline = StubServer::start(Vec::new());
    dirsync_cmd(home.path(), &offline)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("STALE"))
        .stdout(contains("not confirmed"));

    // The next apply finishes the existing entity instead of creating another.
    let server = StubServer::start(vec![
        (200, created.clone()),
        (200, created.clone()),
        (200, json!({})),
        (200, created),
    ]);
    dirsync_cmd(home.path(), &server)
        .arg("apply")
        .arg(&doc)
        .assert()
        .success()
        .stdout(contains("applied"));
    assert_eq!(
        server.requests(),
        vec![
            "GET /systemusers/5f1a",
            "PUT /systemusers/5f1a",
            "PUT /systemusers/5f1a",
            "GET /systemusers/5f1a",
        ]
    );

    let record = state_store::load_at(home.path(), "alice")
        .expect("load state")
        .expect("state recorded");
    assert!(!record.secondary_pending);
}

#[test]
fn secondary_write_recovered_by_the_retry() {
    let home = TempDir::new().expect("home");
    let docs = TempDir::new().expect("docs");
    let doc = write_doc(docs.path());
    let created = json!({ "_id": "5f1a", "username": "alice", "state": "STAGED" });

    let server = StubServer::start(vec![
        (200, created.clone()),
        (502, json!({ "message": "bad gateway" })),
        (200, json!({})),
        (200, created),
    ]);
    dirsync_cmd(home.path(), &server)
        .arg("apply")
        .arg(&doc)
        .assert()
        .success();
    assert_eq!(server.requests().len(), 4);

    let record = state_store::load_at(home.path(), "alice")
        .expect("load state")
        .expect("state recorded");
    assert_eq!(record.id, EntityId::from("5f1a"));
    assert!(!record.secondary_pending);
}
