//! Staleness of applied documents.
//!
//! Signal precedence:
//! 1. `NeverApplied` (no state record)
//! 2. `Stale` (secondary write unconfirmed, document missing, or its digest
//!    differs from the applied one)
//! 3. `Current`

use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{io_err, ReconcileError};
use crate::state_store::{self, StateRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StalenessSignal {
    NeverApplied,
    Current,
    Stale { reason: String },
}

/// Compare `document` bytes against the digest recorded for `name`.
pub fn check(home: &Path, name: &str, document: &[u8]) -> Result<StalenessSignal, ReconcileError> {
    let Some(record) = state_store::load_at(home, name)? else {
        return Ok(StalenessSignal::NeverApplied);
    };
    Ok(compare(&record, document))
}

/// Like [`check`], reading the document from the path the record remembers.
pub fn check_recorded(home: &Path, name: &str) -> Result<StalenessSignal, ReconcileError> {
    let Some(record) = state_store::load_at(home, name)? else {
        return Ok(StalenessSignal::NeverApplied);
    };
    if record.secondary_pending {
        return Ok(pending(&record));
    }
    let path = &record.document_path;
    match std::fs::read(path) {
        Ok(bytes) => Ok(compare(&record, &bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(StalenessSignal::Stale {
            reason: format!("document missing at {}", path.display()),
        }),
        Err(err) => Err(io_err(path, err)),
    }
}

fn compare(record: &StateRecord, document: &[u8]) -> StalenessSignal {
    if record.secondary_pending {
        return pending(record);
    }
    if state_store::digest(document) == record.document_digest {
        StalenessSignal::Current
    } else {
        StalenessSignal::Stale {
            reason: format!(
                "document changed since apply {} ago",
                format_datetime_age(record.applied_at)
            ),
        }
    }
}

fn pending(record: &StateRecord) -> StalenessSignal {
    StalenessSignal::Stale {
        reason: format!("secondary fields of {} not confirmed; re-run apply", record.id),
    }
}

/// Format age from a chrono timestamp (`applied_at`).
pub fn format_datetime_age(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    let age = now.signed_duration_since(timestamp).num_seconds().max(0) as u64;
    format_seconds(age)
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use chrono::Duration;
    use dirsync_core::{DesiredState, EntityId, State};
    use tempfile::TempDir;

    use crate::reconcile::ReconciledState;

    const DOC: &str = "username: alice\nstate: ACTIVATED\n";

    fn apply(home: &Path, doc_path: &Path, contents: &str) {
        fs::write(doc_path, contents).expect("write doc");
        let reconciled = ReconciledState {
            id: EntityId::from("5f1a"),
            state: State::Activated,
            fields: DesiredState::new().with("username", "alice"),
        };
        let record = StateRecord::new(
            &reconciled,
            doc_path,
            contents.as_bytes(),
            Utc::now() - Duration::hours(3),
        );
        state_store::save_at(home, "alice", &record).expect("save");
    }

    #[test]
    fn never_applied_without_record() {
        let home = TempDir::new().expect("home");
        let signal = check(home.path(), "alice", DOC.as_bytes()).expect("check");
        assert_eq!(signal, StalenessSignal::NeverApplied);
    }

    #[test]
    fn current_when_digest_matches() {
        let home = TempDir::new().expect("home");
        let doc = home.path().join("alice.yaml");
        apply(home.path(), &doc, DOC);
        assert_eq!(
            check(home.path(), "alice", DOC.as_bytes()).expect("check"),
            StalenessSignal::Current
        );
        assert_eq!(
            check_recorded(home.path(), "alice").expect("check"),
            StalenessSignal::Current
        );
    }

    #[test]
    fn stale_when_document_edited() {
        let home = TempDir::new().expect("home");
        let doc = home.path().join("alice.yaml");
        apply(home.path(), &doc, DOC);
        fs::write(&doc, "username: alice\nstate: SUSPENDED\n").expect("edit");

        match check_recorded(home.path(), "alice").expect("check") {
            StalenessSignal::Stale { reason } => {
                assert!(reason.contains("changed"));
                assert!(reason.contains("3h"));
            }
            other => panic!("expected stale, got {other:?}"),
        }
    }

    #[test]
    fn stale_when_document_missing() {
        let home = TempDir::new().expect("home");
        let doc = home.path().join("alice.yaml");
        apply(home.path(), &doc, DOC);
        fs::remove_file(&doc).expect("remove");

        match check_recorded(home.path(), "alice").expect("check") {
            StalenessSignal::Stale { reason } => assert!(reason.contains("missing")),
            other => panic!("expected stale, got {other:?}"),
        }
    }

    #[test]
    fn unconfirmed_secondary_write_is_stale() {
        let home = TempDir::new().expect("home");
        let doc = home.path().join("alice.yaml");
        fs::write(&doc, DOC).expect("write doc");
        let record = StateRecord::pending(
            &EntityId::from("5f1a"),
            State::Staged,
            &DesiredState::new().with("username", "alice"),
            &doc,
            DOC.as_bytes(),
            Utc::now(),
        );
        state_store::save_at(home.path(), "alice", &record).expect("save");

        for signal in [
            check(home.path(), "alice", DOC.as_bytes()).expect("check"),
            check_recorded(home.path(), "alice").expect("check"),
        ] {
            match signal {
                StalenessSignal::Stale { reason } => assert!(reason.contains("not confirmed")),
                other => panic!("expected stale, got {other:?}"),
            }
        }
    }

    #[test]
    fn crlf_edit_is_not_a_change() {
        let home = TempDir::new().expect("home");
        let doc = home.path().join("alice.yaml");
        apply(home.path(), &doc, DOC);
        let crlf = DOC.replace('\n', "\r\n");
        assert_eq!(
            check(home.path(), "alice", crlf.as_bytes()).expect("check"),
            StalenessSignal::Current
        );
    }

    #[test]
    fn datetime_age_is_compact() {
        assert_eq!(format_datetime_age(Utc::now()), "0s");
        assert_eq!(format_datetime_age(Utc::now() - Duration::minutes(5)), "5m");
        assert_eq!(format_datetime_age(Utc::now() - Duration::days(2)), "2d");
    }
}
