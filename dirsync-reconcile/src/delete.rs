//! Deletion preconditioner.
//!
//! Some dependent-subsystem flags make the remote refuse a delete while they
//! are on. The cycle is:
//!
//! 1. If the entity has the file-sharing flag set, disable it and wait.
//! 2. Delete. A not-found answer means it is already gone.
//! 3. If the delete is refused for a dependent service, disable every known
//!    blocking flag, wait, and delete once more. A second refusal is
//!    terminal.
//!
//! The wait is a blind settling interval, not a poll.

use std::collections::BTreeMap;
use std::time::Duration;

use dirsync_compiler::catalog::{LDAP_BINDING, MANAGED_UID, SAMBA_SERVICE_USER};
use dirsync_core::EntityId;

use crate::error::{transport_err, Operation, ReconcileError, TransportError};
use crate::executor::{self, put_json, PutError};
use crate::transport::{entity_path, Method, Transport};

/// Wait after a disabling update before retrying the delete.
pub const SETTLING_INTERVAL: Duration = Duration::from_secs(2);

/// Wire flag that blocks deletion on its own.
pub const PRIMARY_BLOCKER: &str = "samba_service_user";

/// The broader set disabled after a refused delete.
pub fn blocking_flags() -> [&'static str; 3] {
    [
        SAMBA_SERVICE_USER.current(),
        LDAP_BINDING.current(),
        MANAGED_UID.current(),
    ]
}

const DEPENDENT_SERVICE_MARKERS: &[&str] = &["samba", "dependent", "ldap", "managed uid"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The delete call succeeded, after disabling `disabled` first.
    Deleted { disabled: Vec<&'static str> },
    /// The entity was already gone.
    AlreadyAbsent,
}

/// Delete `id`, clearing blocking flags first if needed.
pub fn delete<T: Transport + ?Sized>(
    transport: &T,
    id: &EntityId,
) -> Result<DeleteOutcome, ReconcileError> {
    delete_with_pause(transport, id, &std::thread::sleep)
}

/// [`delete`] with an injectable wait.
pub fn delete_with_pause<T: Transport + ?Sized>(
    transport: &T,
    id: &EntityId,
    pause: &dyn Fn(Duration),
) -> Result<DeleteOutcome, ReconcileError> {
    let Some(entity) = executor::read(transport, id)? else {
        return Ok(DeleteOutcome::AlreadyAbsent);
    };

    let mut disabled = Vec::new();
    if entity.bool_field(PRIMARY_BLOCKER) == Some(true) {
        tracing::info!("{id}: disabling {PRIMARY_BLOCKER} before delete");
        if !disable(transport, id, &[PRIMARY_BLOCKER])? {
            return Ok(DeleteOutcome::AlreadyAbsent);
        }
        disabled.push(PRIMARY_BLOCKER);
        settle(id, pause);
    }

    let refusal = match send_delete(transport, id) {
        Ok(outcome) => return Ok(with_disabled(outcome, disabled)),
        Err(err) if is_dependent_service(&err) => err,
        Err(err) => return Err(transport_err(Operation::Delete, id, err)),
    };

    let broader = blocking_flags();
    tracing::warn!(
        "{id}: delete refused ({refusal}); disabling {} and retrying once",
        broader.join(", ")
    );
    if !disable(transport, id, &broader)? {
        return Ok(DeleteOutcome::AlreadyAbsent);
    }
    for flag in broader {
        if !disabled.contains(&flag) {
            disabled.push(flag);
        }
    }
    settle(id, pause);

    match send_delete(transport, id) {
        Ok(outcome) => Ok(with_disabled(outcome, disabled)),
        Err(source) => Err(ReconcileError::DeleteBlocked {
            id: id.clone(),
            source,
        }),
    }
}

fn send_delete<T: Transport + ?Sized>(
    transport: &T,
    id: &EntityId,
) -> Result<DeleteOutcome, TransportError> {
    tracing::info!("delete {id}");
    match transport.request(Method::Delete, &entity_path(id), None) {
        Ok(_) => Ok(DeleteOutcome::Deleted {
            disabled: Vec::new(),
        }),
        Err(err) if err.is_not_found() => {
            tracing::info!("{id} already deleted");
            Ok(DeleteOutcome::AlreadyAbsent)
        }
        Err(err) => Err(err),
    }
}

fn with_disabled(outcome: DeleteOutcome, disabled: Vec<&'static str>) -> DeleteOutcome {
    match outcome {
        DeleteOutcome::Deleted { .. } => DeleteOutcome::Deleted { disabled },
        DeleteOutcome::AlreadyAbsent => DeleteOutcome::AlreadyAbsent,
    }
}

/// Turn `flags` off. `Ok(false)` when the entity is already gone.
fn disable<T: Transport + ?Sized>(
    transport: &T,
    id: &EntityId,
    flags: &[&'static str],
) -> Result<bool, ReconcileError> {
    let body: BTreeMap<&str, bool> = flags.iter().map(|flag| (*flag, false)).collect();
    match put_json(transport, id, &body) {
        Ok(()) => Ok(true),
        Err(PutError::Transport(err)) if err.is_not_found() => Ok(false),
        Err(PutError::Transport(err)) => Err(transport_err(Operation::Disable, id, err)),
        Err(PutError::Json(err)) => Err(ReconcileError::Json(err)),
    }
}

fn settle(id: &EntityId, pause: &dyn Fn(Duration)) {
    tracing::debug!("{id}: settling for {:?}", SETTLING_INTERVAL);
    pause(SETTLING_INTERVAL);
}

/// A refusal caused by a dependent service still being active.
pub fn is_dependent_service(err: &TransportError) -> bool {
    match err {
        TransportError::Conflict { .. } => true,
        TransportError::BadRequest { body } => {
            let body = body.to_ascii_lowercase();
            DEPENDENT_SERVICE_MARKERS.iter().any(|m| body.contains(m))
        }
        _ => false,
    }
}
