//! Two-phase update executor.
//!
//! ## Protocol
//!
//! 1. Send the primary request as a full replace (`POST` on create, `PUT`
//!    on update). Failure here aborts and is surfaced as-is.
//! 2. Send the secondary request with `PUT`, every time. The remote drops
//!    these fields unless they are resent on their own. Failure here is a
//!    [`ReconcileError::SecondaryWrite`]: the entity exists and only the
//!    secondary write needs retrying.
//!
//! The two calls are strictly sequential; step 2 needs the id from step 1.

use serde::Serialize;

use dirsync_compiler::CompiledRequest;
use dirsync_core::{EntityId, PrimaryRequest, RemoteEntity, SecondaryRequest};

use crate::error::{transport_err, Operation, ReconcileError, TransportError};
use crate::transport::{entity_path, Method, Transport, USERS_PATH};

/// Result of a completed two-phase write.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// Entity as returned by the primary write.
    pub entity: RemoteEntity,
    pub created: bool,
    /// Write-only fields that were sent; reads will not echo them.
    pub write_only: Vec<&'static str>,
}

/// Create or update, depending on whether an id is known.
pub fn apply<T: Transport + ?Sized>(
    transport: &T,
    id: Option<&EntityId>,
    compiled: &CompiledRequest,
) -> Result<Applied, ReconcileError> {
    let (entity, created) = match id {
        None => (write_primary_create(transport, &compiled.primary)?, true),
        Some(id) => (write_primary_update(transport, id, &compiled.primary)?, false),
    };
    apply_secondary(transport, &entity.id, &compiled.secondary)?;
    Ok(Applied {
        entity,
        created,
        write_only: compiled.write_only.clone(),
    })
}

fn write_primary_create<T: Transport + ?Sized>(
    transport: &T,
    primary: &PrimaryRequest,
) -> Result<RemoteEntity, ReconcileError> {
    tracing::info!("create {}: primary write", primary.username);
    let body = serde_json::to_vec(primary)?;
    let bytes = transport
        .request(Method::Post, USERS_PATH, Some(&body))
        .map_err(|e| transport_err(Operation::Create, &primary.username, e))?;
    decode_entity(Operation::Create, &bytes)
}

fn write_primary_update<T: Transport + ?Sized>(
    transport: &T,
    id: &EntityId,
    primary: &PrimaryRequest,
) -> Result<RemoteEntity, ReconcileError> {
    tracing::info!("update {id}: primary write");
    let body = serde_json::to_vec(primary)?;
    let bytes = transport
        .request(Method::Put, &entity_path(id), Some(&body))
        .map_err(|e| transport_err(Operation::Update, id, e))?;
    decode_entity(Operation::Update, &bytes)
}

/// Resend only the secondary field subset. Idempotent: the subset is
/// overwritten in full on every call.
pub fn apply_secondary<T: Transport + ?Sized>(
    transport: &T,
    id: &EntityId,
    secondary: &SecondaryRequest,
) -> Result<(), ReconcileError> {
    tracing::info!("update {id}: secondary write");
    put_json(transport, id, secondary).map_err(|err| match err {
        PutError::Json(e) => ReconcileError::Json(e),
        PutError::Transport(source) => {
            tracing::warn!("secondary write for {id} failed after primary write: {source}");
            ReconcileError::SecondaryWrite {
                id: id.clone(),
                source,
            }
        }
    })
}

/// Read the entity back. Not-found is "absent", not an error.
pub fn read<T: Transport + ?Sized>(
    transport: &T,
    id: &EntityId,
) -> Result<Option<RemoteEntity>, ReconcileError> {
    tracing::debug!("read {id}");
    match transport.request(Method::Get, &entity_path(id), None) {
        Ok(bytes) => decode_entity(Operation::Read, &bytes).map(Some),
        Err(err) if err.is_not_found() => {
            tracing::info!("{id} not found on read; treating as absent");
            Ok(None)
        }
        Err(err) => Err(transport_err(Operation::Read, id, err)),
    }
}

pub(crate) enum PutError {
    Json(serde_json::Error),
    Transport(TransportError),
}

/// `PUT /systemusers/{id}` with a JSON body; the response body is not needed.
pub(crate) fn put_json<T: Transport + ?Sized, B: Serialize>(
    transport: &T,
    id: &EntityId,
    body: &B,
) -> Result<(), PutError> {
    let body = serde_json::to_vec(body).map_err(PutError::Json)?;
    transport
        .request(Method::Put, &entity_path(id), Some(&body))
        .map(|_| ())
        .map_err(PutError::Transport)
}

fn decode_entity(operation: Operation, bytes: &[u8]) -> Result<RemoteEntity, ReconcileError> {
    serde_json::from_slice(bytes).map_err(|source| ReconcileError::Decode { operation, source })
}
