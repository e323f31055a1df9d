//! Plan / apply pipeline shared by every CLI command.
//!
//! `plan` is pure: it resolves the target state, runs the lifecycle gate and
//! compiles requests. Everything that touches the network goes through
//! `apply`, `reconcile`, `refresh` or `retry_secondary`.

use std::fmt;

use dirsync_compiler::{compile, gate, Clock, CompiledRequest};
use dirsync_core::{DesiredState, EntityId, RemoteEntity, SecondaryRequest, State};

use crate::diff::{diff, FieldDiff};
use crate::error::ReconcileError;
use crate::executor::{self, Applied};
use crate::reconcile::{merge, ReconciledState};
use crate::transport::Transport;

/// What applying a plan will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create,
    Update { id: EntityId, from: State },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => f.write_str("create"),
            Action::Update { id, .. } => write!(f, "update {id}"),
        }
    }
}

/// A validated, compiled plan. Holding one means the lifecycle gate passed.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub action: Action,
    pub desired: DesiredState,
    pub compiled: CompiledRequest,
    pub current: Option<RemoteEntity>,
}

impl Plan {
    pub fn target_state(&self) -> State {
        self.compiled.state
    }

    /// Drift between the current entity (merged into logical fields) and the
    /// desired state. For a create every desired field shows as added.
    pub fn drift(&self, clock: &dyn Clock) -> Result<FieldDiff, ReconcileError> {
        match &self.current {
            Some(remote) => {
                let merged = merge(&self.desired, remote, clock)?;
                Ok(diff(&merged.fields, &self.desired))
            }
            None => Ok(diff(&DesiredState::new(), &self.desired)),
        }
    }
}

/// Result of a completed apply: what was written and the merged read-back.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub applied: Applied,
    pub reconciled: ReconciledState,
}

/// Build a plan against `current`. No network.
pub fn plan(
    desired: &DesiredState,
    current: Option<&RemoteEntity>,
    clock: &dyn Clock,
) -> Result<Plan, ReconcileError> {
    let state = gate(desired, current.map(|entity| entity.state))?;
    let compiled = compile(desired, state, clock)?;
    let action = match current {
        None => Action::Create,
        Some(entity) => Action::Update {
            id: entity.id.clone(),
            from: entity.state,
        },
    };
    tracing::info!("plan: {action} (target state {state})");
    Ok(Plan {
        action,
        desired: desired.clone(),
        compiled,
        current: current.cloned(),
    })
}

/// Execute `plan`, then read the entity back and merge it.
pub fn apply<T: Transport + ?Sized>(
    transport: &T,
    plan: &Plan,
    clock: &dyn Clock,
) -> Result<Outcome, ReconcileError> {
    let id = match &plan.action {
        Action::Create => None,
        Action::Update { id, .. } => Some(id),
    };
    let applied = executor::apply(transport, id, &plan.compiled)?;
    let remote = match executor::read(transport, &applied.entity.id)? {
        Some(remote) => remote,
        None => {
            tracing::warn!(
                "{} not readable right after write; merging the write response",
                applied.entity.id
            );
            applied.entity.clone()
        }
    };
    let reconciled = merge(&plan.desired, &remote, clock)?;
    Ok(Outcome {
        applied,
        reconciled,
    })
}

/// Read, plan and apply in one pass. A known id that reads back as absent
/// is planned as a create.
pub fn reconcile<T: Transport + ?Sized>(
    transport: &T,
    desired: &DesiredState,
    id: Option<&EntityId>,
    clock: &dyn Clock,
) -> Result<Outcome, ReconcileError> {
    let current = match id {
        Some(id) => {
            let current = executor::read(transport, id)?;
            if current.is_none() {
                tracing::info!("{id} no longer exists; planning a create");
            }
            current
        }
        None => None,
    };
    let plan = plan(desired, current.as_ref(), clock)?;
    apply(transport, &plan, clock)
}

/// Read and merge only. `None` when the entity is gone.
pub fn refresh<T: Transport + ?Sized>(
    transport: &T,
    id: &EntityId,
    local: &DesiredState,
    clock: &dyn Clock,
) -> Result<Option<ReconciledState>, ReconcileError> {
    match executor::read(transport, id)? {
        Some(remote) => Ok(Some(merge(local, &remote, clock)?)),
        None => Ok(None),
    }
}

/// Resend only the secondary request, after a
/// [`ReconcileError::SecondaryWrite`].
pub fn retry_secondary<T: Transport + ?Sized>(
    transport: &T,
    id: &EntityId,
    secondary: &SecondaryRequest,
) -> Result<(), ReconcileError> {
    executor::apply_secondary(transport, id, secondary)
}
