//! # dirsync-reconcile
//!
//! Side-effecting half of the reconciler: the transport boundary, the
//! two-phase update executor, the read reconciler, the deletion
//! preconditioner and the local state store.
//!
//! Call [`pipeline::reconcile`] to drive one entity to its desired state,
//! or [`pipeline::plan`] to validate and preview without touching the
//! network.

pub mod delete;
pub mod diff;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod policy;
pub mod reconcile;
pub mod staleness;
pub mod state_store;
pub mod transport;

pub use delete::{delete, DeleteOutcome};
pub use diff::{FieldChange, FieldDiff};
pub use error::{Operation, ReconcileError, TransportError};
pub use executor::Applied;
pub use pipeline::{Action, Outcome, Plan};
pub use policy::MergePolicy;
pub use reconcile::{merge, ReconciledState};
pub use staleness::StalenessSignal;
pub use state_store::StateRecord;
pub use transport::{HttpConfig, HttpTransport, Method, Transport};
