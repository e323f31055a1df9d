//! dirsync core library: field values, desired state, lifecycle, wire shapes.
//!
//! Public API surface:
//! - [`types`]: entity ids, field values, [`DesiredState`]
//! - [`lifecycle`]: [`State`] and the transition gate
//! - [`wire`]: request / response shapes exchanged with the directory API
//! - [`document`]: desired-state YAML document loading
//! - [`error`]: [`ValidationError`], [`DocumentError`]

pub mod document;
pub mod error;
pub mod lifecycle;
pub mod types;
pub mod wire;

pub use error::{DocumentError, ValidationError};
pub use lifecycle::State;
pub use types::{AliasGroup, DesiredState, EntityId, FieldValue};
pub use wire::{
    AuthorityRef, PrimaryRequest, RecoveryEmail, RemoteEntity, RestrictedField, SecondaryRequest,
    WireAddress, WireAttribute, WireMfa, WirePhone, WireSshKey,
};
