//! # dirsync-compiler
//!
//! Pure value transforms from a [`DesiredState`](dirsync_core::DesiredState)
//! to the wire requests the directory API accepts: alias resolution,
//! authority encoding, MFA transcoding and the desired-state compiler.
//! Nothing here touches the network.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dirsync_compiler::{compile, gate, SystemClock};
//! use dirsync_core::{DesiredState, State};
//!
//! fn build(desired: &DesiredState, current: Option<State>) {
//!     if let Ok(state) = gate(desired, current) {
//!         if let Ok(compiled) = compile(desired, state, &SystemClock) {
//!             println!("{} secondary flags", compiled.secondary.flags.len());
//!         }
//!     }
//! }
//! ```

pub mod alias;
pub mod authority;
pub mod catalog;
pub mod clock;
pub mod compile;
pub mod error;
pub mod mfa;

pub use alias::{resolve, FieldSource, Resolved};
pub use authority::{AuthorityField, AuthorityValue, EncodedAuthority};
pub use clock::{Clock, FixedClock, SystemClock};
pub use compile::{compile, gate, sanitize_attribute_name, target_state, CompiledRequest};
pub use error::CompileError;
pub use mfa::MfaPolicy;
