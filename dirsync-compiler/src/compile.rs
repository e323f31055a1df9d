//! Desired-state compiler.
//!
//! Turns a [`DesiredState`] into the pair of requests the two-phase executor
//! sends: a full-replace primary body and the secondary field subset that
//! the remote API drops unless it is resent on its own.

use std::collections::BTreeMap;

use dirsync_core::lifecycle::validate_transition;
use dirsync_core::{
    DesiredState, FieldValue, PrimaryRequest, RecoveryEmail, SecondaryRequest, State,
    ValidationError, WireAddress, WireAttribute, WirePhone, WireSshKey,
};

use crate::alias::{
    present_name, resolve_bool, resolve_list, resolve_opt_bool, resolve_opt_int,
    resolve_opt_str, resolve_str,
};
use crate::authority::{self, AuthorityField};
use crate::catalog::*;
use crate::clock::Clock;
use crate::error::CompileError;
use crate::mfa::{self, MfaPolicy};

/// Everything the executor and the read reconciler need from one compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRequest {
    /// Target lifecycle state the requests were compiled for.
    pub state: State,
    pub primary: PrimaryRequest,
    pub secondary: SecondaryRequest,
    /// Sanitized attribute name -> name as authored.
    pub attribute_names: BTreeMap<String, String>,
    /// Write-only logical fields the caller supplied.
    pub write_only: Vec<&'static str>,
}

// ---------------------------------------------------------------------------
// Target state
// ---------------------------------------------------------------------------

/// The state the caller asks for: the `state` field when present, otherwise
/// Staged for a new entity or the current state for an existing one.
pub fn target_state(
    desired: &DesiredState,
    current: Option<State>,
) -> Result<State, ValidationError> {
    match resolve_opt_str(desired, &STATE)? {
        Some(raw) => raw.parse(),
        None => Ok(current.unwrap_or_default()),
    }
}

/// Resolve the target state and run the lifecycle gate against `current`.
///
/// Creation may land in any state; the gate only applies to existing
/// entities. Must run before [`compile`] so an illegal transition never
/// produces a request.
pub fn gate(desired: &DesiredState, current: Option<State>) -> Result<State, ValidationError> {
    let target = target_state(desired, current)?;
    if let Some(from) = current {
        validate_transition(from, target)?;
    }
    Ok(target)
}

// ---------------------------------------------------------------------------
// Compile
// ---------------------------------------------------------------------------

/// Compile `desired` into requests for an entity in `state`.
pub fn compile(
    desired: &DesiredState,
    state: State,
    clock: &dyn Clock,
) -> Result<CompiledRequest, CompileError> {
    let (attributes, attribute_names) = compile_attributes(desired)?;
    let primary = compile_primary(desired, state, clock, attributes)?;
    let secondary = compile_secondary(desired)?;
    let write_only = WRITE_ONLY
        .iter()
        .filter(|group| present_name(desired, group).is_some())
        .map(|group| group.current())
        .collect();

    tracing::debug!(
        state = %state,
        attributes = attribute_names.len(),
        restricted = secondary.restricted_fields.len(),
        "compiled desired state"
    );

    Ok(CompiledRequest {
        state,
        primary,
        secondary,
        attribute_names,
        write_only,
    })
}

fn compile_primary(
    desired: &DesiredState,
    state: State,
    clock: &dyn Clock,
    attributes: Vec<WireAttribute>,
) -> Result<PrimaryRequest, CompileError> {
    let username = match resolve_opt_str(desired, &USERNAME)? {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => return Err(ValidationError::MissingField { field: "username" }.into()),
    };

    let mut profile = BTreeMap::new();
    for (group, wire) in PROFILE_STRINGS {
        if let Some(value) = resolve_opt_str(desired, group)? {
            profile.insert((*wire).to_owned(), value.to_owned());
        }
    }

    let mut flags = BTreeMap::new();
    for (group, wire) in PRIMARY_FLAGS {
        if let Some(value) = resolve_opt_bool(desired, group)? {
            flags.insert((*wire).to_owned(), value);
        }
    }

    let mfa = match MfaPolicy::from_source(desired)? {
        Some(policy) => mfa::encode(&policy, state, clock)?,
        None => None,
    };

    Ok(PrimaryRequest {
        username,
        profile,
        flags,
        manager: non_empty(resolve_opt_str(desired, &MANAGER)?),
        unix_uid: resolve_opt_int(desired, &UNIX_UID)?,
        unix_guid: resolve_opt_int(desired, &UNIX_GUID)?,
        password: non_empty(resolve_opt_str(desired, &PASSWORD)?),
        mfa,
        state,
        addresses: compile_addresses(desired)?,
        phone_numbers: compile_phones(desired)?,
        ssh_keys: compile_ssh_keys(desired)?,
        attributes,
    })
}

fn compile_secondary(desired: &DesiredState) -> Result<SecondaryRequest, CompileError> {
    let mut flags = BTreeMap::new();
    for (group, wire) in SECONDARY_FLAGS {
        flags.insert((*wire).to_owned(), resolve_bool(desired, group)?);
    }

    let delegated =
        authority::encode(resolve_str(desired, &DELEGATED_AUTHORITY)?).to_wire(AuthorityField::Delegated);
    let password =
        authority::encode(resolve_str(desired, &PASSWORD_AUTHORITY)?).to_wire(AuthorityField::Password);

    let mut restricted_fields = delegated.restricted_fields;
    restricted_fields.extend(password.restricted_fields);

    Ok(SecondaryRequest {
        recovery_email: resolve_opt_str(desired, &RECOVERY_EMAIL)?.map(|address| RecoveryEmail {
            address: address.to_owned(),
        }),
        system_username: resolve_opt_str(desired, &SYSTEM_USERNAME)?.map(str::to_owned),
        flags,
        delegated_authority: delegated.reference,
        password_authority: password.reference,
        restricted_fields,
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

// ---------------------------------------------------------------------------
// Nested lists
// ---------------------------------------------------------------------------

fn compile_addresses(desired: &DesiredState) -> Result<Vec<WireAddress>, CompileError> {
    let field = ADDRESSES.current();
    resolve_list(desired, &ADDRESSES)?
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<WireAddress, CompileError> {
            let entry = Entry::new(field, index, item)?;
            Ok(WireAddress {
                kind: entry.optional("type")?,
                po_box: entry.optional("po_box")?,
                extended_address: entry.optional("extended_address")?,
                street_address: entry.optional("street_address")?,
                locality: entry.optional("locality")?,
                region: entry.optional("region")?,
                postal_code: entry.optional("postal_code")?,
                country: entry.optional("country")?,
            })
        })
        .collect()
}

fn compile_phones(desired: &DesiredState) -> Result<Vec<WirePhone>, CompileError> {
    let field = PHONE_NUMBERS.current();
    resolve_list(desired, &PHONE_NUMBERS)?
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<WirePhone, CompileError> {
            let entry = Entry::new(field, index, item)?;
            Ok(WirePhone {
                kind: entry.optional("type")?,
                number: entry.required("number")?,
            })
        })
        .collect()
}

fn compile_ssh_keys(desired: &DesiredState) -> Result<Vec<WireSshKey>, CompileError> {
    let field = SSH_KEYS.current();
    resolve_list(desired, &SSH_KEYS)?
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<WireSshKey, CompileError> {
            let entry = Entry::new(field, index, item)?;
            Ok(WireSshKey {
                name: entry.required("name")?,
                public_key: entry.required("public_key")?,
            })
        })
        .collect()
}

/// Custom attributes with sanitized names, plus the reverse mapping.
fn compile_attributes(
    desired: &DesiredState,
) -> Result<(Vec<WireAttribute>, BTreeMap<String, String>), CompileError> {
    let field = ATTRIBUTES.current();
    let mut attributes = Vec::new();
    let mut names: BTreeMap<String, String> = BTreeMap::new();

    for (index, item) in resolve_list(desired, &ATTRIBUTES)?.iter().enumerate() {
        let entry = Entry::new(field, index, item)?;
        let original = entry.required("name")?;
        let sanitized = sanitize_attribute_name(&original);
        if sanitized.is_empty() {
            return Err(CompileError::EmptyAttributeName { name: original });
        }
        if let Some(first) = names.get(&sanitized) {
            return Err(CompileError::AttributeCollision {
                first: first.clone(),
                second: original,
                sanitized,
            });
        }
        attributes.push(WireAttribute {
            name: sanitized.clone(),
            value: entry.required("value")?,
        });
        names.insert(sanitized, original);
    }

    Ok((attributes, names))
}

/// Reduce an attribute name to the alphanumeric form the remote accepts.
pub fn sanitize_attribute_name(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// One mapping inside a nested list, with positional error context.
struct Entry<'a> {
    field: &'static str,
    index: usize,
    record: &'a BTreeMap<String, FieldValue>,
}

impl<'a> Entry<'a> {
    fn new(field: &'static str, index: usize, item: &'a FieldValue) -> Result<Self, CompileError> {
        match item.as_record() {
            Some(record) => Ok(Self {
                field,
                index,
                record,
            }),
            None => Err(CompileError::InvalidRecord {
                field,
                index,
                reason: format!("expected a mapping, found {}", item.kind()),
            }),
        }
    }

    fn optional(&self, key: &str) -> Result<String, CompileError> {
        match self.record.get(key) {
            None => Ok(String::new()),
            Some(FieldValue::Str(s)) => Ok(s.clone()),
            Some(FieldValue::Int(i)) => Ok(i.to_string()),
            Some(other) => Err(self.invalid(format!("'{key}' must be a string, found {}", other.kind()))),
        }
    }

    fn required(&self, key: &str) -> Result<String, CompileError> {
        if !self.record.contains_key(key) {
            return Err(self.invalid(format!("missing '{key}'")));
        }
        self.optional(key)
    }

    fn invalid(&self, reason: String) -> CompileError {
        CompileError::InvalidRecord {
            field: self.field,
            index: self.index,
            reason,
        }
    }
}
