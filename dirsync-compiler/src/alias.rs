//! Alias resolution by explicit presence.
//!
//! The first name in the group that is *present* wins, even when its value
//! is `false` or empty. Absent groups resolve to the type's zero value.

use std::collections::BTreeMap;

use dirsync_core::{AliasGroup, DesiredState, FieldValue, ValidationError};

/// Anything that can answer "is this field present, and with what value".
pub trait FieldSource {
    fn lookup(&self, name: &str) -> Option<&FieldValue>;
}

impl FieldSource for DesiredState {
    fn lookup(&self, name: &str) -> Option<&FieldValue> {
        self.get(name)
    }
}

impl FieldSource for BTreeMap<String, FieldValue> {
    fn lookup(&self, name: &str) -> Option<&FieldValue> {
        self.get(name)
    }
}

/// A resolved field: which spelling supplied it, and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub name: &'static str,
    pub value: &'a FieldValue,
}

/// First explicitly present name in `group`, in precedence order.
pub fn resolve<'a, S: FieldSource + ?Sized>(
    source: &'a S,
    group: &AliasGroup,
) -> Option<Resolved<'a>> {
    let found = group
        .names
        .iter()
        .find_map(|name| {
            source
                .lookup(name)
                .map(|value| Resolved { name: *name, value })
        })?;
    if found.name != group.current() {
        tracing::warn!(
            field = found.name,
            current = group.current(),
            "deprecated field name in use"
        );
    }
    Some(found)
}

/// Name under which `group` is currently spelled in `source`, if at all.
pub fn present_name<S: FieldSource + ?Sized>(
    source: &S,
    group: &AliasGroup,
) -> Option<&'static str> {
    group
        .names
        .iter()
        .copied()
        .find(|name| source.lookup(name).is_some())
}

/// Boolean group; `false` when absent.
pub fn resolve_bool<S: FieldSource + ?Sized>(
    source: &S,
    group: &AliasGroup,
) -> Result<bool, ValidationError> {
    Ok(resolve_opt_bool(source, group)?.unwrap_or(false))
}

pub fn resolve_opt_bool<S: FieldSource + ?Sized>(
    source: &S,
    group: &AliasGroup,
) -> Result<Option<bool>, ValidationError> {
    match resolve(source, group) {
        None => Ok(None),
        Some(Resolved {
            value: FieldValue::Bool(b),
            ..
        }) => Ok(Some(*b)),
        Some(r) => Err(type_err(r.name, "a boolean")),
    }
}

/// String group; `""` when absent.
pub fn resolve_str<'a, S: FieldSource + ?Sized>(
    source: &'a S,
    group: &AliasGroup,
) -> Result<&'a str, ValidationError> {
    Ok(resolve_opt_str(source, group)?.unwrap_or(""))
}

pub fn resolve_opt_str<'a, S: FieldSource + ?Sized>(
    source: &'a S,
    group: &AliasGroup,
) -> Result<Option<&'a str>, ValidationError> {
    match resolve(source, group) {
        None => Ok(None),
        Some(Resolved {
            value: FieldValue::Str(s),
            ..
        }) => Ok(Some(s.as_str())),
        Some(r) => Err(type_err(r.name, "a string")),
    }
}

pub fn resolve_opt_int<S: FieldSource + ?Sized>(
    source: &S,
    group: &AliasGroup,
) -> Result<Option<i64>, ValidationError> {
    match resolve(source, group) {
        None => Ok(None),
        Some(Resolved {
            value: FieldValue::Int(i),
            ..
        }) => Ok(Some(*i)),
        Some(r) => Err(type_err(r.name, "an integer")),
    }
}

/// List group; empty when absent.
pub fn resolve_list<'a, S: FieldSource + ?Sized>(
    source: &'a S,
    group: &AliasGroup,
) -> Result<&'a [FieldValue], ValidationError> {
    match resolve(source, group) {
        None => Ok(&[]),
        Some(Resolved {
            value: FieldValue::List(items),
            ..
        }) => Ok(items.as_slice()),
        Some(r) => Err(type_err(r.name, "a list")),
    }
}

pub fn resolve_record<'a, S: FieldSource + ?Sized>(
    source: &'a S,
    group: &AliasGroup,
) -> Result<Option<&'a BTreeMap<String, FieldValue>>, ValidationError> {
    match resolve(source, group) {
        None => Ok(None),
        Some(Resolved {
            value: FieldValue::Record(map),
            ..
        }) => Ok(Some(map)),
        Some(r) => Err(type_err(r.name, "a mapping")),
    }
}

fn type_err(name: &str, expected: &'static str) -> ValidationError {
    ValidationError::FieldType {
        field: name.to_owned(),
        expected,
    }
}
