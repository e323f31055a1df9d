//! Domain types for desired state.
//!
//! A [`DesiredState`] is a flat mapping of logical field name to
//! [`FieldValue`]. Presence is explicit: a field set to `false` or `""` is
//! present, and callers must ask [`DesiredState::is_present`] rather than
//! compare against a zero value.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Server-assigned identifier of a directory entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// A single desired-state value.
///
/// Variant order matters for untagged deserialization: booleans and integers
/// must be tried before strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<FieldValue>),
    Record(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Record(map) => Some(map),
            _ => None,
        }
    }

    /// Short type label used in validation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "a boolean",
            FieldValue::Int(_) => "an integer",
            FieldValue::Str(_) => "a string",
            FieldValue::List(_) => "a list",
            FieldValue::Record(_) => "a mapping",
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::List(items)
    }
}

impl From<BTreeMap<String, FieldValue>> for FieldValue {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        FieldValue::Record(map)
    }
}

// ---------------------------------------------------------------------------
// Alias groups
// ---------------------------------------------------------------------------

/// Logical field names that denote one concept, ranked by precedence.
///
/// `names[0]` is the current name; the rest are deprecated aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasGroup {
    pub names: &'static [&'static str],
}

impl AliasGroup {
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    /// The current (non-deprecated) name.
    pub fn current(&self) -> &'static str {
        self.names[0]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| *n == name)
    }
}

// ---------------------------------------------------------------------------
// Desired state
// ---------------------------------------------------------------------------

/// Caller-supplied target configuration for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesiredState {
    fields: BTreeMap<String, FieldValue>,
}

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    /// Builder-style insert, handy for tests and fixtures.
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Whether `name` was explicitly supplied, regardless of its value.
    pub fn is_present(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_owned(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// String field, erroring when present with another shape.
    pub fn str_field(&self, name: &str) -> Result<Option<&str>, ValidationError> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(FieldValue::Str(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(type_err(name, "a string")),
        }
    }

    pub fn bool_field(&self, name: &str) -> Result<Option<bool>, ValidationError> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(FieldValue::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(type_err(name, "a boolean")),
        }
    }

    pub fn int_field(&self, name: &str) -> Result<Option<i64>, ValidationError> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(FieldValue::Int(i)) => Ok(Some(*i)),
            Some(_) => Err(type_err(name, "an integer")),
        }
    }

    pub fn list_field(&self, name: &str) -> Result<&[FieldValue], ValidationError> {
        match self.fields.get(name) {
            None => Ok(&[]),
            Some(FieldValue::List(items)) => Ok(items.as_slice()),
            Some(_) => Err(type_err(name, "a list")),
        }
    }

    pub fn record_field(
        &self,
        name: &str,
    ) -> Result<Option<&BTreeMap<String, FieldValue>>, ValidationError> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(FieldValue::Record(map)) => Ok(Some(map)),
            Some(_) => Err(type_err(name, "a mapping")),
        }
    }
}

fn type_err(name: &str, expected: &'static str) -> ValidationError {
    ValidationError::FieldType {
        field: name.to_owned(),
        expected,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
