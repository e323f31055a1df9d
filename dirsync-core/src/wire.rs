//! Wire shapes exchanged with the directory API.
//!
//! Field names follow the remote schema, which mixes `snake_case` and
//! `camelCase`; every rename is spelled out per field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lifecycle::State;
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// Nested sub-records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAddress {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "poBox", default, skip_serializing_if = "String::is_empty")]
    pub po_box: String,
    #[serde(rename = "extendedAddress", default, skip_serializing_if = "String::is_empty")]
    pub extended_address: String,
    #[serde(rename = "streetAddress", default, skip_serializing_if = "String::is_empty")]
    pub street_address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub locality: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(rename = "postalCode", default, skip_serializing_if = "String::is_empty")]
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePhone {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSshKey {
    pub name: String,
    #[serde(rename = "public_key")]
    pub public_key: String,
}

/// Custom free-form attribute. `name` is alphanumeric on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAttribute {
    pub name: String,
    pub value: String,
}

/// MFA block. Exactly one of `exclusion_days` / `exclusion_until` is set by
/// the encoder for a given state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMfa {
    #[serde(default)]
    pub exclusion: bool,
    #[serde(rename = "exclusionDays", default, skip_serializing_if = "Option::is_none")]
    pub exclusion_days: Option<u32>,
    #[serde(rename = "exclusionUntil", default, skip_serializing_if = "Option::is_none")]
    pub exclusion_until: Option<String>,
    #[serde(default)]
    pub configured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryEmail {
    pub address: String,
}

/// Encoded authority reference. Untagged; `Id` is tried first so that an
/// echoed `{ "id": .., "name": .. }` keeps its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthorityRef {
    Id { id: String },
    Named { name: String },
}

impl AuthorityRef {
    /// The logical string the reference was encoded from.
    pub fn logical(&self) -> &str {
        match self {
            AuthorityRef::Id { id } => id,
            AuthorityRef::Named { name } => name,
        }
    }
}

/// Restricted-field marker. `id` serializes as `null` when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictedField {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Full-replace request body for create and update.
///
/// Optional profile strings and flags are keyed by wire name so the field
/// catalog stays the single source of truth for naming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrimaryRequest {
    pub username: String,
    #[serde(flatten)]
    pub profile: BTreeMap<String, String>,
    #[serde(flatten)]
    pub flags: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unix_uid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unix_guid: Option<i64>,
    /// Write-only; never echoed by reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa: Option<WireMfa>,
    pub state: State,
    pub addresses: Vec<WireAddress>,
    #[serde(rename = "phoneNumbers")]
    pub phone_numbers: Vec<WirePhone>,
    #[serde(rename = "sshKeys")]
    pub ssh_keys: Vec<WireSshKey>,
    pub attributes: Vec<WireAttribute>,
}

/// Field subset resent after every primary write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecondaryRequest {
    #[serde(rename = "recoveryEmail", skip_serializing_if = "Option::is_none")]
    pub recovery_email: Option<RecoveryEmail>,
    #[serde(rename = "systemUsername", skip_serializing_if = "Option::is_none")]
    pub system_username: Option<String>,
    /// Echo-unstable booleans keyed by wire name; always sent in full.
    #[serde(flatten)]
    pub flags: BTreeMap<String, bool>,
    #[serde(rename = "delegatedAuthority", skip_serializing_if = "Option::is_none")]
    pub delegated_authority: Option<AuthorityRef>,
    #[serde(rename = "passwordAuthority", skip_serializing_if = "Option::is_none")]
    pub password_authority: Option<AuthorityRef>,
    #[serde(rename = "restrictedFields", skip_serializing_if = "Vec::is_empty")]
    pub restricted_fields: Vec<RestrictedField>,
}

// ---------------------------------------------------------------------------
// Remote entity
// ---------------------------------------------------------------------------

/// Server-side representation as returned by a read.
///
/// Everything except the id and state is kept as raw wire fields; the read
/// reconciler decodes the parts it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntity {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub state: State,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RemoteEntity {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.field(name).and_then(Value::as_bool)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn restricted_field_serializes_null_id() {
        let marker = RestrictedField {
            field: "password".into(),
            kind: "scim".into(),
            id: None,
        };
        assert_eq!(
            serde_json::to_value(&marker).unwrap(),
            json!({"field": "password", "type": "scim", "id": null})
        );
    }

    #[test]
    fn authority_ref_shapes() {
        let named = AuthorityRef::Named {
            name: "ActiveDirectory".into(),
        };
        assert_eq!(
            serde_json::to_value(&named).unwrap(),
            json!({"name": "ActiveDirectory"})
        );
        let echoed: AuthorityRef =
            serde_json::from_value(json!({"id": "corp-ad-1", "name": "Corp AD"})).unwrap();
        assert_eq!(echoed.logical(), "corp-ad-1");
    }

    #[test]
    fn remote_entity_reads_underscore_id_and_keeps_extra_fields() {
        let entity: RemoteEntity = serde_json::from_value(json!({
            "_id": "5f1a",
            "id": "5f1a",
            "state": "ACTIVATED",
            "username": "alice",
            "manager": null
        }))
        .unwrap();
        assert_eq!(entity.id, EntityId::from("5f1a"));
        assert_eq!(entity.state, State::Activated);
        assert_eq!(entity.str_field("username"), Some("alice"));
        assert!(entity.field("manager").is_none());
    }

    #[test]
    fn secondary_request_flattens_flags_and_omits_unset_authorities() {
        let mut secondary = SecondaryRequest::default();
        secondary.flags.insert("password_never_expires".into(), false);
        let body = serde_json::to_value(&secondary).unwrap();
        assert!(body.get("delegatedAuthority").is_none());
        assert!(body.get("restrictedFields").is_none());
        assert_eq!(body["password_never_expires"], json!(false));
    }

    #[test]
    fn primary_request_flattens_profile_with_wire_names() {
        let mut primary = PrimaryRequest {
            username: "alice".into(),
            ..Default::default()
        };
        primary.profile.insert("jobTitle".into(), "Engineer".into());
        let body = serde_json::to_value(&primary).unwrap();
        assert_eq!(body["jobTitle"], json!("Engineer"));
        assert_eq!(body["state"], json!("STAGED"));
        assert!(body.get("password").is_none());
        assert_eq!(body["phoneNumbers"], json!([]));
    }
}
