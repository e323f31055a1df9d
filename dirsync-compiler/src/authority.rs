//! Authority encoding: one string in, one polymorphic wire shape out.
//!
//! | Raw value           | Encoded as                                        |
//! |---------------------|---------------------------------------------------|
//! | `""`, `"None"`      | nothing                                           |
//! | `"ActiveDirectory"` | `{ "name": "ActiveDirectory" }`                   |
//! | `"Scim"`            | nothing, plus a restricted-field marker (password authority only) |
//! | anything else       | `{ "id": <value> }`                               |
//!
//! Unrecognized values degrade to an id reference instead of failing; all of
//! that policy lives in [`encode`].

use dirsync_core::{AuthorityRef, RestrictedField};

const NONE: &str = "None";
const ACTIVE_DIRECTORY: &str = "ActiveDirectory";
const SCIM: &str = "Scim";

/// Tagged authority value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityValue {
    Unset,
    NamedReference { name: String },
    IdReference { id: String },
    ScimAuthority,
}

/// Which authority field is being encoded; only the password authority
/// emits restricted-field markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityField {
    Delegated,
    Password,
}

/// Wire output for one authority field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedAuthority {
    pub reference: Option<AuthorityRef>,
    pub restricted_fields: Vec<RestrictedField>,
}

/// Classify a raw authority string. Total: never fails.
pub fn encode(raw: &str) -> AuthorityValue {
    match raw {
        "" | NONE => AuthorityValue::Unset,
        ACTIVE_DIRECTORY => AuthorityValue::NamedReference {
            name: raw.to_owned(),
        },
        SCIM => AuthorityValue::ScimAuthority,
        other => {
            tracing::debug!(value = other, "authority encoded as id reference");
            AuthorityValue::IdReference {
                id: other.to_owned(),
            }
        }
    }
}

impl AuthorityValue {
    /// Lower to the wire shape for `field`.
    pub fn to_wire(&self, field: AuthorityField) -> EncodedAuthority {
        match self {
            AuthorityValue::Unset => EncodedAuthority::default(),
            AuthorityValue::NamedReference { name } => EncodedAuthority {
                reference: Some(AuthorityRef::Named { name: name.clone() }),
                restricted_fields: Vec::new(),
            },
            AuthorityValue::IdReference { id } => EncodedAuthority {
                reference: Some(AuthorityRef::Id { id: id.clone() }),
                restricted_fields: Vec::new(),
            },
            AuthorityValue::ScimAuthority => EncodedAuthority {
                reference: None,
                restricted_fields: match field {
                    AuthorityField::Password => vec![scim_password_marker()],
                    AuthorityField::Delegated => Vec::new(),
                },
            },
        }
    }
}

/// `{ "field": "password", "type": "scim", "id": null }`
pub fn scim_password_marker() -> RestrictedField {
    RestrictedField {
        field: "password".to_owned(),
        kind: "scim".to_owned(),
        id: None,
    }
}
