//! Read reconciler: merge a server read into local desired state.
//!
//! Scalars follow the [`policy`](crate::policy) table. Nested lists reverse
//! the lossy transforms applied on write:
//!
//! - attribute names are mapped back from their sanitized form to the name
//!   the caller authored,
//! - phone numbers keep the caller's formatting when the digits match,
//! - the MFA block is decoded back to a day count and only kept when the
//!   server reports an exclusion or a configured factor.
//!
//! Every key is written under the spelling the caller used, so merging the
//! output again against the same read yields the same fields.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use dirsync_compiler::alias::present_name;
use dirsync_compiler::catalog::{
    ADDRESSES, ATTRIBUTES, MFA, MFA_CONFIGURED, MFA_EXCLUSION, MFA_EXCLUSION_DAYS,
    PHONE_NUMBERS, SSH_KEYS, STATE,
};
use dirsync_compiler::{mfa, sanitize_attribute_name, Clock, MfaPolicy};
use dirsync_core::{
    AliasGroup, AuthorityRef, DesiredState, EntityId, FieldValue, RemoteEntity, State,
    WireAddress, WireAttribute, WireMfa, WirePhone, WireSshKey,
};

use crate::error::{Operation, ReconcileError};
use crate::policy::{merge_table, MergePolicy, MergeRule, WireSource};

/// Local state after a merge, ready to be persisted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledState {
    pub id: EntityId,
    pub state: State,
    pub fields: DesiredState,
}

/// Merge `remote` into `local`.
///
/// Local fields the merge does not manage pass through untouched.
pub fn merge(
    local: &DesiredState,
    remote: &RemoteEntity,
    clock: &dyn Clock,
) -> Result<ReconciledState, ReconcileError> {
    let mut fields = local.clone();

    for rule in merge_table() {
        merge_scalar(&mut fields, local, remote, &rule);
    }
    merge_state(&mut fields, local, remote);
    merge_lists(&mut fields, local, remote)?;
    merge_mfa(&mut fields, local, remote, clock)?;

    Ok(ReconciledState {
        id: remote.id.clone(),
        state: remote.state,
        fields,
    })
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

fn merge_scalar(
    fields: &mut DesiredState,
    local: &DesiredState,
    remote: &RemoteEntity,
    rule: &MergeRule,
) {
    let local_name = present_name(local, &rule.group);
    let local_value = local_name.and_then(|name| local.get(name));
    let remote_value = remote_scalar(remote, rule.source);
    let key = local_name.unwrap_or(rule.group.current());

    if let Some(value) = choose(rule, local_value, remote_value) {
        fields.set(key, value);
    }
}

/// Pick the merged value. `None` means "leave the field absent".
fn choose(
    rule: &MergeRule,
    local: Option<&FieldValue>,
    remote: Option<FieldValue>,
) -> Option<FieldValue> {
    let Some(local) = local else {
        return remote.filter(|value| !is_zero(value));
    };
    match rule.policy {
        MergePolicy::PreferRemote => Some(remote.unwrap_or_else(|| local.clone())),
        MergePolicy::PreferLocal => {
            if let Some(remote) = remote.filter(|r| r != local) {
                tracing::debug!(
                    "{}: keeping local {:?} over echoed {:?}",
                    rule.group.current(),
                    local,
                    remote
                );
            }
            Some(local.clone())
        }
        MergePolicy::PinIfSet => {
            if let Some(remote) = remote.filter(|r| r != local) {
                tracing::info!(
                    "{}: pinned local value kept; server reported {:?}",
                    rule.group.current(),
                    remote
                );
            }
            Some(local.clone())
        }
    }
}

fn is_zero(value: &FieldValue) -> bool {
    match value {
        FieldValue::Bool(b) => !b,
        FieldValue::Int(i) => *i == 0,
        FieldValue::Str(s) => s.is_empty(),
        FieldValue::List(items) => items.is_empty(),
        FieldValue::Record(map) => map.is_empty(),
    }
}

fn remote_scalar(remote: &RemoteEntity, source: WireSource) -> Option<FieldValue> {
    match source {
        WireSource::Str(key) => remote.str_field(key).map(FieldValue::from),
        WireSource::Bool(key) => remote.bool_field(key).map(FieldValue::from),
        WireSource::Int(key) => remote.field(key).and_then(Value::as_i64).map(FieldValue::from),
        WireSource::Manager => decode_manager(remote.field("manager")).map(FieldValue::from),
        WireSource::RecoveryEmail => remote
            .field("recoveryEmail")
            .and_then(|v| v.get("address"))
            .and_then(Value::as_str)
            .map(FieldValue::from),
        WireSource::Authority { key, scim } => {
            if scim && has_scim_marker(remote) {
                return Some(FieldValue::from("Scim"));
            }
            remote
                .field(key)
                .and_then(|v| serde_json::from_value::<AuthorityRef>(v.clone()).ok())
                .map(|reference| FieldValue::from(reference.logical()))
        }
        WireSource::WriteOnly => None,
    }
}

/// A manager arrives either as a bare id or as an object carrying one.
pub fn decode_manager(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(id) => Some(id.clone()),
        Value::Object(object) => object
            .get("id")
            .or_else(|| object.get("_id"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}

fn has_scim_marker(remote: &RemoteEntity) -> bool {
    remote
        .field("restrictedFields")
        .and_then(Value::as_array)
        .is_some_and(|markers| {
            markers.iter().any(|m| {
                m.get("field").and_then(Value::as_str) == Some("password")
                    && m.get("type").and_then(Value::as_str) == Some("scim")
            })
        })
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

fn merge_state(fields: &mut DesiredState, local: &DesiredState, remote: &RemoteEntity) {
    let local_name = present_name(local, &STATE);
    let local_raw = local_name
        .and_then(|name| local.get(name))
        .and_then(FieldValue::as_str);
    let key = local_name.unwrap_or(STATE.current());

    match local_raw {
        // Same state, possibly spelled in another case: keep the caller's text.
        Some(raw) if raw.parse::<State>().ok() == Some(remote.state) => {}
        Some(_) => fields.set(key, remote.state.as_wire()),
        None if remote.state != State::default() => fields.set(key, remote.state.as_wire()),
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Nested lists
// ---------------------------------------------------------------------------

fn merge_lists(
    fields: &mut DesiredState,
    local: &DesiredState,
    remote: &RemoteEntity,
) -> Result<(), ReconcileError> {
    let phones: Vec<WirePhone> = remote_list(remote, "phoneNumbers")?;
    let local_phones = local_records(local, &PHONE_NUMBERS);
    let phones: Vec<FieldValue> = phones
        .iter()
        .map(|phone| {
            let mut record = BTreeMap::new();
            insert_non_empty(&mut record, "type", &phone.kind);
            record.insert(
                "number".to_owned(),
                FieldValue::from(keep_local_formatting(&local_phones, &phone.number)),
            );
            FieldValue::Record(record)
        })
        .collect();
    set_list(fields, local, &PHONE_NUMBERS, phones);

    let addresses: Vec<WireAddress> = remote_list(remote, "addresses")?;
    let addresses: Vec<FieldValue> = addresses
        .iter()
        .map(|address| {
            let mut record = BTreeMap::new();
            insert_non_empty(&mut record, "type", &address.kind);
            insert_non_empty(&mut record, "po_box", &address.po_box);
            insert_non_empty(&mut record, "extended_address", &address.extended_address);
            insert_non_empty(&mut record, "street_address", &address.street_address);
            insert_non_empty(&mut record, "locality", &address.locality);
            insert_non_empty(&mut record, "region", &address.region);
            insert_non_empty(&mut record, "postal_code", &address.postal_code);
            insert_non_empty(&mut record, "country", &address.country);
            FieldValue::Record(record)
        })
        .collect();
    set_list(fields, local, &ADDRESSES, addresses);

    let keys: Vec<WireSshKey> = remote_list(remote, "sshKeys")?;
    let keys: Vec<FieldValue> = keys
        .iter()
        .map(|key| {
            let mut record = BTreeMap::new();
            record.insert("name".to_owned(), FieldValue::from(key.name.as_str()));
            record.insert(
                "public_key".to_owned(),
                FieldValue::from(key.public_key.as_str()),
            );
            FieldValue::Record(record)
        })
        .collect();
    set_list(fields, local, &SSH_KEYS, keys);

    let attributes: Vec<WireAttribute> = remote_list(remote, "attributes")?;
    let originals = original_attribute_names(local);
    let attributes: Vec<FieldValue> = attributes
        .iter()
        .map(|attribute| {
            let name = originals
                .get(&attribute.name)
                .cloned()
                .unwrap_or_else(|| attribute.name.clone());
            let mut record = BTreeMap::new();
            record.insert("name".to_owned(), FieldValue::from(name));
            record.insert(
                "value".to_owned(),
                FieldValue::from(attribute.value.as_str()),
            );
            FieldValue::Record(record)
        })
        .collect();
    set_list(fields, local, &ATTRIBUTES, attributes);

    Ok(())
}

fn remote_list<T: DeserializeOwned>(
    remote: &RemoteEntity,
    key: &str,
) -> Result<Vec<T>, ReconcileError> {
    match remote.field(key) {
        None => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|source| {
            ReconcileError::Decode {
                operation: Operation::Read,
                source,
            }
        }),
    }
}

fn local_records<'a>(
    local: &'a DesiredState,
    group: &AliasGroup,
) -> Vec<&'a BTreeMap<String, FieldValue>> {
    present_name(local, group)
        .and_then(|name| local.get(name))
        .and_then(FieldValue::as_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(FieldValue::as_record)
        .collect()
}

/// Write a merged list, skipping an empty one the caller never set.
fn set_list(
    fields: &mut DesiredState,
    local: &DesiredState,
    group: &AliasGroup,
    items: Vec<FieldValue>,
) {
    match present_name(local, group) {
        Some(name) => fields.set(name, items),
        None if !items.is_empty() => fields.set(group.current(), items),
        None => {}
    }
}

fn insert_non_empty(record: &mut BTreeMap<String, FieldValue>, key: &str, value: &str) {
    if !value.is_empty() {
        record.insert(key.to_owned(), FieldValue::from(value));
    }
}

/// The caller's spelling of `remote_number` when a local number has the
/// same digits; otherwise the server's.
fn keep_local_formatting(local: &[&BTreeMap<String, FieldValue>], remote_number: &str) -> String {
    let wanted = digits(remote_number);
    local
        .iter()
        .filter_map(|record| record.get("number").and_then(FieldValue::as_str))
        .find(|number| digits(number) == wanted)
        .unwrap_or(remote_number)
        .to_owned()
}

fn digits(number: &str) -> String {
    number.chars().filter(char::is_ascii_digit).collect()
}

/// Sanitized name -> authored name, from the local attribute list.
fn original_attribute_names(local: &DesiredState) -> BTreeMap<String, String> {
    local_records(local, &ATTRIBUTES)
        .into_iter()
        .filter_map(|record| record.get("name").and_then(FieldValue::as_str))
        .map(|name| (sanitize_attribute_name(name), name.to_owned()))
        .collect()
}

// ---------------------------------------------------------------------------
// MFA
// ---------------------------------------------------------------------------

fn merge_mfa(
    fields: &mut DesiredState,
    local: &DesiredState,
    remote: &RemoteEntity,
    clock: &dyn Clock,
) -> Result<(), ReconcileError> {
    let wire: Option<WireMfa> = match remote.field("mfa") {
        None => None,
        Some(value) => Some(serde_json::from_value(value.clone()).map_err(|source| {
            ReconcileError::Decode {
                operation: Operation::Read,
                source,
            }
        })?),
    };
    let key = present_name(local, &MFA).unwrap_or(MFA.current());

    let Some(wire) = wire.filter(|w| w.exclusion || w.configured) else {
        fields.remove(key);
        return Ok(());
    };

    let pinned = MfaPolicy::from_source(local)?.and_then(|policy| policy.exclusion_days);
    let mut days = mfa::decode(Some(&wire), remote.state, pinned, clock)?;
    // A sub-day expiry can read back one day long.
    if let (Some(decoded), Some(pinned)) = (days, pinned) {
        if decoded == pinned.saturating_add(1) {
            days = Some(pinned);
        }
    }

    let local_record = local
        .get(key)
        .and_then(FieldValue::as_record)
        .cloned()
        .unwrap_or_default();
    let mut record = BTreeMap::new();
    set_flag(&mut record, &local_record, &MFA_EXCLUSION, wire.exclusion);
    set_flag(&mut record, &local_record, &MFA_CONFIGURED, wire.configured);
    if let Some(days) = days {
        let days_key = present_name(&local_record, &MFA_EXCLUSION_DAYS)
            .unwrap_or(MFA_EXCLUSION_DAYS.current());
        record.insert(days_key.to_owned(), FieldValue::Int(i64::from(days)));
    }
    fields.set(key, record);
    Ok(())
}

/// Boolean inside the MFA record: written when the caller set it or it is on.
fn set_flag(
    record: &mut BTreeMap<String, FieldValue>,
    local_record: &BTreeMap<String, FieldValue>,
    group: &AliasGroup,
    value: bool,
) {
    match present_name(local_record, group) {
        Some(name) => {
            record.insert(name.to_owned(), FieldValue::Bool(value));
        }
        None if value => {
            record.insert(group.current().to_owned(), FieldValue::Bool(value));
        }
        None => {}
    }
}
