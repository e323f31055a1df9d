//! Merge policy table for scalar fields.
//!
//! Which side wins when the local desired state and the server disagree is
//! decided here, per logical field, and nowhere else.
//!
//! | Policy         | Local set      | Local unset                   |
//! |----------------|----------------|-------------------------------|
//! | `PreferRemote` | server value   | server value, unless zero     |
//! | `PreferLocal`  | local value    | server value, unless zero     |
//! | `PinIfSet`     | local value    | server value, unless zero     |
//!
//! `PreferLocal` covers booleans the server echoes unreliably (default
//! substitution); `PinIfSet` covers values the server echoes transformed or
//! not at all. The two behave alike at merge time and differ in logging:
//! a `PreferLocal` disagreement is expected noise, a `PinIfSet` one is not.

use dirsync_compiler::catalog::{self, PRIMARY_FLAGS, PROFILE_STRINGS, SECONDARY_FLAGS};
use dirsync_core::AliasGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    PreferLocal,
    PreferRemote,
    PinIfSet,
}

/// Where a logical field's value lives in a read response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireSource {
    Str(&'static str),
    Bool(&'static str),
    Int(&'static str),
    /// Bare id string or an object carrying an id.
    Manager,
    /// `recoveryEmail.address`
    RecoveryEmail,
    /// `{ "id" }` / `{ "name" }` object; `scim` also checks restricted fields.
    Authority { key: &'static str, scim: bool },
    /// Never echoed by reads.
    WriteOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRule {
    pub group: AliasGroup,
    pub source: WireSource,
    pub policy: MergePolicy,
}

const fn rule(group: AliasGroup, source: WireSource, policy: MergePolicy) -> MergeRule {
    MergeRule {
        group,
        source,
        policy,
    }
}

/// Rules not derived from the catalog's profile and flag tables.
const FIXED_RULES: &[MergeRule] = &[
    rule(
        catalog::USERNAME,
        WireSource::Str("username"),
        MergePolicy::PreferRemote,
    ),
    rule(catalog::MANAGER, WireSource::Manager, MergePolicy::PreferRemote),
    rule(
        catalog::UNIX_UID,
        WireSource::Int("unix_uid"),
        MergePolicy::PreferRemote,
    ),
    rule(
        catalog::UNIX_GUID,
        WireSource::Int("unix_guid"),
        MergePolicy::PreferRemote,
    ),
    rule(
        catalog::RECOVERY_EMAIL,
        WireSource::RecoveryEmail,
        MergePolicy::PinIfSet,
    ),
    rule(
        catalog::SYSTEM_USERNAME,
        WireSource::Str("systemUsername"),
        MergePolicy::PinIfSet,
    ),
    rule(
        catalog::DELEGATED_AUTHORITY,
        WireSource::Authority {
            key: "delegatedAuthority",
            scim: false,
        },
        MergePolicy::PinIfSet,
    ),
    rule(
        catalog::PASSWORD_AUTHORITY,
        WireSource::Authority {
            key: "passwordAuthority",
            scim: true,
        },
        MergePolicy::PinIfSet,
    ),
    rule(catalog::PASSWORD, WireSource::WriteOnly, MergePolicy::PinIfSet),
];

/// The full scalar merge table.
pub fn merge_table() -> Vec<MergeRule> {
    let profile = PROFILE_STRINGS
        .iter()
        .map(|(group, wire)| rule(*group, WireSource::Str(*wire), MergePolicy::PreferRemote));
    let primary_flags = PRIMARY_FLAGS
        .iter()
        .map(|(group, wire)| rule(*group, WireSource::Bool(*wire), MergePolicy::PreferRemote));
    let echo_unstable = SECONDARY_FLAGS
        .iter()
        .map(|(group, wire)| rule(*group, WireSource::Bool(*wire), MergePolicy::PreferLocal));

    FIXED_RULES
        .iter()
        .copied()
        .chain(profile)
        .chain(primary_flags)
        .chain(echo_unstable)
        .collect()
}

/// Policy for a logical field name, under any of its spellings.
pub fn policy_for(name: &str) -> Option<MergePolicy> {
    merge_table()
        .into_iter()
        .find(|r| r.group.contains(name))
        .map(|r| r.policy)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sudo", MergePolicy::PreferLocal)]
    #[case("disable_device_max_login_attempts", MergePolicy::PreferLocal)]
    #[case("enable_multifactor", MergePolicy::PreferLocal)]
    #[case("recovery_email", MergePolicy::PinIfSet)]
    #[case("local_user_account", MergePolicy::PinIfSet)]
    #[case("password_authority", MergePolicy::PinIfSet)]
    #[case("password", MergePolicy::PinIfSet)]
    #[case("job_title", MergePolicy::PreferRemote)]
    #[case("manager_id", MergePolicy::PreferRemote)]
    fn policy_lookup(#[case] name: &str, #[case] expected: MergePolicy) {
        assert_eq!(policy_for(name), Some(expected));
    }

    #[test]
    fn unknown_field_has_no_policy() {
        assert_eq!(policy_for("favourite_colour"), None);
    }

    #[test]
    fn each_group_appears_once() {
        let table = merge_table();
        let currents: BTreeSet<_> = table.iter().map(|r| r.group.current()).collect();
        assert_eq!(currents.len(), table.len());
    }
}
