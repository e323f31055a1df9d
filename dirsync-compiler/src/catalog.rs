//! Field catalog: logical names, deprecated aliases and wire names.
//!
//! Every logical field is an [`AliasGroup`]; single-name groups are fields
//! without a deprecated spelling. Resolution always goes through the group.
//!
//! | Logical (current)                | Deprecated alias(es)              | Wire name                       | Request   |
//! |----------------------------------|-----------------------------------|---------------------------------|-----------|
//! | `display_name`                   | `displayname`                     | `displayname`                   | primary   |
//! | `employee_identifier`            | `employee_id`                     | `employeeIdentifier`            | primary   |
//! | `manager`                        | `manager_id`                      | `manager`                       | primary   |
//! | `bypass_lockout`                 | `disable_device_max_login_attempts` | `disableDeviceMaxLoginAttempts` | secondary |
//! | `enable_user_portal_multifactor` | `enable_multifactor`              | `enable_user_portal_multifactor`| secondary |
//! | `ldap_binding_user`              | `ldap_binding`                    | `ldap_binding_user`             | secondary |
//! | `system_username`                | `local_user_account`              | `systemUsername`                | secondary |
//! | `recovery_email`                 | `recovery_email_address`          | `recoveryEmail.address`         | secondary |

use dirsync_core::AliasGroup;

// ---------------------------------------------------------------------------
// Identity and profile
// ---------------------------------------------------------------------------

pub const USERNAME: AliasGroup = AliasGroup::new(&["username"]);
pub const STATE: AliasGroup = AliasGroup::new(&["state"]);
pub const PASSWORD: AliasGroup = AliasGroup::new(&["password"]);
pub const EMAIL: AliasGroup = AliasGroup::new(&["email"]);
pub const FIRST_NAME: AliasGroup = AliasGroup::new(&["first_name", "firstname"]);
pub const MIDDLE_NAME: AliasGroup = AliasGroup::new(&["middle_name", "middlename"]);
pub const LAST_NAME: AliasGroup = AliasGroup::new(&["last_name", "lastname"]);
pub const DISPLAY_NAME: AliasGroup = AliasGroup::new(&["display_name", "displayname"]);
pub const ALTERNATE_EMAIL: AliasGroup = AliasGroup::new(&["alternate_email"]);
pub const COMPANY: AliasGroup = AliasGroup::new(&["company"]);
pub const COST_CENTER: AliasGroup = AliasGroup::new(&["cost_center"]);
pub const DEPARTMENT: AliasGroup = AliasGroup::new(&["department"]);
pub const DESCRIPTION: AliasGroup = AliasGroup::new(&["description"]);
pub const EMPLOYEE_IDENTIFIER: AliasGroup =
    AliasGroup::new(&["employee_identifier", "employee_id"]);
pub const EMPLOYEE_TYPE: AliasGroup = AliasGroup::new(&["employee_type"]);
pub const JOB_TITLE: AliasGroup = AliasGroup::new(&["job_title"]);
pub const LOCATION: AliasGroup = AliasGroup::new(&["location"]);
pub const MANAGER: AliasGroup = AliasGroup::new(&["manager", "manager_id"]);
pub const UNIX_UID: AliasGroup = AliasGroup::new(&["unix_uid"]);
pub const UNIX_GUID: AliasGroup = AliasGroup::new(&["unix_guid"]);

/// Optional profile strings carried in the primary request.
pub const PROFILE_STRINGS: &[(AliasGroup, &str)] = &[
    (EMAIL, "email"),
    (FIRST_NAME, "firstname"),
    (MIDDLE_NAME, "middlename"),
    (LAST_NAME, "lastname"),
    (DISPLAY_NAME, "displayname"),
    (ALTERNATE_EMAIL, "alternateEmail"),
    (COMPANY, "company"),
    (COST_CENTER, "costCenter"),
    (DEPARTMENT, "department"),
    (DESCRIPTION, "description"),
    (EMPLOYEE_IDENTIFIER, "employeeIdentifier"),
    (EMPLOYEE_TYPE, "employeeType"),
    (JOB_TITLE, "jobTitle"),
    (LOCATION, "location"),
];

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

pub const ALLOW_PUBLIC_KEY: AliasGroup = AliasGroup::new(&["allow_public_key"]);
/// File-sharing service flag; blocks deletion while set.
pub const SAMBA_SERVICE_USER: AliasGroup = AliasGroup::new(&["samba_service_user"]);

/// Booleans the primary request carries only when explicitly set.
pub const PRIMARY_FLAGS: &[(AliasGroup, &str)] = &[
    (ALLOW_PUBLIC_KEY, "allow_public_key"),
    (SAMBA_SERVICE_USER, "samba_service_user"),
];

pub const PASSWORD_NEVER_EXPIRES: AliasGroup = AliasGroup::new(&["password_never_expires"]);
pub const BYPASS_LOCKOUT: AliasGroup =
    AliasGroup::new(&["bypass_lockout", "disable_device_max_login_attempts"]);
pub const PORTAL_MFA: AliasGroup =
    AliasGroup::new(&["enable_user_portal_multifactor", "enable_multifactor"]);
pub const SUDO: AliasGroup = AliasGroup::new(&["sudo"]);
pub const PASSWORDLESS_SUDO: AliasGroup = AliasGroup::new(&["passwordless_sudo"]);
pub const LDAP_BINDING: AliasGroup = AliasGroup::new(&["ldap_binding_user", "ldap_binding"]);
pub const MANAGED_UID: AliasGroup = AliasGroup::new(&["enable_managed_uid"]);

/// Boolean group resent in full with every secondary write.
pub const SECONDARY_FLAGS: &[(AliasGroup, &str)] = &[
    (PASSWORD_NEVER_EXPIRES, "password_never_expires"),
    (BYPASS_LOCKOUT, "disableDeviceMaxLoginAttempts"),
    (PORTAL_MFA, "enable_user_portal_multifactor"),
    (SUDO, "sudo"),
    (PASSWORDLESS_SUDO, "passwordless_sudo"),
    (LDAP_BINDING, "ldap_binding_user"),
    (MANAGED_UID, "enable_managed_uid"),
];

// ---------------------------------------------------------------------------
// Secondary strings and authorities
// ---------------------------------------------------------------------------

pub const RECOVERY_EMAIL: AliasGroup =
    AliasGroup::new(&["recovery_email", "recovery_email_address"]);
pub const SYSTEM_USERNAME: AliasGroup =
    AliasGroup::new(&["system_username", "local_user_account"]);
pub const DELEGATED_AUTHORITY: AliasGroup = AliasGroup::new(&["delegated_authority"]);
pub const PASSWORD_AUTHORITY: AliasGroup = AliasGroup::new(&["password_authority"]);

// ---------------------------------------------------------------------------
// Nested records
// ---------------------------------------------------------------------------

pub const MFA: AliasGroup = AliasGroup::new(&["mfa"]);
pub const MFA_EXCLUSION: AliasGroup = AliasGroup::new(&["exclusion"]);
pub const MFA_EXCLUSION_DAYS: AliasGroup = AliasGroup::new(&["exclusion_days", "exclusionDays"]);
pub const MFA_CONFIGURED: AliasGroup = AliasGroup::new(&["configured"]);

pub const ADDRESSES: AliasGroup = AliasGroup::new(&["addresses"]);
pub const PHONE_NUMBERS: AliasGroup = AliasGroup::new(&["phone_numbers"]);
pub const SSH_KEYS: AliasGroup = AliasGroup::new(&["ssh_keys"]);
pub const ATTRIBUTES: AliasGroup = AliasGroup::new(&["attributes"]);

/// Write-only logical fields; reads never echo them.
pub const WRITE_ONLY: &[AliasGroup] = &[PASSWORD];

/// Every group with more than one spelling.
pub fn aliased_groups() -> impl Iterator<Item = AliasGroup> {
    [
        FIRST_NAME,
        MIDDLE_NAME,
        LAST_NAME,
        DISPLAY_NAME,
        EMPLOYEE_IDENTIFIER,
        MANAGER,
        BYPASS_LOCKOUT,
        PORTAL_MFA,
        LDAP_BINDING,
        RECOVERY_EMAIL,
        SYSTEM_USERNAME,
    ]
    .into_iter()
}
