//! MFA exclusion transcoding.
//!
//! The exclusion window is authored as a relative day count and sent in a
//! state-dependent shape:
//!
//! | State     | Wire                                      |
//! |-----------|-------------------------------------------|
//! | Staged    | `exclusionDays: n`                        |
//! | Activated | `exclusionUntil: <today + n>T00:00:00Z`   |
//! | Suspended | block omitted                             |
//!
//! Arithmetic is on UTC calendar dates, so every run on the same day
//! produces the same serialized date.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};

use dirsync_core::{FieldValue, State, ValidationError, WireMfa};

use crate::alias::{resolve_opt_bool, resolve_opt_int, resolve_record};
use crate::alias::FieldSource;
use crate::catalog::{MFA, MFA_CONFIGURED, MFA_EXCLUSION, MFA_EXCLUSION_DAYS};
use crate::clock::Clock;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// MFA policy as authored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MfaPolicy {
    pub exclusion: bool,
    pub exclusion_days: Option<u32>,
    pub configured: bool,
}

impl MfaPolicy {
    /// Read the `mfa` record, if the caller supplied one.
    pub fn from_source<S: FieldSource + ?Sized>(
        source: &S,
    ) -> Result<Option<Self>, ValidationError> {
        let Some(record) = resolve_record(source, &MFA)? else {
            return Ok(None);
        };
        let exclusion_days = match resolve_opt_int(record, &MFA_EXCLUSION_DAYS)? {
            None => None,
            Some(days) => Some(u32::try_from(days).map_err(|_| ValidationError::FieldType {
                field: "mfa.exclusion_days".to_owned(),
                expected: "a non-negative integer",
            })?),
        };
        Ok(Some(Self {
            exclusion: resolve_opt_bool(record, &MFA_EXCLUSION)?.unwrap_or(false),
            exclusion_days,
            configured: resolve_opt_bool(record, &MFA_CONFIGURED)?.unwrap_or(false),
        }))
    }

    /// Logical `mfa` record, keyed by current names.
    pub fn to_record(&self) -> BTreeMap<String, FieldValue> {
        let mut record = BTreeMap::new();
        record.insert(
            MFA_EXCLUSION.current().to_owned(),
            FieldValue::Bool(self.exclusion),
        );
        if let Some(days) = self.exclusion_days {
            record.insert(
                MFA_EXCLUSION_DAYS.current().to_owned(),
                FieldValue::Int(i64::from(days)),
            );
        }
        record.insert(
            MFA_CONFIGURED.current().to_owned(),
            FieldValue::Bool(self.configured),
        );
        record
    }
}

/// Encode `policy` for an entity in `state`. `None` means "omit the block".
pub fn encode(
    policy: &MfaPolicy,
    state: State,
    clock: &dyn Clock,
) -> Result<Option<WireMfa>, ValidationError> {
    let wire = match state {
        State::Suspended => return Ok(None),
        State::Staged => WireMfa {
            exclusion: policy.exclusion,
            exclusion_days: policy.exclusion_days,
            exclusion_until: None,
            configured: policy.configured,
        },
        State::Activated => {
            let until = match policy.exclusion_days {
                None => None,
                Some(days) => {
                    let date = clock
                        .today()
                        .checked_add_days(Days::new(u64::from(days)))
                        .ok_or(ValidationError::FieldType {
                            field: "mfa.exclusion_days".to_owned(),
                            expected: "a day count within the calendar range",
                        })?;
                    Some(format_exclusion_until(date))
                }
            };
            WireMfa {
                exclusion: policy.exclusion,
                exclusion_days: None,
                exclusion_until: until,
                configured: policy.configured,
            }
        }
    };
    Ok(Some(wire))
}

/// Recover a day count from the server's MFA block.
///
/// Falls back to `pinned` whenever the server returned nothing usable (no
/// block, a suspended entity, or an expiry that is not in the future).
pub fn decode(
    wire: Option<&WireMfa>,
    state: State,
    pinned: Option<u32>,
    clock: &dyn Clock,
) -> Result<Option<u32>, ValidationError> {
    let Some(wire) = wire else {
        return Ok(pinned);
    };
    match state {
        State::Staged => Ok(wire.exclusion_days.or(pinned)),
        State::Activated => match wire.exclusion_until.as_deref() {
            Some(raw) => {
                let until = parse_exclusion_until(raw)?;
                Ok(days_until(until, clock.today()).or(pinned))
            }
            None => Ok(wire.exclusion_days.or(pinned)),
        },
        State::Suspended => Ok(pinned),
    }
}

/// `YYYY-MM-DDT00:00:00Z`
pub fn format_exclusion_until(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

/// Accept an RFC 3339 datetime or a bare `YYYY-MM-DD` date.
pub fn parse_exclusion_until(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(start_of_day)
        .ok_or_else(|| ValidationError::MalformedTimestamp {
            field: "mfa.exclusionUntil",
            value: raw.to_owned(),
        })
}

/// Whole days from the start of `today` to `until`, rounded up.
/// `None` when `until` is not in the future.
pub fn days_until(until: DateTime<Utc>, today: NaiveDate) -> Option<u32> {
    let start = start_of_day(today)?;
    let seconds = (until - start).num_seconds();
    if seconds <= 0 {
        return None;
    }
    let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    u32::try_from(days).ok()
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}
