//! Reference-timezone clock and timestamp normalization.
//!
//! Every maintenance decision compares instants in one named timezone.
//! The host-local zone is never consulted: a scheduled window has to mean
//! the same wall-clock moment on every machine that evaluates it.
//!
//! Stored timestamps are heterogeneous -- administrators submit
//! `YYYY-MM-DDTHH:MM` strings from datetime inputs, older rows carry
//! `YYYY-MM-DD HH:MM:SS`, and programmatic writers store full ISO-8601.
//! [`TimeValue`] models all of them and [`TimeValue::resolve`] collapses
//! them into a single comparable instant.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::TimestampError;

/// Default reference timezone. Deployments override it via
/// `maintenance.timezone` in the configuration file.
pub const DEFAULT_ZONE: Tz = chrono_tz::Asia::Shanghai;

/// Format used by HTML `datetime-local` inputs.
const FORMAT_DATETIME_LOCAL: &str = "%Y-%m-%dT%H:%M";
/// Format used by older rows written through SQL tooling.
const FORMAT_SQL: &str = "%Y-%m-%d %H:%M:%S";

/// Source of "now" in the reference timezone.
///
/// The evaluator and the gate both take a clock by value so tests can run
/// them against a [`ManualClock`] without a real timer.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
    fn zone(&self) -> Tz;
}

/// Wall clock anchored to a named zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    zone: Tz,
}

impl SystemClock {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self { zone: DEFAULT_ZONE }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.zone)
    }

    fn zone(&self) -> Tz {
        self.zone
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Tz>>>,
}

impl ManualClock {
    pub fn new(at: DateTime<Tz>) -> Self {
        Self {
            now: Arc::new(Mutex::new(at)),
        }
    }

    pub fn set(&self, at: DateTime<Tz>) {
        *self.now.lock().expect("clock lock poisoned") = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Tz> {
        *self.now.lock().expect("clock lock poisoned")
    }

    fn zone(&self) -> Tz {
        self.now.lock().expect("clock lock poisoned").timezone()
    }
}

/// A timestamp as it may arrive from storage or an administrator: an
/// already-anchored instant, a naive local datetime, or raw text in one
/// of the accepted encodings.
///
/// Serializes to its canonical string form; deserialized values always
/// come back as [`TimeValue::Raw`] and go through the same parse chain as
/// stored text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeValue {
    /// Timezone-aware instant (stored internally as UTC).
    Instant(DateTime<Utc>),
    /// Naive datetime, interpreted in the reference zone.
    Naive(NaiveDateTime),
    /// Unparsed text from storage or a form field.
    Raw(String),
}

impl TimeValue {
    /// Resolve to an instant in `zone`.
    ///
    /// # Errors
    /// Returns [`TimestampError::Malformed`] when raw text matches none of
    /// the accepted encodings, or [`TimestampError::NonexistentLocal`] when
    /// a naive value falls in a DST gap of the zone.
    pub fn resolve(&self, zone: Tz) -> Result<DateTime<Tz>, TimestampError> {
        match self {
            TimeValue::Instant(t) => Ok(t.with_timezone(&zone)),
            TimeValue::Naive(naive) => anchor_local(*naive, zone),
            TimeValue::Raw(raw) => parse_timestamp(raw, zone),
        }
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeValue::Instant(t) => write!(f, "{}", t.to_rfc3339()),
            TimeValue::Naive(naive) => write!(f, "{}", naive.format(FORMAT_SQL)),
            TimeValue::Raw(raw) => f.write_str(raw),
        }
    }
}

impl From<TimeValue> for String {
    fn from(value: TimeValue) -> Self {
        value.to_string()
    }
}

impl From<String> for TimeValue {
    fn from(raw: String) -> Self {
        TimeValue::Raw(raw)
    }
}

impl From<&str> for TimeValue {
    fn from(raw: &str) -> Self {
        TimeValue::Raw(raw.to_string())
    }
}

impl From<DateTime<Utc>> for TimeValue {
    fn from(t: DateTime<Utc>) -> Self {
        TimeValue::Instant(t)
    }
}

impl From<NaiveDateTime> for TimeValue {
    fn from(naive: NaiveDateTime) -> Self {
        TimeValue::Naive(naive)
    }
}

/// Parse one of the accepted text encodings into an instant in `zone`.
///
/// Attempts `YYYY-MM-DDTHH:MM` first, then `YYYY-MM-DD HH:MM:SS`, and
/// finally strict ISO-8601 with a trailing `Z` normalized to `+00:00`.
///
/// # Errors
/// Returns [`TimestampError::Malformed`] when no encoding matches.
pub fn parse_timestamp(raw: &str, zone: Tz) -> Result<DateTime<Tz>, TimestampError> {
    let trimmed = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, FORMAT_DATETIME_LOCAL) {
        return anchor_local(naive, zone);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, FORMAT_SQL) {
        return anchor_local(naive, zone);
    }
    let normalized = if let Some(stripped) = trimmed.strip_suffix('Z') {
        format!("{stripped}+00:00")
    } else {
        trimmed.to_string()
    };
    DateTime::parse_from_rfc3339(&normalized)
        .map(|t| t.with_timezone(&zone))
        .map_err(|_| TimestampError::Malformed {
            value: raw.to_string(),
        })
}

fn anchor_local(naive: NaiveDateTime, zone: Tz) -> Result<DateTime<Tz>, TimestampError> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(t) => Ok(t),
        // Repeated hour at a DST fold: the earlier occurrence wins.
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(TimestampError::NonexistentLocal {
            value: naive.to_string(),
            zone: zone.name().to_string(),
        }),
    }
}

/// Resolve an IANA zone name from configuration.
///
/// # Errors
/// Returns [`crate::error::ConfigError::InvalidValue`] for unknown names.
pub fn parse_zone(name: &str) -> Result<Tz, crate::error::ConfigError> {
    name.parse::<Tz>()
        .map_err(|_| crate::error::ConfigError::InvalidValue {
            key: "maintenance.timezone".to_string(),
            message: format!("unknown timezone '{name}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> Tz {
        DEFAULT_ZONE
    }

    #[test]
    fn both_string_formats_resolve_to_the_same_instant() {
        let a = parse_timestamp("2026-03-14T09:30", zone()).unwrap();
        let b = parse_timestamp("2026-03-14 09:30:00", zone()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn iso8601_with_z_suffix_is_normalized() {
        let utc = parse_timestamp("2026-03-14T01:30:00Z", zone()).unwrap();
        let offset = parse_timestamp("2026-03-14T01:30:00+00:00", zone()).unwrap();
        assert_eq!(utc, offset);
        // Shanghai is UTC+8 year-round.
        assert_eq!(utc.format("%H:%M").to_string(), "09:30");
    }

    #[test]
    fn garbage_is_malformed() {
        let err = parse_timestamp("not-a-date", zone()).unwrap_err();
        assert!(matches!(err, TimestampError::Malformed { .. }));
    }

    #[test]
    fn seconds_in_the_t_format_are_not_silently_accepted() {
        // "YYYY-MM-DDTHH:MM:SS" has no offset, so it is neither of the two
        // local formats nor valid ISO-8601.
        let err = parse_timestamp("2026-03-14T09:30:00", zone()).unwrap_err();
        assert!(matches!(err, TimestampError::Malformed { .. }));
    }

    #[test]
    fn naive_values_anchor_to_the_reference_zone() {
        let naive = NaiveDateTime::parse_from_str("2026-03-14 09:30:00", FORMAT_SQL).unwrap();
        let anchored = TimeValue::Naive(naive).resolve(zone()).unwrap();
        assert_eq!(anchored.naive_local(), naive);
    }

    #[test]
    fn aware_instants_convert_rather_than_reinterpret() {
        let utc = Utc.with_ymd_and_hms(2026, 3, 14, 1, 30, 0).unwrap();
        let resolved = TimeValue::Instant(utc).resolve(zone()).unwrap();
        assert_eq!(resolved, utc);
        assert_eq!(resolved.format("%H:%M").to_string(), "09:30");
    }

    #[test]
    fn canonical_strings_round_trip_through_raw() {
        let original = TimeValue::Instant(Utc.with_ymd_and_hms(2026, 3, 14, 1, 30, 0).unwrap());
        let raw = TimeValue::Raw(original.to_string());
        assert_eq!(
            raw.resolve(zone()).unwrap(),
            original.resolve(zone()).unwrap()
        );
    }

    #[test]
    fn manual_clock_advances() {
        let start = zone().with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(clock.now(), start + chrono::Duration::minutes(5));
    }

    #[test]
    fn unknown_zone_names_are_rejected() {
        assert!(parse_zone("Mars/Olympus_Mons").is_err());
        assert!(parse_zone("Asia/Shanghai").is_ok());
    }
}
