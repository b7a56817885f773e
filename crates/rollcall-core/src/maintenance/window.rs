//! Maintenance window entity and transition planning.
//!
//! The window is a singleton persisted record mutated by three writers:
//! an administrator, the periodic evaluator, and the request gate. The
//! evaluator and the gate run with no lock between them, so every
//! automatic transition is planned by one pure function of the persisted
//! fields plus the current instant. Applying a plan twice is a no-op,
//! which is what lets the two actors race and still converge.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock::TimeValue;
use crate::error::TimestampError;
use crate::events::Event;

/// Persisted maintenance configuration. One instance exists; it is
/// created with defaults on first access and never deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    /// True while maintenance is enforced (or armed ahead of `start_at`).
    #[serde(default)]
    pub active: bool,
    /// Enforcement begins once now >= start_at; immediate when unset.
    #[serde(default)]
    pub start_at: Option<TimeValue>,
    /// While active, the window clears once now >= end_at.
    #[serde(default)]
    pub end_at: Option<TimeValue>,
    /// Operator-supplied text shown to blocked users.
    #[serde(default)]
    pub message: Option<String>,
}

/// Derived window state, re-computed from `now` and the persisted fields
/// on every check. Callers branch on this instead of re-inferring it from
/// the nullable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPhase {
    /// No enforcement and none pending.
    Inactive,
    /// A start instant lies in the future; requests still pass.
    Scheduled,
    /// Non-exempt requests are blocked.
    Enforcing,
}

/// An automatic state change due on a window at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowChange {
    /// Scheduled start reached: flip `active` on.
    Activate,
    /// Maintenance over: flag off, both instants unset.
    Clear,
    /// Trailing schedule with no active window: unset both instants.
    ClearStale,
}

/// Plan the automatic transition due on `window` at `now`, if any.
///
/// Both the periodic evaluator and the request gate call this exact
/// function, so the two actors cannot disagree about what a window means.
/// End semantics win when a window has fully elapsed: it must never come
/// back as newly active.
///
/// Unparseable stored timestamps are treated as absent here (logged, not
/// raised) so a best-effort check preserves the current enforcement state
/// instead of guessing.
pub fn plan_transition(window: &MaintenanceWindow, now: DateTime<Tz>, zone: Tz) -> Option<WindowChange> {
    let start = resolve_lenient(&window.start_at, zone, "start_at");
    let end = resolve_lenient(&window.end_at, zone, "end_at");

    let start_elapsed = start.is_some_and(|s| now >= s);
    let end_elapsed = end.is_some_and(|e| now >= e);

    if window.active {
        if end_elapsed {
            return Some(WindowChange::Clear);
        }
        return None;
    }
    if start_elapsed && end_elapsed {
        return Some(WindowChange::Clear);
    }
    if start_elapsed {
        return Some(WindowChange::Activate);
    }
    if end_elapsed {
        return Some(WindowChange::ClearStale);
    }
    None
}

impl MaintenanceWindow {
    /// Apply a planned change, returning the next persisted value.
    /// The operator message survives a clear.
    pub fn with_change(&self, change: WindowChange) -> MaintenanceWindow {
        let mut next = self.clone();
        match change {
            WindowChange::Activate => next.active = true,
            WindowChange::Clear | WindowChange::ClearStale => {
                next.active = false;
                next.start_at = None;
                next.end_at = None;
            }
        }
        next
    }

    /// Derive the current phase. Pure in (self, now).
    pub fn phase(&self, now: DateTime<Tz>, zone: Tz) -> WindowPhase {
        match plan_transition(self, now, zone) {
            Some(WindowChange::Clear) | Some(WindowChange::ClearStale) => WindowPhase::Inactive,
            Some(WindowChange::Activate) => WindowPhase::Enforcing,
            None => {
                let start = resolve_lenient(&self.start_at, zone, "start_at");
                if self.active {
                    match start {
                        Some(start) if now < start => WindowPhase::Scheduled,
                        _ => WindowPhase::Enforcing,
                    }
                } else {
                    match start {
                        Some(_) => WindowPhase::Scheduled,
                        None => WindowPhase::Inactive,
                    }
                }
            }
        }
    }

    /// Strict validation for administrator edits.
    ///
    /// Unlike the automatic checks, a malformed timestamp is fatal here.
    /// An `end_at` at or before `start_at` is corrected by shifting it to
    /// `start_at + default_duration` rather than rejecting the write.
    ///
    /// # Errors
    /// Returns [`TimestampError`] when either instant fails to resolve.
    pub fn prepared_for_write(
        &self,
        zone: Tz,
        default_duration: Duration,
    ) -> Result<MaintenanceWindow, TimestampError> {
        let mut next = self.clone();
        let start = match &self.start_at {
            Some(value) => Some(value.resolve(zone)?),
            None => None,
        };
        let end = match &self.end_at {
            Some(value) => Some(value.resolve(zone)?),
            None => None,
        };
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                let shifted = start + default_duration;
                tracing::warn!(%start, %end, %shifted, "end_at not after start_at, shifting forward");
                next.end_at = Some(TimeValue::Instant(shifted.with_timezone(&Utc)));
            }
        }
        Ok(next)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Tz>, zone: Tz) -> Event {
        Event::StateSnapshot {
            phase: self.phase(now, zone),
            active: self.active,
            start_at: self.start_at.as_ref().map(ToString::to_string),
            end_at: self.end_at.as_ref().map(ToString::to_string),
            message: self.message.clone(),
            at: Utc::now(),
        }
    }
}

/// Best-effort resolution for automatic checks: a malformed stored value
/// is treated as absent so the current enforcement state is preserved
/// rather than guessed. The parse failure is logged.
pub(crate) fn resolve_lenient(
    field: &Option<TimeValue>,
    zone: Tz,
    field_name: &'static str,
) -> Option<DateTime<Tz>> {
    match field {
        None => None,
        Some(value) => match value.resolve(zone) {
            Ok(instant) => Some(instant),
            Err(err) => {
                tracing::warn!(field = field_name, %err, "ignoring unparseable maintenance timestamp");
                None
            }
        },
    }
}
