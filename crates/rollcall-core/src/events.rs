use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::maintenance::WindowPhase;

/// Which actor performed a window transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    /// The fixed-interval background evaluator.
    Evaluator,
    /// The per-request enforcement gate.
    Gate,
    /// A manual administrator edit.
    Admin,
}

/// Every window state change produces an Event.
/// The CLI prints them; a web shell would surface them to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Enforcement began (scheduled start reached, or flag set manually).
    MaintenanceActivated { actor: Actor, at: DateTime<Utc> },
    /// An active window ended: flag off, both instants unset.
    MaintenanceCleared { actor: Actor, at: DateTime<Utc> },
    /// A trailing schedule with no active window was reconciled away.
    StaleScheduleCleared { actor: Actor, at: DateTime<Utc> },
    /// The window record was edited directly.
    WindowUpdated { actor: Actor, at: DateTime<Utc> },
    StateSnapshot {
        phase: WindowPhase,
        active: bool,
        start_at: Option<String>,
        end_at: Option<String>,
        message: Option<String>,
        at: DateTime<Utc>,
    },
}
