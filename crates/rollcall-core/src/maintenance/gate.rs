//! Request-time enforcement gate.
//!
//! The gate runs inline on every inbound request except an explicit
//! bypass list. It makes its decision fresh per request from the
//! persisted window and the current instant, and it shares the
//! transition planner with the periodic evaluator so the two actors
//! cannot disagree about what a window means. When a scheduled start has
//! arrived before the evaluator noticed, the gate itself activates the
//! window, so enforcement is never delayed by the polling interval while
//! there is live traffic.
//!
//! The gate never returns an error: unreadable settings fail open
//! (enforcement is a policy layer, not a security boundary), while an
//! undecidable exemption fails closed (treated as non-exempt).

use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::exemption::ExemptionPolicy;
use super::window::{plan_transition, resolve_lenient, MaintenanceWindow, WindowChange};
use crate::clock::Clock;
use crate::events::{Actor, Event};
use crate::storage::SettingsStore;

/// Route identifiers for the pages that must stay reachable while
/// everything else is blocked.
pub const ROUTE_NOTICE: &str = "maintenance_notice";
pub const ROUTE_LOGIN: &str = "login";
pub const ROUTE_LOGOUT: &str = "logout";
pub const ROUTE_STATIC: &str = "static";

/// Default bypass list.
pub const BYPASS_ROUTES: [&str; 4] = [ROUTE_NOTICE, ROUTE_LOGIN, ROUTE_LOGOUT, ROUTE_STATIC];

/// The identity the surrounding web layer resolves for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub authenticated: bool,
    pub role: String,
    pub id: String,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            role: String::new(),
            id: String::new(),
        }
    }
}

/// Terminal action for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// Let the request proceed untouched.
    Allow,
    /// Block the request. The web layer ends the caller's session when
    /// `terminate_session` is set, then redirects to `redirect_to`
    /// (`None` when the request already targets the notice route).
    Deny {
        terminate_session: bool,
        redirect_to: Option<String>,
    },
}

/// Decision plus the state-change event, if the gate mutated the window.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub decision: GateDecision,
    pub event: Option<Event>,
}

impl GateOutcome {
    fn allow() -> Self {
        Self {
            decision: GateDecision::Allow,
            event: None,
        }
    }
}

/// What the maintenance notice page renders.
#[derive(Debug, Clone, Serialize)]
pub struct NoticeContent {
    pub message: Option<String>,
    pub ends_at: Option<chrono::DateTime<Tz>>,
}

/// Per-request enforcement gate over the shared settings store.
pub struct RequestGate<S, C> {
    store: S,
    clock: C,
    exemptions: ExemptionPolicy,
    notice_route: String,
    bypass_routes: Vec<String>,
}

impl<S: SettingsStore, C: Clock> RequestGate<S, C> {
    pub fn new(store: S, clock: C, exemptions: ExemptionPolicy) -> Self {
        Self {
            store,
            clock,
            exemptions,
            notice_route: ROUTE_NOTICE.to_string(),
            bypass_routes: BYPASS_ROUTES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Override the notice route and bypass list (the notice route itself
    /// must always be bypassed; it is added if missing).
    pub fn with_routes(mut self, notice_route: &str, bypass_routes: Vec<String>) -> Self {
        self.notice_route = notice_route.to_string();
        self.bypass_routes = bypass_routes;
        if !self.bypass_routes.iter().any(|r| r == notice_route) {
            self.bypass_routes.push(notice_route.to_string());
        }
        self
    }

    /// Decide the fate of one inbound request.
    ///
    /// Steps run in a fixed order: bypass list, settings load (fail-open),
    /// exemption (before any logout decision), due transition via the
    /// shared planner, then the static reading of the loaded fields. A
    /// request is never blocked by a window whose start lies in the
    /// future, and never let through once an enforced start has elapsed.
    pub fn evaluate_request(&self, caller: &Caller, route: &str) -> GateOutcome {
        if self.bypass_routes.iter().any(|r| r == route) {
            return GateOutcome::allow();
        }

        let window = match self.store.load() {
            Ok(Some(window)) => window,
            Ok(None) => return GateOutcome::allow(),
            Err(err) => {
                tracing::warn!(%err, route, "settings unreadable, failing open");
                return GateOutcome::allow();
            }
        };

        if self.exemptions.is_exempt(caller) {
            return GateOutcome::allow();
        }

        let now = self.clock.now();
        let zone = self.clock.zone();

        if let Some(change) = plan_transition(&window, now, zone) {
            let next = window.with_change(change);
            self.persist_best_effort(&next);
            return match change {
                WindowChange::Activate => {
                    // The scheduled start arrived before the evaluator's
                    // next tick; this request both activates and is blocked.
                    tracing::info!(route, "maintenance window activated by request gate");
                    GateOutcome {
                        decision: self.deny(caller, route),
                        event: Some(Event::MaintenanceActivated {
                            actor: Actor::Gate,
                            at: Utc::now(),
                        }),
                    }
                }
                WindowChange::Clear => GateOutcome {
                    decision: GateDecision::Allow,
                    event: Some(Event::MaintenanceCleared {
                        actor: Actor::Gate,
                        at: Utc::now(),
                    }),
                },
                WindowChange::ClearStale => GateOutcome {
                    decision: GateDecision::Allow,
                    event: Some(Event::StaleScheduleCleared {
                        actor: Actor::Gate,
                        at: Utc::now(),
                    }),
                },
            };
        }

        if window.active {
            if let Some(start) = resolve_lenient(&window.start_at, zone, "start_at") {
                if now < start {
                    // Armed ahead of schedule: warning only, requests pass.
                    return GateOutcome::allow();
                }
            }
            return GateOutcome {
                decision: self.deny(caller, route),
                event: None,
            };
        }

        GateOutcome::allow()
    }

    /// What the notice page renders. Unreadable settings yield an empty
    /// notice rather than an error page.
    pub fn notice_content(&self) -> NoticeContent {
        match self.store.load() {
            Ok(Some(window)) => NoticeContent {
                ends_at: resolve_lenient(&window.end_at, self.clock.zone(), "end_at"),
                message: window.message,
            },
            _ => NoticeContent {
                message: None,
                ends_at: None,
            },
        }
    }

    fn deny(&self, caller: &Caller, route: &str) -> GateDecision {
        tracing::info!(route, user = %caller.id, "request blocked by maintenance window");
        let redirect_to = if route == self.notice_route {
            None
        } else {
            Some(self.notice_route.clone())
        };
        GateDecision::Deny {
            terminate_session: caller.authenticated,
            redirect_to,
        }
    }

    // The decision is already derived from now + the loaded fields; a
    // failed write only delays convergence until the next actor runs.
    fn persist_best_effort(&self, window: &MaintenanceWindow) {
        if let Err(err) = self.store.save(window) {
            tracing::warn!(%err, "failed to persist gate-side window update");
        }
    }
}
