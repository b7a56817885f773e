//! Integration tests for the maintenance core.
//!
//! These drive the periodic evaluator and the request gate together over
//! one shared store, the way they run in production: no lock between
//! them, each re-deriving state from the persisted fields and the clock.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use chrono_tz::Tz;
use rollcall_core::{
    Caller, Event, ExemptionPolicy, GateDecision, MaintenanceWindow, ManualClock, MemoryStore,
    PeriodicEvaluator, RequestGate, TimeValue, DEFAULT_ZONE,
};

fn at(hour: u32, minute: u32) -> chrono::DateTime<Tz> {
    DEFAULT_ZONE
        .with_ymd_and_hms(2026, 3, 14, hour, minute, 0)
        .unwrap()
}

fn instant(t: chrono::DateTime<Tz>) -> TimeValue {
    TimeValue::Instant(t.with_timezone(&Utc))
}

fn student() -> Caller {
    Caller {
        authenticated: true,
        role: "student".to_string(),
        id: "s2024".to_string(),
    }
}

fn exempt_admin() -> Caller {
    Caller {
        authenticated: true,
        role: "admin".to_string(),
        id: "t1000".to_string(),
    }
}

fn harness(
    window: MaintenanceWindow,
    now: chrono::DateTime<Tz>,
) -> (
    Arc<MemoryStore>,
    ManualClock,
    PeriodicEvaluator<Arc<MemoryStore>, ManualClock>,
    RequestGate<Arc<MemoryStore>, ManualClock>,
) {
    let store = Arc::new(MemoryStore::with_window(window));
    let clock = ManualClock::new(now);
    let evaluator = PeriodicEvaluator::new(
        store.clone(),
        clock.clone(),
        std::time::Duration::from_secs(5),
    );
    let gate = RequestGate::new(store.clone(), clock.clone(), ExemptionPolicy::default());
    (store, clock, evaluator, gate)
}

#[test]
fn idle_window_allows_every_request_and_every_tick_is_silent() {
    let (store, _clock, evaluator, gate) = harness(MaintenanceWindow::default(), at(12, 0));
    for route in ["dashboard", "attendance", "classes"] {
        assert_eq!(
            gate.evaluate_request(&student(), route).decision,
            GateDecision::Allow
        );
    }
    assert!(evaluator.evaluate_tick().unwrap().is_none());
    assert_eq!(store.snapshot().unwrap(), MaintenanceWindow::default());
}

#[test]
fn gate_activates_a_due_window_then_exempt_admin_still_passes() {
    // start = now - 1 minute, end = now + 59 minutes.
    let window = MaintenanceWindow {
        active: false,
        start_at: Some(instant(at(11, 59))),
        end_at: Some(instant(at(12, 59))),
        message: Some("midterm import".to_string()),
    };
    let (store, _clock, _evaluator, gate) = harness(window, at(12, 0));

    let blocked = gate.evaluate_request(&student(), "dashboard");
    assert!(matches!(
        blocked.decision,
        GateDecision::Deny {
            terminate_session: true,
            redirect_to: Some(_),
        }
    ));
    assert!(matches!(
        blocked.event,
        Some(Event::MaintenanceActivated { .. })
    ));
    assert!(store.snapshot().unwrap().active);

    let admin_pass = gate.evaluate_request(&exempt_admin(), "dashboard");
    assert_eq!(admin_pass.decision, GateDecision::Allow);
    assert!(admin_pass.event.is_none());
}

#[test]
fn evaluator_and_gate_converge_regardless_of_who_runs_first() {
    let window = MaintenanceWindow {
        active: false,
        start_at: Some(instant(at(11, 0))),
        end_at: Some(instant(at(13, 0))),
        message: None,
    };

    // Evaluator first.
    let (store_a, _c, evaluator_a, gate_a) = harness(window.clone(), at(12, 0));
    evaluator_a.evaluate_tick().unwrap();
    gate_a.evaluate_request(&student(), "dashboard");
    // Gate first.
    let (store_b, _c, evaluator_b, gate_b) = harness(window, at(12, 0));
    gate_b.evaluate_request(&student(), "dashboard");
    evaluator_b.evaluate_tick().unwrap();

    assert_eq!(store_a.snapshot(), store_b.snapshot());
    assert!(store_a.snapshot().unwrap().active);
}

#[test]
fn evaluator_clears_an_elapsed_window_and_requests_flow_again() {
    let window = MaintenanceWindow {
        active: true,
        start_at: Some(instant(at(10, 0))),
        end_at: Some(instant(at(11, 59))),
        message: Some("done".to_string()),
    };
    let (store, _clock, evaluator, gate) = harness(window, at(12, 0));

    let event = evaluator.evaluate_tick().unwrap();
    assert!(matches!(event, Some(Event::MaintenanceCleared { .. })));
    let persisted = store.snapshot().unwrap();
    assert!(!persisted.active);
    assert!(persisted.start_at.is_none() && persisted.end_at.is_none());

    assert_eq!(
        gate.evaluate_request(&student(), "dashboard").decision,
        GateDecision::Allow
    );
}

#[test]
fn full_lifecycle_under_an_advancing_clock() {
    let window = MaintenanceWindow {
        active: false,
        start_at: Some(instant(at(13, 0))),
        end_at: Some(instant(at(14, 0))),
        message: Some("term rollover".to_string()),
    };
    let (store, clock, evaluator, gate) = harness(window, at(12, 0));

    // Before the start: scheduled, requests pass.
    assert!(evaluator.evaluate_tick().unwrap().is_none());
    assert_eq!(
        gate.evaluate_request(&student(), "dashboard").decision,
        GateDecision::Allow
    );

    // Start elapsed: evaluator activates, gate blocks.
    clock.set(at(13, 1));
    assert!(matches!(
        evaluator.evaluate_tick().unwrap(),
        Some(Event::MaintenanceActivated { .. })
    ));
    assert!(matches!(
        gate.evaluate_request(&student(), "dashboard").decision,
        GateDecision::Deny { .. }
    ));

    // End elapsed: evaluator clears, gate allows.
    clock.set(at(14, 1));
    assert!(matches!(
        evaluator.evaluate_tick().unwrap(),
        Some(Event::MaintenanceCleared { .. })
    ));
    assert_eq!(
        gate.evaluate_request(&student(), "dashboard").decision,
        GateDecision::Allow
    );
    // The operator message survives for the next window.
    assert_eq!(
        store.snapshot().unwrap().message.as_deref(),
        Some("term rollover")
    );
}

#[test]
fn mixed_string_encodings_behave_like_instants() {
    let window = MaintenanceWindow {
        active: false,
        start_at: Some(TimeValue::Raw("2026-03-14T11:59".to_string())),
        end_at: Some(TimeValue::Raw("2026-03-14 12:59:00".to_string())),
        message: None,
    };
    let (store, clock, evaluator, _gate) = harness(window, at(12, 0));

    assert!(matches!(
        evaluator.evaluate_tick().unwrap(),
        Some(Event::MaintenanceActivated { .. })
    ));
    assert!(store.snapshot().unwrap().active);

    clock.set(at(13, 0));
    assert!(matches!(
        evaluator.evaluate_tick().unwrap(),
        Some(Event::MaintenanceCleared { .. })
    ));
}

#[test]
fn double_tick_and_double_gate_are_idempotent() {
    let window = MaintenanceWindow {
        active: false,
        start_at: Some(instant(at(11, 0))),
        end_at: Some(instant(at(13, 0))),
        message: None,
    };
    let (store, _clock, evaluator, gate) = harness(window, at(12, 0));

    evaluator.evaluate_tick().unwrap();
    let settled = store.snapshot();
    assert!(evaluator.evaluate_tick().unwrap().is_none());
    assert_eq!(store.snapshot(), settled);

    // A blocked request after activation mutates nothing further.
    let outcome = gate.evaluate_request(&student(), "dashboard");
    assert!(matches!(outcome.decision, GateDecision::Deny { .. }));
    assert!(outcome.event.is_none());
    assert_eq!(store.snapshot(), settled);
}

#[test]
fn store_outage_fails_open_for_requests_but_aborts_ticks() {
    let window = MaintenanceWindow {
        active: true,
        ..MaintenanceWindow::default()
    };
    let (store, _clock, evaluator, gate) = harness(window, at(12, 0));
    store.set_fail(true);

    assert_eq!(
        gate.evaluate_request(&student(), "dashboard").decision,
        GateDecision::Allow
    );
    assert!(evaluator.evaluate_tick().is_err());

    // Outage over: enforcement resumes on the next evaluation.
    store.set_fail(false);
    assert!(matches!(
        gate.evaluate_request(&student(), "dashboard").decision,
        GateDecision::Deny { .. }
    ));
}

#[test]
fn malformed_schedule_never_blocks_and_never_activates() {
    let window = MaintenanceWindow {
        active: false,
        start_at: Some(TimeValue::Raw("not-a-date".to_string())),
        end_at: Some(TimeValue::Raw("also-not-a-date".to_string())),
        message: None,
    };
    let (store, _clock, evaluator, gate) = harness(window.clone(), at(12, 0));

    assert!(evaluator.evaluate_tick().unwrap().is_none());
    assert_eq!(
        gate.evaluate_request(&student(), "dashboard").decision,
        GateDecision::Allow
    );
    // The malformed fields are preserved for an administrator to fix.
    assert_eq!(store.snapshot().unwrap(), window);
}

#[test]
fn stale_schedule_cleanup_races_cleanly() {
    let window = MaintenanceWindow {
        active: false,
        start_at: None,
        end_at: Some(instant(at(11, 0))),
        message: None,
    };
    let (store, _clock, evaluator, gate) = harness(window, at(12, 0));

    // Gate clears it on a passing request; the evaluator then sees a
    // settled window.
    let outcome = gate.evaluate_request(&student(), "dashboard");
    assert_eq!(outcome.decision, GateDecision::Allow);
    assert!(matches!(
        outcome.event,
        Some(Event::StaleScheduleCleared { .. })
    ));
    assert!(evaluator.evaluate_tick().unwrap().is_none());
    let persisted = store.snapshot().unwrap();
    assert!(persisted.end_at.is_none());
}

#[test]
fn admin_edit_with_inverted_instants_is_corrected_not_rejected() {
    let edited = MaintenanceWindow {
        active: false,
        start_at: Some(instant(at(13, 0))),
        end_at: Some(instant(at(12, 30))),
        message: None,
    }
    .prepared_for_write(DEFAULT_ZONE, Duration::minutes(60))
    .unwrap();

    let end = edited.end_at.unwrap().resolve(DEFAULT_ZONE).unwrap();
    assert_eq!(end, at(14, 0));
}
