//! Periodic maintenance evaluator.
//!
//! A singleton background task on a fixed short interval, independent of
//! request traffic. Each tick re-derives the window state from `now` and
//! the persisted fields alone -- the evaluator is level-triggered, not
//! edge-triggered, so any number of missed ticks is recovered by the next
//! tick that runs. There is no catch-up queue.
//!
//! A failed tick (parse failure, persistence failure) is logged and
//! abandoned with no partial state; the next tick retries from scratch.

use std::time::Duration;

use chrono::Utc;

use super::window::{plan_transition, WindowChange};
use crate::clock::Clock;
use crate::error::CoreError;
use crate::events::{Actor, Event};
use crate::storage::SettingsStore;

/// Default tick interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Fixed-interval evaluator over the shared settings store.
///
/// `evaluate_tick` is synchronous and caller-driven, like a timer engine
/// tick; [`PeriodicEvaluator::run`] wraps it in a tokio interval loop for
/// production use.
pub struct PeriodicEvaluator<S, C> {
    store: S,
    clock: C,
    interval: Duration,
}

impl<S: SettingsStore, C: Clock> PeriodicEvaluator<S, C> {
    pub fn new(store: S, clock: C, interval: Duration) -> Self {
        Self {
            store,
            clock,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One evaluation pass: load, plan, persist.
    ///
    /// Returns the state-change event if a transition fired, `None` when
    /// the window is absent or already settled. Applying a tick twice
    /// with no elapsed time produces the same persisted state as once.
    ///
    /// # Errors
    /// Propagates store failures to the caller; `run` logs them and
    /// abandons the tick.
    pub fn evaluate_tick(&self) -> Result<Option<Event>, CoreError> {
        let Some(window) = self.store.load()? else {
            return Ok(None);
        };
        let now = self.clock.now();
        let Some(change) = plan_transition(&window, now, self.clock.zone()) else {
            return Ok(None);
        };
        let next = window.with_change(change);
        self.store.save(&next)?;
        let event = match change {
            WindowChange::Activate => {
                tracing::info!("maintenance window activated");
                Event::MaintenanceActivated {
                    actor: Actor::Evaluator,
                    at: Utc::now(),
                }
            }
            WindowChange::Clear => {
                tracing::info!("maintenance window cleared");
                Event::MaintenanceCleared {
                    actor: Actor::Evaluator,
                    at: Utc::now(),
                }
            }
            WindowChange::ClearStale => {
                tracing::debug!("stale maintenance schedule cleared");
                Event::StaleScheduleCleared {
                    actor: Actor::Evaluator,
                    at: Utc::now(),
                }
            }
        };
        Ok(Some(event))
    }

    /// Run the fixed-interval loop until the future is dropped.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        // Level-triggered: after a stall, one tick now beats a burst of
        // stale ones.
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(err) = self.evaluate_tick() {
                tracing::warn!(%err, "maintenance tick abandoned");
            }
        }
    }
}
