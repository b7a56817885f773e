//! # Rollcall Core Library
//!
//! This library provides the maintenance-mode core for Rollcall, a
//! student-attendance administration system. It implements a CLI-first
//! philosophy where all operations are available via a standalone CLI
//! binary, with any web front end being a thin layer over the same core.
//!
//! ## Architecture
//!
//! - **Maintenance window**: a singleton persisted record (flag, optional
//!   start/end instants, operator message) that is never deleted
//! - **Periodic evaluator**: a level-triggered fixed-interval task that
//!   re-derives window state from `now` and the persisted fields alone
//! - **Request gate**: a per-request decision (allow, or block with
//!   session termination and redirect) sharing the evaluator's transition
//!   planner, so the two racing actors converge by construction
//! - **Storage**: SQLite settings row and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`MaintenanceWindow`]: the persisted window and transition planner
//! - [`PeriodicEvaluator`]: background activation/deactivation
//! - [`RequestGate`]: inline enforcement with an exemption policy
//! - [`TimeValue`]: heterogeneous timestamp normalization into one
//!   reference timezone
//! - [`Database`] / [`Config`]: persistence and configuration

pub mod clock;
pub mod error;
pub mod events;
pub mod maintenance;
pub mod storage;

pub use clock::{parse_timestamp, Clock, ManualClock, SystemClock, TimeValue, DEFAULT_ZONE};
pub use error::{ConfigError, CoreError, StoreError, TimestampError};
pub use events::{Actor, Event};
pub use maintenance::{
    plan_transition, Caller, ExemptionPolicy, GateDecision, GateOutcome, MaintenanceWindow,
    NoticeContent, PeriodicEvaluator, RequestGate, WindowChange, WindowPhase,
};
pub use storage::{Config, Database, MaintenanceConfig, MemoryStore, SettingsStore};
