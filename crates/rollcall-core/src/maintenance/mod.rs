mod evaluator;
mod exemption;
mod gate;
mod window;

pub use evaluator::{PeriodicEvaluator, DEFAULT_INTERVAL};
pub use exemption::ExemptionPolicy;
pub use gate::{
    Caller, GateDecision, GateOutcome, NoticeContent, RequestGate, BYPASS_ROUTES, ROUTE_LOGIN,
    ROUTE_LOGOUT, ROUTE_NOTICE, ROUTE_STATIC,
};
pub use window::{plan_transition, MaintenanceWindow, WindowChange, WindowPhase};
