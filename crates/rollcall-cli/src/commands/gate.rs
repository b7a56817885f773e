use clap::Subcommand;
use rollcall_core::storage::{Config, Database};
use rollcall_core::{Caller, RequestGate, SystemClock};

#[derive(Subcommand)]
pub enum GateAction {
    /// Evaluate one request against the current window
    Check {
        /// Route identifier of the request
        #[arg(long)]
        route: String,
        /// Account id of the caller (empty for anonymous)
        #[arg(long, default_value = "")]
        user_id: String,
        /// Role of the caller
        #[arg(long, default_value = "")]
        role: String,
        /// Whether the caller holds an authenticated session
        #[arg(long)]
        authenticated: bool,
    },
    /// Print what the notice page would render
    Notice,
}

pub fn run(action: GateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let zone = config.maintenance.zone()?;
    let db = Database::open()?;
    let gate = RequestGate::new(
        db,
        SystemClock::new(zone),
        config.maintenance.exemption_policy(),
    )
    .with_routes(
        &config.maintenance.notice_route,
        config.maintenance.bypass_routes.clone(),
    );

    match action {
        GateAction::Check {
            route,
            user_id,
            role,
            authenticated,
        } => {
            let caller = Caller {
                authenticated,
                role,
                id: user_id,
            };
            let outcome = gate.evaluate_request(&caller, &route);
            println!("{}", serde_json::to_string_pretty(&outcome.decision)?);
            if let Some(event) = outcome.event {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
        GateAction::Notice => {
            let notice = gate.notice_content();
            println!("{}", serde_json::to_string_pretty(&notice)?);
        }
    }
    Ok(())
}
