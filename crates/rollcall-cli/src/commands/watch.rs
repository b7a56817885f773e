use std::time::Duration;

use rollcall_core::storage::{Config, Database};
use rollcall_core::{PeriodicEvaluator, SystemClock};

pub fn run(interval_override: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let zone = config.maintenance.zone()?;
    let interval = interval_override
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| config.maintenance.interval());

    let db = Database::open()?;
    let evaluator = PeriodicEvaluator::new(db, SystemClock::new(zone), interval);

    println!(
        "evaluating maintenance window every {}s in {} (Ctrl-C to stop)",
        interval.as_secs(),
        zone
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(evaluator.run());
    Ok(())
}
