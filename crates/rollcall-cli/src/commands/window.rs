use clap::Subcommand;
use rollcall_core::storage::{Config, Database, SettingsStore};
use rollcall_core::{Actor, Clock, Event, SystemClock, TimeValue};

#[derive(Subcommand)]
pub enum WindowAction {
    /// Print the current window state as JSON
    Status,
    /// Schedule a maintenance window
    Schedule {
        /// Start instant (YYYY-MM-DDTHH:MM, YYYY-MM-DD HH:MM:SS, or RFC 3339)
        #[arg(long)]
        start: Option<String>,
        /// End instant (same formats)
        #[arg(long)]
        end: Option<String>,
        /// Text shown to blocked users
        #[arg(long)]
        message: Option<String>,
    },
    /// Enforce maintenance immediately
    Enable,
    /// Stop enforcing (keeps any schedule)
    Disable,
    /// Clear the schedule and deactivate
    Cancel,
}

pub fn run(action: WindowAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let zone = config.maintenance.zone()?;
    let clock = SystemClock::new(zone);
    let db = Database::open()?;
    let mut window = db.load()?.unwrap_or_default();

    match action {
        WindowAction::Status => {
            let snapshot = window.snapshot(clock.now(), zone);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            return Ok(());
        }
        WindowAction::Schedule {
            start,
            end,
            message,
        } => {
            window.start_at = start.map(TimeValue::from);
            window.end_at = end.map(TimeValue::from);
            if message.is_some() {
                window.message = message;
            }
        }
        WindowAction::Enable => {
            window.active = true;
        }
        WindowAction::Disable => {
            window.active = false;
        }
        WindowAction::Cancel => {
            window.active = false;
            window.start_at = None;
            window.end_at = None;
        }
    }

    // Administrator path: malformed instants are fatal, an inverted end
    // is shifted forward instead of rejected.
    let prepared = window.prepared_for_write(zone, config.maintenance.default_window())?;
    db.save(&prepared)?;

    let updated = Event::WindowUpdated {
        actor: Actor::Admin,
        at: chrono::Utc::now(),
    };
    println!("{}", serde_json::to_string_pretty(&updated)?);
    println!(
        "{}",
        serde_json::to_string_pretty(&prepared.snapshot(clock.now(), zone))?
    );
    Ok(())
}
