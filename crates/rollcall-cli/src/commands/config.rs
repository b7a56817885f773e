use clap::Subcommand;
use rollcall_core::parse_timestamp;
use rollcall_core::storage::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Set the reference timezone (IANA name)
    SetTimezone { name: String },
    /// Set the evaluator interval in seconds
    SetInterval { seconds: u64 },
    /// Add an account id to the exemption allow-list
    AllowId { id: String },
    /// Remove an account id from the exemption allow-list
    DisallowId { id: String },
    /// Parse a timestamp the way the core would (for debugging schedules)
    ParseTime { value: String },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;

    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(&config)?);
            return Ok(());
        }
        ConfigAction::SetTimezone { name } => {
            // Validate before persisting.
            rollcall_core::clock::parse_zone(&name)?;
            config.maintenance.timezone = name;
        }
        ConfigAction::SetInterval { seconds } => {
            config.maintenance.evaluator_interval_secs = seconds.max(1);
        }
        ConfigAction::AllowId { id } => {
            if !config.maintenance.exempt_ids.contains(&id) {
                config.maintenance.exempt_ids.push(id);
            }
        }
        ConfigAction::DisallowId { id } => {
            config.maintenance.exempt_ids.retain(|existing| existing != &id);
        }
        ConfigAction::ParseTime { value } => {
            let zone = config.maintenance.zone()?;
            let instant = parse_timestamp(&value, zone)?;
            println!("{}", instant.to_rfc3339());
            return Ok(());
        }
    }

    config.save()?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
