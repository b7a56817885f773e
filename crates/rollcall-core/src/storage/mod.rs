mod config;
pub mod database;

pub use config::{Config, MaintenanceConfig};
pub use database::{Database, MemoryStore, SettingsStore};

use std::path::PathBuf;

/// Returns `~/.config/rollcall[-dev]/` based on ROLLCALL_ENV.
///
/// Set ROLLCALL_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ROLLCALL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("rollcall-dev")
    } else {
        base_dir.join("rollcall")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
