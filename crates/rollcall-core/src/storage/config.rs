//! TOML-based application configuration.
//!
//! Stores deployment facts for the maintenance core:
//! - Reference timezone (IANA name)
//! - Evaluator interval
//! - Fallback window length for the end-shift correction
//! - Notice route and bypass routes
//! - Exemption constants (privileged role, allow-list, id suffix)
//!
//! Configuration is stored at `~/.config/rollcall/config.toml`.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock::parse_zone;
use crate::error::ConfigError;
use crate::maintenance::{ExemptionPolicy, BYPASS_ROUTES, ROUTE_NOTICE};

use super::data_dir;

/// Maintenance-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// IANA name of the timezone all window comparisons use.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_interval_secs")]
    pub evaluator_interval_secs: u64,
    /// Window length applied when a write carries end_at <= start_at.
    #[serde(default = "default_window_minutes")]
    pub default_window_minutes: u64,
    #[serde(default = "default_notice_route")]
    pub notice_route: String,
    /// Routes that stay reachable during enforcement.
    #[serde(default = "default_bypass_routes")]
    pub bypass_routes: Vec<String>,
    /// Role required for exemption.
    #[serde(default = "default_privileged_role")]
    pub privileged_role: String,
    /// Account ids that are always exempt (with the privileged role).
    #[serde(default)]
    pub exempt_ids: Vec<String>,
    /// Trailing digit marking built-in operator accounts.
    #[serde(default = "default_exempt_suffix")]
    pub exempt_id_suffix: char,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/rollcall/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

// Default functions
fn default_timezone() -> String {
    crate::clock::DEFAULT_ZONE.name().to_string()
}
fn default_interval_secs() -> u64 {
    5
}
fn default_window_minutes() -> u64 {
    60
}
fn default_notice_route() -> String {
    ROUTE_NOTICE.to_string()
}
fn default_bypass_routes() -> Vec<String> {
    BYPASS_ROUTES.iter().map(ToString::to_string).collect()
}
fn default_privileged_role() -> String {
    "admin".to_string()
}
fn default_exempt_suffix() -> char {
    '0'
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            evaluator_interval_secs: default_interval_secs(),
            default_window_minutes: default_window_minutes(),
            notice_route: default_notice_route(),
            bypass_routes: default_bypass_routes(),
            privileged_role: default_privileged_role(),
            exempt_ids: Vec::new(),
            exempt_id_suffix: default_exempt_suffix(),
        }
    }
}

impl MaintenanceConfig {
    /// Resolve the configured timezone.
    ///
    /// # Errors
    /// Returns an error for unknown zone names.
    pub fn zone(&self) -> Result<Tz, ConfigError> {
        parse_zone(&self.timezone)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.evaluator_interval_secs.max(1))
    }

    pub fn default_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.default_window_minutes.max(1) as i64)
    }

    /// Build the exemption policy from the configured constants.
    pub fn exemption_policy(&self) -> ExemptionPolicy {
        ExemptionPolicy {
            privileged_role: self.privileged_role.clone(),
            allow_list: self.exempt_ids.clone(),
            id_suffix: self.exempt_id_suffix,
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/rollcall"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning the default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
