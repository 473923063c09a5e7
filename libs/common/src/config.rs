//! Application configuration
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional `console.{toml,json,yaml}` file in the working directory, then
//! `CONSOLE_*` environment variables. Nested keys use a double underscore,
//! e.g. `CONSOLE_PROBE__RUNNING=false`.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{StoreError, StoreResult};

/// Answers given by the simulated database probe
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Whether the database system reports as installed
    pub installed: bool,
    /// Whether the database server reports as running
    pub running: bool,
    /// Whether creating a database succeeds
    pub creatable: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            installed: true,
            running: true,
            creatable: true,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding the persisted records
    pub store_path: PathBuf,
    /// Log filter directive (default: "info")
    pub log_level: String,
    /// Simulated latency of login, registration and status checks, in milliseconds
    pub latency_ms: u64,
    /// Simulated latency of database creation, in milliseconds
    pub create_latency_ms: u64,
    /// Minimum password length enforced by the forms
    pub min_password_length: usize,
    /// Simulated probe answers
    pub probe: ProbeSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(".console-data"),
            log_level: "info".to_string(),
            latency_ms: 500,
            create_latency_ms: 1000,
            min_password_length: 6,
            probe: ProbeSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional config file and environment variables
    ///
    /// # Environment Variables
    /// - `CONSOLE_STORE_PATH`: Directory for persisted records (default: ".console-data")
    /// - `CONSOLE_LOG_LEVEL`: Log filter (default: "info")
    /// - `CONSOLE_LATENCY_MS`: Simulated latency (default: 500)
    /// - `CONSOLE_CREATE_LATENCY_MS`: Simulated database creation latency (default: 1000)
    /// - `CONSOLE_MIN_PASSWORD_LENGTH`: Minimum password length (default: 6)
    /// - `CONSOLE_PROBE__INSTALLED`, `CONSOLE_PROBE__RUNNING`, `CONSOLE_PROBE__CREATABLE`:
    ///   Simulated probe answers (default: true)
    pub fn from_env() -> StoreResult<Self> {
        Self::load("console")
    }

    /// Layer `file` (extension optional, may be missing) and the environment over the defaults
    fn load(file: &str) -> StoreResult<Self> {
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("store_path", defaults.store_path.display().to_string())
            .and_then(|b| b.set_default("log_level", defaults.log_level))
            .and_then(|b| b.set_default("latency_ms", defaults.latency_ms as i64))
            .and_then(|b| b.set_default("create_latency_ms", defaults.create_latency_ms as i64))
            .and_then(|b| {
                b.set_default("min_password_length", defaults.min_password_length as i64)
            })
            .and_then(|b| b.set_default("probe.installed", defaults.probe.installed))
            .and_then(|b| b.set_default("probe.running", defaults.probe.running))
            .and_then(|b| b.set_default("probe.creatable", defaults.probe.creatable))
            .map_err(|e| StoreError::Configuration(e.to_string()))?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("CONSOLE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| StoreError::Configuration(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| StoreError::Configuration(e.to_string()))
    }

    /// Simulated latency for ordinary operations
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Simulated latency for database creation
    pub fn create_latency(&self) -> Duration {
        Duration::from_millis(self.create_latency_ms)
    }
}
