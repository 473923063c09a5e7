//! Provisioning models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection settings of the application database
///
/// Replaced wholesale on reconfiguration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub db_name: String,
}

impl DatabaseConfig {
    /// Both username and password are filled in
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            username: String::new(),
            password: String::new(),
            db_name: "projectmanager".to_string(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("db_name", &self.db_name)
            .finish()
    }
}

/// Result of the most recent status check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionStatus {
    /// A check is in progress
    Checking,
    NotInstalled,
    NotRunning,
    NotConnected,
    Connected,
}

impl ConnectionStatus {
    /// Statuses that make connecting or creating pointless until fixed on the host
    pub fn blocks_setup(self) -> bool {
        matches!(
            self,
            ConnectionStatus::NotInstalled | ConnectionStatus::NotRunning
        )
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionStatus::Connected
    }

    /// Human-readable description for status displays
    pub fn describe(self) -> &'static str {
        match self {
            ConnectionStatus::Checking => "Checking database status...",
            ConnectionStatus::NotInstalled => "Database system is not installed",
            ConnectionStatus::NotRunning => "Database server is not running",
            ConnectionStatus::NotConnected => "Not connected to the database",
            ConnectionStatus::Connected => "Connected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionStatus::Checking => "checking",
            ConnectionStatus::NotInstalled => "not-installed",
            ConnectionStatus::NotRunning => "not-running",
            ConnectionStatus::NotConnected => "not-connected",
            ConnectionStatus::Connected => "connected",
        };
        f.write_str(name)
    }
}
