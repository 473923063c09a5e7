//! Database probe: the checks behind the provisioning state machine

use async_trait::async_trait;
use common::ProbeSettings;
use std::time::Duration;
use tracing::{debug, info};

use crate::models::DatabaseConfig;

/// Answers the questions the state machine asks about a target database
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    /// Is the database system installed on the target host
    async fn is_installed(&self, config: &DatabaseConfig) -> bool;

    /// Is the database server accepting connections
    async fn is_running(&self, config: &DatabaseConfig) -> bool;

    /// Do the supplied credentials authenticate
    async fn authenticates(&self, config: &DatabaseConfig) -> bool;

    /// Create the named database
    async fn create_database(&self, config: &DatabaseConfig) -> bool;
}

/// Probe that performs no I/O and answers from settings
///
/// Credentials authenticate whenever both username and password are set.
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    settings: ProbeSettings,
    latency: Duration,
    create_latency: Duration,
}

impl SimulatedProbe {
    pub fn new(settings: ProbeSettings) -> Self {
        Self {
            settings,
            latency: Duration::ZERO,
            create_latency: Duration::ZERO,
        }
    }

    /// Delay each check by `latency` and database creation by `create_latency`
    pub fn with_latency(mut self, latency: Duration, create_latency: Duration) -> Self {
        self.latency = latency;
        self.create_latency = create_latency;
        self
    }

    async fn delay(duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[async_trait]
impl DatabaseProbe for SimulatedProbe {
    async fn is_installed(&self, config: &DatabaseConfig) -> bool {
        Self::delay(self.latency).await;
        debug!("Installed check for {}: {}", config.host, self.settings.installed);
        self.settings.installed
    }

    async fn is_running(&self, config: &DatabaseConfig) -> bool {
        Self::delay(self.latency).await;
        debug!(
            "Running check for {}:{}: {}",
            config.host, config.port, self.settings.running
        );
        self.settings.running
    }

    async fn authenticates(&self, config: &DatabaseConfig) -> bool {
        Self::delay(self.latency).await;
        config.has_credentials()
    }

    async fn create_database(&self, config: &DatabaseConfig) -> bool {
        Self::delay(self.create_latency).await;
        if self.settings.creatable {
            info!("Database '{}' created", config.db_name);
        }
        self.settings.creatable
    }
}
