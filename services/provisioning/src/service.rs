//! Provisioning state machine

use common::store::{KeyValueStore, get_json, keys, set_json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::error::{ProvisioningError, ProvisioningResult};
use crate::models::{ConnectionStatus, DatabaseConfig};
use crate::probe::DatabaseProbe;

/// Owns the accepted database configuration and the connection status
pub struct ProvisioningService {
    store: Arc<dyn KeyValueStore>,
    probe: Arc<dyn DatabaseProbe>,
    status: RwLock<ConnectionStatus>,
    accepted: RwLock<Option<DatabaseConfig>>,
}

impl ProvisioningService {
    /// Restore the accepted configuration, if any
    ///
    /// The initial status is `Checking` when a configuration was persisted and
    /// `NotConnected` otherwise. No check runs until one is requested.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        probe: Arc<dyn DatabaseProbe>,
    ) -> ProvisioningResult<Self> {
        let accepted: Option<DatabaseConfig> = get_json(store.as_ref(), keys::DATABASE_CONFIG)
            .await
            .inspect_err(|e| error!("Failed to load database configuration: {}", e))?;

        let status = match &accepted {
            Some(config) => {
                info!(
                    "Restored database configuration for {}:{}/{}",
                    config.host, config.port, config.db_name
                );
                ConnectionStatus::Checking
            }
            None => ConnectionStatus::NotConnected,
        };

        Ok(Self {
            store,
            probe,
            status: RwLock::new(status),
            accepted: RwLock::new(accepted),
        })
    }

    /// Run the full check sequence against `config`
    ///
    /// Always starts from the first step and stops at the first failing one.
    pub async fn check_status(&self, config: &DatabaseConfig) -> ConnectionStatus {
        self.set_status(ConnectionStatus::Checking).await;

        let status = if !self.probe.is_installed(config).await {
            ConnectionStatus::NotInstalled
        } else if !self.probe.is_running(config).await {
            ConnectionStatus::NotRunning
        } else if !self.probe.authenticates(config).await {
            ConnectionStatus::NotConnected
        } else {
            ConnectionStatus::Connected
        };

        info!(
            "Database status for {}:{}/{}: {}",
            config.host, config.port, config.db_name, status
        );
        self.set_status(status).await;
        status
    }

    /// Check `config` and accept it if the check connects
    ///
    /// Returns `false` when the check settles short of connected. On failure
    /// the previously accepted configuration stays in place.
    pub async fn connect(&self, config: DatabaseConfig) -> ProvisioningResult<bool> {
        refusal_as_false(self.try_connect(config).await)
    }

    /// Like [`connect`](Self::connect), reporting why the configuration was refused
    pub async fn try_connect(&self, config: DatabaseConfig) -> ProvisioningResult<()> {
        let status = self.check_status(&config).await;
        if !status.is_connected() {
            warn!("Failed to connect to the database: {}", status);
            return Err(ProvisioningError::ConnectionRefused { status });
        }

        // The in-memory copy follows the persisted record, not the flag
        let mut accepted = self.accepted.write().await;
        set_json(self.store.as_ref(), keys::DATABASE_CONFIG, &config)
            .await
            .inspect_err(|e| error!("Failed to persist database configuration: {}", e))?;
        *accepted = Some(config);
        drop(accepted);

        set_json(self.store.as_ref(), keys::IS_CONFIGURED_FLAG, &true)
            .await
            .inspect_err(|e| error!("Failed to persist configured flag: {}", e))?;

        info!("Successfully connected to database");
        Ok(())
    }

    /// Create the named database, then connect to it
    ///
    /// Returns `false` without connecting when creation fails.
    pub async fn create(&self, config: DatabaseConfig) -> ProvisioningResult<bool> {
        refusal_as_false(self.try_create(config).await)
    }

    /// Like [`create`](Self::create), reporting why setup failed
    pub async fn try_create(&self, config: DatabaseConfig) -> ProvisioningResult<()> {
        info!("Creating database '{}'", config.db_name);
        if !self.probe.create_database(&config).await {
            warn!("Failed to create database '{}'", config.db_name);
            return Err(ProvisioningError::CreateFailed {
                db_name: config.db_name,
            });
        }

        self.try_connect(config).await
    }

    /// Status of the most recent check
    pub async fn current_status(&self) -> ConnectionStatus {
        *self.status.read().await
    }

    /// Re-check the accepted configuration
    pub async fn check_connection(&self) -> ConnectionStatus {
        let accepted = self.accepted.read().await.clone();
        match accepted {
            Some(config) => self.check_status(&config).await,
            None => {
                self.set_status(ConnectionStatus::NotConnected).await;
                ConnectionStatus::NotConnected
            }
        }
    }

    /// Re-check the accepted configuration, failing unless it connects
    pub async fn require_connected(&self) -> ProvisioningResult<()> {
        match self.check_connection().await {
            ConnectionStatus::Connected => Ok(()),
            status => Err(ProvisioningError::ConnectionRefused { status }),
        }
    }

    /// The accepted configuration, if any
    pub async fn config(&self) -> Option<DatabaseConfig> {
        self.accepted.read().await.clone()
    }

    /// Whether a configuration has ever been accepted. Once set, never cleared.
    ///
    /// An accepted configuration counts even when the flag write was lost.
    pub async fn is_configured(&self) -> ProvisioningResult<bool> {
        let flag: Option<bool> = get_json(self.store.as_ref(), keys::IS_CONFIGURED_FLAG).await?;
        Ok(flag.unwrap_or(false) || self.accepted.read().await.is_some())
    }

    async fn set_status(&self, status: ConnectionStatus) {
        *self.status.write().await = status;
    }
}

/// Expected refusals become `false`, faults pass through
fn refusal_as_false(result: ProvisioningResult<()>) -> ProvisioningResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_fault() => Err(e),
        Err(_) => Ok(false),
    }
}
