//! Error types for provisioning

use common::StoreError;
use thiserror::Error;

use crate::models::ConnectionStatus;

#[derive(Error, Debug)]
pub enum ProvisioningError {
    /// A status check settled short of connected
    #[error("Database connection refused: {status}")]
    ConnectionRefused { status: ConnectionStatus },

    /// The database could not be created
    #[error("Failed to create database '{db_name}'")]
    CreateFailed { db_name: String },

    /// Corrupted persisted configuration or unavailable storage
    #[error("Storage fault: {0}")]
    Fault(#[from] StoreError),
}

impl ProvisioningError {
    pub fn is_fault(&self) -> bool {
        matches!(self, ProvisioningError::Fault(_))
    }

    /// Text safe to show to the user
    pub fn user_message(&self) -> String {
        match self {
            ProvisioningError::ConnectionRefused { status } => status.describe().to_string(),
            ProvisioningError::CreateFailed { db_name } => {
                format!("Failed to create database '{}'", db_name)
            }
            ProvisioningError::Fault(_) => "An unexpected error occurred".to_string(),
        }
    }
}

/// Type alias for provisioning results
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;
