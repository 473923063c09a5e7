//! Custom error types for the console

use auth::{AuthError, FieldErrors};
use common::StoreError;
use provisioning::ProvisioningError;
use thiserror::Error;

use crate::routes::Route;
use crate::view::View;

/// Custom error type for console operations
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Form input rejected before reaching the core
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Nobody is logged in
    #[error("Login required")]
    LoginRequired,

    /// Logged in without a role the route allows
    #[error("Access denied to {0}")]
    AccessDenied(Route),

    /// The operation belongs to a different bootstrap stage
    #[error("Operation not available while the console shows {current:?}")]
    WrongStage { current: View },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error("Storage fault: {0}")]
    Store(#[from] StoreError),
}

impl ConsoleError {
    /// Unexpected faults, as opposed to expected failure modes
    pub fn is_fault(&self) -> bool {
        match self {
            ConsoleError::Auth(e) => e.is_fault(),
            ConsoleError::Provisioning(e) => e.is_fault(),
            ConsoleError::Store(_) => true,
            _ => false,
        }
    }

    /// Text safe to show to the user
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Validation(errors) => errors.to_string(),
            ConsoleError::LoginRequired => "Please log in to continue".to_string(),
            ConsoleError::AccessDenied(route) => {
                format!("You do not have access to {}", route.path())
            }
            ConsoleError::WrongStage { current } => {
                format!("Not available right now: {}", current.describe())
            }
            ConsoleError::Auth(e) => e.user_message(),
            ConsoleError::Provisioning(e) => e.user_message(),
            ConsoleError::Store(_) => "An unexpected error occurred".to_string(),
        }
    }
}

/// Type alias for console results
pub type ConsoleResult<T> = Result<T, ConsoleError>;
