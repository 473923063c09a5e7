//! Error types for the identity store

use common::StoreError;
use thiserror::Error;

use crate::models::Role;
use crate::validation::FieldErrors;

/// Message shown for every failed login, whatever the cause
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Message shown for unexpected faults
pub const FAULT_MESSAGE: &str = "An unexpected error occurred";

/// Errors returned by identity operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// Login attempted before any account exists
    #[error("No users have been provisioned")]
    NoUsersProvisioned,

    /// No account matches the email
    #[error("No user registered with the given email")]
    UserNotFound,

    /// Secret does not match the stored credential
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email is already in use: {email}")]
    DuplicateEmail { email: String },

    /// Role-creation policy violation
    #[error("Not allowed to create {role} accounts")]
    Forbidden { role: Role },

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Hashing or parsing a stored credential failed
    #[error("Credential error: {0}")]
    Credential(String),

    /// Corrupted persisted state or unavailable storage
    #[error("Storage fault: {0}")]
    Fault(#[from] StoreError),
}

impl AuthError {
    /// Unexpected faults, as opposed to expected failure modes
    pub fn is_fault(&self) -> bool {
        matches!(self, AuthError::Credential(_) | AuthError::Fault(_))
    }

    /// Failed login of any kind
    pub fn is_login_failure(&self) -> bool {
        matches!(
            self,
            AuthError::NoUsersProvisioned | AuthError::UserNotFound | AuthError::InvalidCredentials
        )
    }

    /// Text safe to show to the user
    ///
    /// Login failures share one message so callers cannot probe which emails exist.
    pub fn user_message(&self) -> String {
        match self {
            e if e.is_login_failure() => INVALID_CREDENTIALS_MESSAGE.to_string(),
            AuthError::DuplicateEmail { .. } => "Email is already in use.".to_string(),
            AuthError::Forbidden { role: Role::Owner } => {
                "Only owners can create other owner accounts".to_string()
            }
            AuthError::Forbidden { role } => {
                format!("You are not allowed to create {} accounts", role)
            }
            AuthError::Validation(errors) => errors.to_string(),
            _ => FAULT_MESSAGE.to_string(),
        }
    }
}

/// Type alias for identity results
pub type AuthResult<T> = Result<T, AuthError>;
