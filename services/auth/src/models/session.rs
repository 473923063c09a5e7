//! Session model

use serde::{Deserialize, Serialize};

use super::User;

/// The single active session of the process
///
/// Persisted as the bare user record under `currentSession`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    pub user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self { user }
    }
}
