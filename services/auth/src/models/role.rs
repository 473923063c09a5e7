//! Role model and the account-creation policy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Editor,
}

impl Role {
    /// All roles, most privileged first
    pub const ALL: [Role; 3] = [Role::Owner, Role::Admin, Role::Editor];

    /// Owners and admins manage other accounts
    pub fn is_elevated(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }

    /// Whether a user holding `self` may create an account with role `target`
    ///
    /// Only owners may mint owners. Admin and editor accounts can be created
    /// by any elevated user. Editors create nothing.
    pub fn may_create(self, target: Role) -> bool {
        match target {
            Role::Owner => self == Role::Owner,
            Role::Admin | Role::Editor => self.is_elevated(),
        }
    }

    /// Roles a requester may pick when creating an account
    pub fn assignable_by(requester: Role) -> Vec<Role> {
        Self::ALL
            .into_iter()
            .filter(|target| requester.may_create(*target))
            .collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Editor => "editor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}
