//! Route-level capability gate

use tracing::warn;

use crate::models::{Role, User};

/// Outcome of a capability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Nobody is logged in
    RedirectToLogin,
    /// Logged in, but the role is not in the allowed set
    RedirectToDashboard,
}

/// Check `user` against a route's allowed roles
///
/// `None` means any authenticated user may enter.
pub fn authorize(user: Option<&User>, allowed_roles: Option<&[Role]>) -> Access {
    let Some(user) = user else {
        return Access::RedirectToLogin;
    };

    match allowed_roles {
        Some(roles) if !roles.contains(&user.role) => {
            warn!(
                "User {} with role {} denied access (requires one of {:?})",
                user.id, user.role, roles
            );
            Access::RedirectToDashboard
        }
        _ => Access::Granted,
    }
}
