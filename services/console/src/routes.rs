//! Console routes and the roles allowed to enter them

use auth::{Access, Role, User, authorize};
use std::fmt;

use crate::error::{ConsoleError, ConsoleResult};

const ELEVATED: &[Role] = &[Role::Owner, Role::Admin];

/// Routes behind the login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Users,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Dashboard => "/dashboard",
            Route::Users => "/users",
        }
    }

    /// `None` admits any authenticated user
    pub fn allowed_roles(self) -> Option<&'static [Role]> {
        match self {
            Route::Dashboard => None,
            Route::Users => Some(ELEVATED),
        }
    }

    /// Whether `user` may enter; all or nothing
    pub fn access(self, user: Option<&User>) -> Access {
        authorize(user, self.allowed_roles())
    }

    /// Admit `user` or return the matching redirect as an error
    pub fn enter(self, user: Option<User>) -> ConsoleResult<User> {
        match (self.access(user.as_ref()), user) {
            (Access::Granted, Some(user)) => Ok(user),
            (Access::RedirectToDashboard, _) => Err(ConsoleError::AccessDenied(self)),
            _ => Err(ConsoleError::LoginRequired),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: Default::default(),
            username: "someone".to_string(),
            email: "someone@example.com".to_string(),
            role,
            created_at: Default::default(),
            created_by: None,
        }
    }

    #[test]
    fn test_users_route_requires_elevated_role() {
        assert!(matches!(
            Route::Users.enter(Some(user(Role::Owner))),
            Ok(_)
        ));
        assert!(matches!(
            Route::Users.enter(Some(user(Role::Admin))),
            Ok(_)
        ));
        assert!(matches!(
            Route::Users.enter(Some(user(Role::Editor))),
            Err(ConsoleError::AccessDenied(Route::Users))
        ));
        assert!(matches!(
            Route::Users.enter(None),
            Err(ConsoleError::LoginRequired)
        ));
    }

    #[test]
    fn test_dashboard_admits_any_user() {
        for role in Role::ALL {
            assert_eq!(Route::Dashboard.access(Some(&user(role))), Access::Granted);
        }
        assert_eq!(Route::Dashboard.access(None), Access::RedirectToLogin);
    }
}
