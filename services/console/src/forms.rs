//! Form-layer validation
//!
//! These checks run before anything reaches the identity or provisioning
//! services: required fields, the password length policy, confirmation
//! matching and the owner-only role choice.

use auth::validation::{validate_email, validate_password, validate_username};
use auth::{FieldErrors, NewUser, Role};
use provisioning::DatabaseConfig;

/// Database connection form
#[derive(Debug, Clone, Default)]
pub struct DatabaseSetupForm {
    pub config: DatabaseConfig,
}

impl DatabaseSetupForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.config.host.trim().is_empty() {
            errors.add("host", "Host is required");
        }
        if self.config.port == 0 {
            errors.add("port", "Port must be a positive number");
        }
        if self.config.db_name.trim().is_empty() {
            errors.add("dbName", "Database name is required");
        }
        errors.into_result()
    }
}

/// First owner registration form
#[derive(Debug, Clone, Default)]
pub struct RegisterOwnerForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterOwnerForm {
    pub fn validate(&self, min_password_length: usize) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_account_fields(
            &mut errors,
            &self.username,
            &self.email,
            &self.password,
            &self.confirm_password,
            min_password_length,
        );
        errors.into_result()
    }

    pub fn into_new_user(self) -> NewUser {
        NewUser {
            username: self.username,
            email: self.email,
            password: self.password,
            role: Role::Owner,
        }
    }
}

/// Login form
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.email.is_empty() {
            errors.add("email", "Please enter both email and password");
        }
        if self.password.is_empty() {
            errors.add("password", "Please enter both email and password");
        }
        errors.into_result()
    }
}

/// User management form
#[derive(Debug, Clone)]
pub struct CreateUserForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

impl Default for CreateUserForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            role: Role::Editor,
        }
    }
}

impl CreateUserForm {
    /// Validate on behalf of a requester holding `requester_role`
    pub fn validate(
        &self,
        min_password_length: usize,
        requester_role: Role,
    ) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_account_fields(
            &mut errors,
            &self.username,
            &self.email,
            &self.password,
            &self.confirm_password,
            min_password_length,
        );
        if self.role == Role::Owner && requester_role != Role::Owner {
            errors.add("role", "Only owners can create other owner accounts");
        }
        errors.into_result()
    }

    pub fn into_new_user(self) -> NewUser {
        NewUser {
            username: self.username,
            email: self.email,
            password: self.password,
            role: self.role,
        }
    }
}

fn check_account_fields(
    errors: &mut FieldErrors,
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
    min_password_length: usize,
) {
    errors.check("username", validate_username(username));
    errors.check("email", validate_email(email));
    errors.check("password", validate_password(password, min_password_length));
    if password != confirm_password {
        errors.add("confirmPassword", "Passwords do not match");
    }
}
