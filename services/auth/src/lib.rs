//! Identity store and session manager
//!
//! Owns the user registry, credential checks, the session of the process and
//! the role-based rules deciding who may create which account.

pub mod error;
pub mod guard;
pub mod identity;
pub mod models;
pub mod repositories;
pub mod session;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use guard::{Access, authorize};
pub use identity::IdentityStore;
pub use models::{NewUser, Role, Session, User};
pub use validation::FieldErrors;
