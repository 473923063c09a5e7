//! Administrative console
//!
//! Wires the identity store and the provisioning state machine to a single
//! key-value store and exposes the bootstrap flow (database setup, first
//! owner, login) plus user management behind role-gated routes.

pub mod error;
pub mod forms;
pub mod routes;
pub mod state;
pub mod view;

pub use error::{ConsoleError, ConsoleResult};
pub use routes::Route;
pub use state::{AppState, Dashboard, SetupMode};
pub use view::View;
