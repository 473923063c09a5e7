//! Database provisioning
//!
//! Tracks the lifecycle of the application database configuration and runs
//! the installed / running / authenticated check sequence that decides the
//! connection status.

pub mod error;
pub mod models;
pub mod probe;
pub mod service;

pub use error::{ProvisioningError, ProvisioningResult};
pub use models::{ConnectionStatus, DatabaseConfig};
pub use probe::{DatabaseProbe, SimulatedProbe};
pub use service::ProvisioningService;
