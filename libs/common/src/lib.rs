//! Common library for the console application
//!
//! This crate provides shared functionality used by the identity and
//! provisioning services: the key-value persistence capability, the storage
//! error type, and application configuration.
//!
//! ```rust,no_run
//! use common::store::{MemoryStore, get_json, set_json};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     set_json(&store, "hasOwnerFlag", &true).await?;
//!     let flag: Option<bool> = get_json(&store, "hasOwnerFlag").await?;
//!     println!("has owner: {:?}", flag);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod store;

pub use config::{AppConfig, ProbeSettings};
pub use error::{StoreError, StoreResult};
pub use store::{FileStore, KeyValueStore, MemoryStore, keys};
