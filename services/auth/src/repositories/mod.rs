//! Repositories over the key-value store

pub mod user;

pub use user::UserRepository;
