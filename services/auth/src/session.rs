//! Session management over the key-value store

use common::store::{KeyValueStore, get_json, keys, set_json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::AuthResult;
use crate::models::{Session, User};

/// Holds the single session of the process and its persisted record
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<Session>>,
}

impl SessionManager {
    /// Create a session manager, restoring any persisted session
    pub async fn restore(store: Arc<dyn KeyValueStore>) -> AuthResult<Self> {
        let current: Option<Session> = get_json(store.as_ref(), keys::CURRENT_SESSION).await?;
        if let Some(session) = &current {
            info!("Restored session for user: {}", session.user.id);
        }

        Ok(Self {
            store,
            current: RwLock::new(current),
        })
    }

    /// Replace the current session with one for `user`
    ///
    /// The record is persisted before the in-memory session changes, so a
    /// storage fault leaves the previous session in place. The write guard is
    /// held across both steps so the persisted record and the in-memory
    /// session always name the same user.
    pub async fn establish(&self, user: User) -> AuthResult<Session> {
        info!("Creating session for user: {}", user.id);

        let session = Session::new(user);
        let mut current = self.current.write().await;
        set_json(self.store.as_ref(), keys::CURRENT_SESSION, &session).await?;
        *current = Some(session.clone());

        Ok(session)
    }

    /// Get the current session
    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// Clear the session and its persisted record
    pub async fn clear(&self) -> AuthResult<()> {
        let mut current = self.current.write().await;
        self.store.delete(keys::CURRENT_SESSION).await?;
        if let Some(session) = current.take() {
            info!("Deleted session for user: {}", session.user.id);
        }
        Ok(())
    }
}
