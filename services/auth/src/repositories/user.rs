//! User repository: the registry and the credential table

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use common::store::{KeyValueStore, get_json, keys, set_json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AuthError, AuthResult};
use crate::models::User;

/// Credential table layout: user id to password hash
type CredentialTable = HashMap<String, String>;

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn KeyValueStore>,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All users in registration order
    pub async fn all(&self) -> AuthResult<Vec<User>> {
        let users: Option<Vec<User>> = get_json(self.store.as_ref(), keys::USER_REGISTRY).await?;
        Ok(users.unwrap_or_default())
    }

    /// Append a user and store its credential
    ///
    /// The caller is responsible for serializing calls; this does not check
    /// for duplicates. The credential is written first and rolled back if the
    /// registry write fails.
    pub async fn insert(&self, user: &User, password: &str) -> AuthResult<()> {
        info!("Storing new user: {}", user.username);

        let password_hash = hash_password(password)?;

        let mut users = self.all().await?;
        let mut credentials = self.credentials().await?;
        credentials.insert(user.id.to_string(), password_hash);
        set_json(self.store.as_ref(), keys::CREDENTIAL_TABLE, &credentials).await?;

        users.push(user.clone());
        if let Err(e) = set_json(self.store.as_ref(), keys::USER_REGISTRY, &users).await {
            credentials.remove(&user.id.to_string());
            if let Err(rollback) =
                set_json(self.store.as_ref(), keys::CREDENTIAL_TABLE, &credentials).await
            {
                warn!(
                    "Failed to roll back credential for {}: {}",
                    user.id, rollback
                );
            }
            return Err(e.into());
        }

        Ok(())
    }

    /// Verify a user's password
    ///
    /// Returns `Ok(false)` for a wrong password and for a user with no stored
    /// credential.
    pub async fn verify_password(&self, user: &User, password: &str) -> AuthResult<bool> {
        let credentials = self.credentials().await?;
        let Some(stored) = credentials.get(&user.id.to_string()) else {
            warn!("No credential stored for user {}", user.id);
            return Ok(false);
        };

        let parsed_hash = PasswordHash::new(stored)
            .map_err(|e| AuthError::Credential(format!("Failed to parse password hash: {}", e)))?;

        let argon2 = Argon2::default();
        let result = argon2.verify_password(password.as_bytes(), &parsed_hash);

        Ok(result.is_ok())
    }

    async fn credentials(&self) -> AuthResult<CredentialTable> {
        let table: Option<CredentialTable> =
            get_json(self.store.as_ref(), keys::CREDENTIAL_TABLE).await?;
        Ok(table.unwrap_or_default())
    }
}

/// Hash a password with a fresh salt
fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Credential(format!("Failed to hash password: {}", e)))
}
