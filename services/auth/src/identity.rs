//! Identity store: registration, login and the session of the process

use chrono::Utc;
use common::store::{KeyValueStore, get_json, keys, set_json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::models::{NewUser, Role, Session, User};
use crate::repositories::UserRepository;
use crate::session::SessionManager;
use crate::validation::validate_new_user;

/// Owns the user registry, the credential table and the session
pub struct IdentityStore {
    store: Arc<dyn KeyValueStore>,
    users: UserRepository,
    sessions: SessionManager,
    /// Serializes registrations so the duplicate check and the append commit together
    registry_lock: Mutex<()>,
    latency: Duration,
}

impl IdentityStore {
    /// Open the identity store, restoring any persisted session
    pub async fn load(store: Arc<dyn KeyValueStore>, latency: Duration) -> AuthResult<Self> {
        let sessions = SessionManager::restore(store.clone()).await?;
        Ok(Self {
            users: UserRepository::new(store.clone()),
            store,
            sessions,
            registry_lock: Mutex::new(()),
            latency,
        })
    }

    /// Log in with email and secret
    ///
    /// A failed attempt leaves any existing session untouched.
    pub async fn authenticate(&self, email: &str, secret: &str) -> AuthResult<Session> {
        info!("Login attempt for: {}", email);
        self.simulate_latency().await;

        let result = self.check_credentials(email, secret).await;
        let user = match result {
            Ok(user) => user,
            Err(e) => {
                log_failure("Login", &e);
                return Err(e);
            }
        };

        let session = self.sessions.establish(user).await.inspect_err(|e| {
            error!("Failed to persist session: {}", e);
        })?;
        info!("Login successful for user: {}", session.user.id);
        Ok(session)
    }

    async fn check_credentials(&self, email: &str, secret: &str) -> AuthResult<User> {
        let users = self.users.all().await?;
        if users.is_empty() {
            return Err(AuthError::NoUsersProvisioned);
        }

        let user = users
            .into_iter()
            .find(|u| u.email == email)
            .ok_or(AuthError::UserNotFound)?;

        if !self.users.verify_password(&user, secret).await? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Log out. Safe to call with no active session.
    pub async fn end_session(&self) -> AuthResult<()> {
        self.sessions.clear().await.inspect_err(|e| {
            error!("Failed to clear session: {}", e);
        })?;
        info!("Logged out");
        Ok(())
    }

    /// Register a new account on behalf of `requester`
    ///
    /// The first account of an empty registry may be an owner created by
    /// anyone. After that, owners are created only by owners, and admin or
    /// editor accounts only by owners and admins. The requester's role is
    /// read back from the registry rather than trusted from the argument.
    pub async fn register_user(
        &self,
        candidate: NewUser,
        requester: Option<&User>,
    ) -> AuthResult<User> {
        info!(
            "Registering {} account: {}",
            candidate.role, candidate.username
        );
        self.simulate_latency().await;

        let result = self.register_locked(candidate, requester).await;
        match &result {
            Ok(user) => info!("User {} created successfully", user.username),
            Err(e) => log_failure("Registration", e),
        }
        result
    }

    async fn register_locked(
        &self,
        candidate: NewUser,
        requester: Option<&User>,
    ) -> AuthResult<User> {
        validate_new_user(&candidate).map_err(AuthError::Validation)?;

        let _guard = self.registry_lock.lock().await;
        let users = self.users.all().await?;

        let verified_requester = requester.and_then(|r| users.iter().find(|u| u.id == r.id));
        let bootstrap = users.is_empty() && candidate.role == Role::Owner;
        let permitted = bootstrap
            || verified_requester.is_some_and(|r| r.role.may_create(candidate.role));
        if !permitted {
            return Err(AuthError::Forbidden {
                role: candidate.role,
            });
        }

        if users.iter().any(|u| u.email == candidate.email) {
            return Err(AuthError::DuplicateEmail {
                email: candidate.email,
            });
        }

        let user = User {
            id: Uuid::new_v4(),
            username: candidate.username.trim().to_string(),
            email: candidate.email,
            role: candidate.role,
            created_at: Utc::now(),
            created_by: verified_requester.map(|r| r.id),
        };
        self.users.insert(&user, &candidate.password).await?;

        if user.role == Role::Owner && !self.owner_flag().await? {
            info!("First owner account created: {}", user.id);
            set_json(self.store.as_ref(), keys::HAS_OWNER_FLAG, &true).await?;
        }

        Ok(user)
    }

    /// All users, in registration order
    pub async fn list_users(&self) -> AuthResult<Vec<User>> {
        self.users.all().await
    }

    /// The logged-in user, if any
    pub async fn current_user(&self) -> Option<User> {
        self.sessions.current().await.map(|s| s.user)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.sessions.current().await.is_some()
    }

    /// Whether the first owner has been created. Once set, never cleared.
    ///
    /// An owner in the registry counts even when the flag write was lost, so
    /// the installation can still move on to login.
    pub async fn has_owner(&self) -> AuthResult<bool> {
        if self.owner_flag().await? {
            return Ok(true);
        }

        let users = self.users.all().await?;
        let found = users.iter().any(|u| u.role == Role::Owner);
        if found {
            warn!("Owner present in registry but {} is unset", keys::HAS_OWNER_FLAG);
        }
        Ok(found)
    }

    async fn owner_flag(&self) -> AuthResult<bool> {
        let flag: Option<bool> = get_json(self.store.as_ref(), keys::HAS_OWNER_FLAG).await?;
        Ok(flag.unwrap_or(false))
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn log_failure(operation: &str, e: &AuthError) {
    match e {
        AuthError::NoUsersProvisioned => warn!("{} rejected: no users provisioned yet", operation),
        AuthError::UserNotFound => debug!("{} rejected: unknown email", operation),
        e if e.is_fault() => error!("{} failed: {}", operation, e),
        e => warn!("{} rejected: {}", operation, e),
    }
}
