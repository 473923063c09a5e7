//! Application state: both core services wired to one store

use auth::{IdentityStore, Role, Session, User};
use common::{AppConfig, KeyValueStore};
use provisioning::{
    ConnectionStatus, DatabaseConfig, DatabaseProbe, ProvisioningService, SimulatedProbe,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{ConsoleError, ConsoleResult};
use crate::forms::{CreateUserForm, DatabaseSetupForm, LoginForm, RegisterOwnerForm};
use crate::routes::Route;
use crate::view::View;

/// How the database setup form is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupMode {
    /// Connect to an existing database
    Connect,
    /// Create the database, then connect
    Create,
}

/// Everything the dashboard shows
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub user: User,
    pub database: Option<DatabaseConfig>,
    pub status: ConnectionStatus,
    pub can_manage_users: bool,
    pub assignable_roles: Vec<Role>,
}

/// Application state shared across the console
pub struct AppState {
    config: AppConfig,
    identity: IdentityStore,
    provisioning: ProvisioningService,
}

impl AppState {
    /// Build the application on `store` with the simulated probe from `config`
    pub async fn load(store: Arc<dyn KeyValueStore>, config: AppConfig) -> ConsoleResult<Self> {
        let probe = SimulatedProbe::new(config.probe.clone())
            .with_latency(config.latency(), config.create_latency());
        Self::with_probe(store, config, Arc::new(probe)).await
    }

    /// Build the application with a specific probe
    pub async fn with_probe(
        store: Arc<dyn KeyValueStore>,
        config: AppConfig,
        probe: Arc<dyn DatabaseProbe>,
    ) -> ConsoleResult<Self> {
        let identity = IdentityStore::load(store.clone(), config.latency()).await?;
        let provisioning = ProvisioningService::load(store, probe).await?;

        info!("Console state initialized");
        Ok(Self {
            config,
            identity,
            provisioning,
        })
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn provisioning(&self) -> &ProvisioningService {
        &self.provisioning
    }

    /// The view for the current state, `Loading` while a check is pending
    pub async fn view(&self) -> ConsoleResult<View> {
        let checking = self.provisioning.current_status().await == ConnectionStatus::Checking;
        self.select(checking).await
    }

    /// Re-check the database connection, then select the view
    pub async fn refresh(&self) -> ConsoleResult<View> {
        self.provisioning.check_connection().await;
        self.view().await
    }

    /// The bootstrap stage, ignoring any pending check
    async fn stage(&self) -> ConsoleResult<View> {
        self.select(false).await
    }

    async fn select(&self, checking: bool) -> ConsoleResult<View> {
        Ok(View::select(
            checking,
            self.provisioning.is_configured().await?,
            self.identity.has_owner().await?,
            self.identity.is_authenticated().await,
        ))
    }

    /// Submit the database setup form
    ///
    /// Available during initial setup. Afterwards only a logged-in owner may
    /// replace the configuration.
    pub async fn setup_database(
        &self,
        form: DatabaseSetupForm,
        mode: SetupMode,
    ) -> ConsoleResult<()> {
        form.validate().map_err(ConsoleError::Validation)?;

        if self.provisioning.is_configured().await? {
            let is_owner = self
                .identity
                .current_user()
                .await
                .is_some_and(|u| u.role == Role::Owner);
            if !is_owner {
                let current = self.stage().await?;
                warn!("Database reconfiguration rejected in stage {:?}", current);
                return Err(ConsoleError::WrongStage { current });
            }
        }

        match mode {
            SetupMode::Connect => self.provisioning.try_connect(form.config).await?,
            SetupMode::Create => self.provisioning.try_create(form.config).await?,
        }
        Ok(())
    }

    /// Submit the first owner registration form
    pub async fn register_owner(&self, form: RegisterOwnerForm) -> ConsoleResult<User> {
        let current = self.stage().await?;
        if current != View::RegisterOwner {
            return Err(ConsoleError::WrongStage { current });
        }

        form.validate(self.config.min_password_length)
            .map_err(ConsoleError::Validation)?;
        Ok(self.identity.register_user(form.into_new_user(), None).await?)
    }

    /// Submit the login form
    pub async fn login(&self, form: LoginForm) -> ConsoleResult<Session> {
        let current = self.stage().await?;
        if !current.allows_login() {
            return Err(ConsoleError::WrongStage { current });
        }

        form.validate().map_err(ConsoleError::Validation)?;
        Ok(self.identity.authenticate(&form.email, &form.password).await?)
    }

    pub async fn logout(&self) -> ConsoleResult<()> {
        Ok(self.identity.end_session().await?)
    }

    /// Dashboard summary for the logged-in user
    pub async fn dashboard(&self) -> ConsoleResult<Dashboard> {
        let user = self.enter(Route::Dashboard).await?;

        Ok(Dashboard {
            database: self.provisioning.config().await,
            status: self.provisioning.current_status().await,
            can_manage_users: Route::Users.access(Some(&user)) == auth::Access::Granted,
            assignable_roles: Role::assignable_by(user.role),
            user,
        })
    }

    /// User list, for owners and admins
    pub async fn users(&self) -> ConsoleResult<Vec<User>> {
        self.enter(Route::Users).await?;
        Ok(self.identity.list_users().await?)
    }

    /// Submit the user management form
    pub async fn create_user(&self, form: CreateUserForm) -> ConsoleResult<User> {
        let requester = self.enter(Route::Users).await?;

        form.validate(self.config.min_password_length, requester.role)
            .map_err(ConsoleError::Validation)?;
        Ok(self
            .identity
            .register_user(form.into_new_user(), Some(&requester))
            .await?)
    }

    /// Admit the current user to `route` once setup is complete
    async fn enter(&self, route: Route) -> ConsoleResult<User> {
        let current = self.stage().await?;
        if !current.allows_login() {
            return Err(ConsoleError::WrongStage { current });
        }
        route.enter(self.identity.current_user().await)
    }
}
