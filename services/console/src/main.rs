use anyhow::Result;
use auth::Role;
use clap::{Parser, Subcommand};
use common::{AppConfig, FileStore};
use console::forms::{CreateUserForm, DatabaseSetupForm, LoginForm, RegisterOwnerForm};
use console::{AppState, ConsoleError, SetupMode, View};
use provisioning::DatabaseConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Administrative console: database setup, owner bootstrap and user management
#[derive(Parser)]
#[command(name = "console", version)]
struct Cli {
    /// Directory holding the persisted state (overrides CONSOLE_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the database and show what the console needs next
    Status,
    /// Configure the database connection
    Setup {
        #[arg(long, default_value = "localhost")]
        host: String,
        #[arg(long, default_value_t = 5432)]
        port: u16,
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        password: String,
        #[arg(long, default_value = "projectmanager")]
        db_name: String,
        /// Create the database instead of connecting to an existing one
        #[arg(long)]
        create: bool,
    },
    /// Create the first owner account
    RegisterOwner {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out
    Logout,
    /// List user accounts
    Users,
    /// Create a user account
    AddUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,
        /// owner, admin or editor
        #[arg(long, default_value = "editor")]
        role: Role,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting console with store at {}", config.store_path.display());

    let store = FileStore::open(&config.store_path).await?;
    let state = AppState::load(Arc::new(store), config).await?;

    match run(&state, cli.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            if e.is_fault() {
                error!("Command failed: {}", e);
            }
            eprintln!("error: {}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(state: &AppState, command: Command) -> Result<(), ConsoleError> {
    match command {
        Command::Status => {
            let view = state.refresh().await?;
            let status = state.provisioning().current_status().await;
            println!("database: {} ({})", status, status.describe());
            println!("next: {:?} - {}", view, view.describe());

            if view == View::Dashboard {
                let dashboard = state.dashboard().await?;
                println!(
                    "signed in as {} <{}> ({})",
                    dashboard.user.username, dashboard.user.email, dashboard.user.role
                );
                if let Some(db) = dashboard.database {
                    println!(
                        "database config: {}@{}:{}/{}",
                        db.username, db.host, db.port, db.db_name
                    );
                }
                if dashboard.can_manage_users {
                    let roles: Vec<&str> =
                        dashboard.assignable_roles.iter().map(|r| r.as_str()).collect();
                    println!("may create: {}", roles.join(", "));
                }
            }
        }
        Command::Setup {
            host,
            port,
            username,
            password,
            db_name,
            create,
        } => {
            let form = DatabaseSetupForm {
                config: DatabaseConfig {
                    host,
                    port,
                    username,
                    password,
                    db_name,
                },
            };
            let mode = if create {
                SetupMode::Create
            } else {
                SetupMode::Connect
            };
            state.setup_database(form, mode).await?;
            println!("Successfully connected to database.");
        }
        Command::RegisterOwner {
            username,
            email,
            password,
            confirm_password,
        } => {
            let form = RegisterOwnerForm {
                username,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
            };
            let user = state.register_owner(form).await?;
            println!("Owner {} created successfully.", user.username);
        }
        Command::Login { email, password } => {
            let session = state.login(LoginForm { email, password }).await?;
            println!("Login successful! Welcome, {}.", session.user.username);
        }
        Command::Logout => {
            state.logout().await?;
            println!("Logged out successfully.");
        }
        Command::Users => {
            let users = state.users().await?;
            if users.is_empty() {
                println!("No users found.");
            }
            for user in users {
                println!(
                    "{:<20} {:<30} {:<8} {}",
                    user.username,
                    user.email,
                    user.role,
                    user.created_at.format("%b %-d, %Y")
                );
            }
        }
        Command::AddUser {
            username,
            email,
            password,
            confirm_password,
            role,
        } => {
            let form = CreateUserForm {
                username,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
                role,
            };
            let user = state.create_user(form).await?;
            println!("User {} created successfully.", user.username);
        }
    }

    Ok(())
}
