/// Worklog Server - multi-user time-tracking service
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worklog_core::User;
use worklog_server::{config::ServerConfig, services::AuthService, state::AppState};
use worklog_storage::users::Users;
use worklog_storage::Database;

#[derive(Parser)]
#[command(name = "worklog-server")]
#[command(about = "Worklog multi-user time-tracking server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "WORKLOG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create a user (e.g. the first administrator)
    AddUser {
        /// Email address, used to sign in
        #[arg(short, long)]
        email: String,
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Password
        #[arg(short, long)]
        password: String,
        /// Role id: 1 regular user, 2 user manager, 3 administrator
        #[arg(short, long, default_value_t = 3)]
        role: i64,
    },
    /// List all users
    ListUsers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worklog_server=info,worklog_storage=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ServerConfig::load_from(path)?,
        None => ServerConfig::load()?,
    };

    match cli.command {
        Commands::Serve => {
            serve(config).await?;
        }
        Commands::AddUser {
            email,
            name,
            password,
            role,
        } => {
            add_user(&config, &email, &name, &password, role).await?;
        }
        Commands::ListUsers => {
            list_users(&config).await?;
        }
    }

    Ok(())
}

async fn open_database(config: &ServerConfig) -> anyhow::Result<Database> {
    // SQLite creates the file but not its directory
    let path = config
        .storage
        .database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !path.starts_with(":memory:") {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let db = Database::with_settings(
        &config.storage.database_url,
        &config.storage.pool_settings(),
    )
    .await?;
    Ok(db)
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    tracing::info!("Starting Worklog Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    // Initialize database
    let db = open_database(&config).await?;
    tracing::info!("Database connected");

    // Initialize auth service
    let auth_service = Arc::new(AuthService::new(
        &config.auth.jwt_secret,
        config.auth.token_expiration_days,
    ));
    tracing::info!("Auth service initialized");

    // Build application state and router
    let app_state = AppState::new(db, auth_service);
    let app = worklog_server::router(app_state);

    // Create server address
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn add_user(
    config: &ServerConfig,
    email: &str,
    name: &str,
    password: &str,
    role: i64,
) -> anyhow::Result<()> {
    let mut user = User::new();
    user.set_email(email)?;
    user.set_name(name)?;
    user.set_password(password)?;
    user.set_role_id(role)?;

    let db = open_database(config).await?;
    let user = Users::new(db).add(&user).await?;

    tracing::info!(user_id = user.id(), "User created");
    println!(
        "Created user {} <{}> ({})",
        user.id(),
        user.email().unwrap_or_default(),
        user.role()
    );

    Ok(())
}

async fn list_users(config: &ServerConfig) -> anyhow::Result<()> {
    let db = open_database(config).await?;
    let users = Users::new(db).get_all().await?;

    println!("Users:");
    for user in users {
        println!(
            "  {} - {} <{}> ({})",
            user.id(),
            user.name().unwrap_or_default(),
            user.email().unwrap_or_default(),
            user.role().label()
        );
    }

    Ok(())
}
