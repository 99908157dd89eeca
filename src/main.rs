// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;

use quizhub::config::Config;
use quizhub::handlers::auth::normalize_email;
use quizhub::models::user::{NewUser, ROLE_ADMIN};
use quizhub::routes;
use quizhub::state::AppState;
use quizhub::store::{DynStore, memory::MemoryStore, postgres::PgStore};
use quizhub::utils::hash::hash_password;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (reads .env if present)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store: DynStore = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store. Data will not persist.");
            Arc::new(MemoryStore::new())
        }
    };

    // Seed Admin User
    if let Err(e) = seed_admin_user(&store, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let port = config.port;
    let state = AppState { store, config };

    // Create the Axum application router
    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

async fn seed_admin_user(store: &DynStore, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        let email = normalize_email(email);
        if store.find_user_by_email(&email).await?.is_none() {
            tracing::info!("Seeding admin user: {}", email);

            store
                .create_user(NewUser {
                    name: "Administrator".to_string(),
                    email,
                    password_hash: hash_password(password)?,
                    role: ROLE_ADMIN.to_string(),
                })
                .await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
