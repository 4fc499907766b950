// Main entry point for the membership API server

use std::sync::Arc;

use anyhow::{Context, Result};
use club_core::domains::member::{MembershipRegistry, RegistryConfig};
use club_core::kernel::{start_scheduler, ServerDeps};
use club_core::server::{build_app, AppState};
use club_core::Config;
use sendgrid::{SendGridOptions, SendGridService};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,club_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting club membership API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Email delivery
    let sendgrid = config.sendgrid_api_key.clone().map(|api_key| {
        Arc::new(SendGridService::new(SendGridOptions {
            api_key,
            from_email: config.confirmation_from_email.clone(),
            from_name: None,
        }))
    });

    let deps = ServerDeps::production(pool.clone(), sendgrid);
    let registry = Arc::new(MembershipRegistry::new(
        deps,
        RegistryConfig::new(config.public_base_url.clone())
            .with_expiry_hours(config.confirmation_expiry_hours),
    ));

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = start_scheduler(registry.clone(), &config.prune_schedule)
        .await
        .context("Failed to start scheduled tasks")?;

    let app = build_app(
        AppState {
            db_pool: pool,
            registry,
        },
        &config.allowed_origins,
    );

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
