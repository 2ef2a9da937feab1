//! vocab-server - Vocabulary review service
//!
//! Startup: resolve configuration, open the word store, connect the AI
//! provider client, then serve the HTTP API until Ctrl+C / SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vocab_common::config::{prepare_data_folder, TomlConfig};
use vocab_server::ai::OpenAiClient;
use vocab_server::api::AuthSettings;
use vocab_server::config::{CliArgs, ServerConfig};
use vocab_server::{build_router, db, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let toml = TomlConfig::load(args.config.as_deref()).context("Failed to load config file")?;
    let config = ServerConfig::resolve(&args, &toml).context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vocab_server={0},vocab_common={0},tower_http=info", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any slow startup work
    info!(
        "Starting vocab-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let db_path = prepare_data_folder(&config.data_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;
    info!("✓ Database ready");

    let ai = OpenAiClient::new(config.ai.clone()).context("Failed to create AI client")?;
    info!(endpoint = ai.endpoint(), model = ai.model(), "AI provider configured");

    if config.auth_enabled() {
        info!("✓ Login pattern configured, session authentication enabled");
    } else {
        warn!("No login pattern configured, authentication disabled");
    }
    info!("Reference zone: UTC{}", config.zone.offset());

    let state = AppState::new(
        pool.clone(),
        Arc::new(ai),
        AuthSettings::new(config.login_pattern.clone(), config.secure_cookies),
        config.zone,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;
    info!("vocab-server listening on http://{}", config.listen_addr);
    info!("Health check: http://{}/health", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
