//! Main entry point for the moderator statistics API server

use modstats_api::build_router;
use modstats_core::{Config, context_error, context_error::Result, init_logging};
use modstats_database::Database;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for development convenience)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: .env file not loaded: {e}");
    }

    let (config, load_error) = Config::or_defaults(Config::load());

    init_logging(&config.logging)?;

    if let Some(err) = load_error {
        warn!("Failed to load config ({}), using defaults", err);
    }

    info!("╔══════════════════════════════════════════════════════════╗");
    info!(
        "║       Moderator Statistics API Server v{}             ║",
        env!("CARGO_PKG_VERSION")
    );
    info!("╚══════════════════════════════════════════════════════════╝");
    info!(
        "🚀 Starting server on {}:{}",
        config.server.host, config.server.port
    );

    info!("🔌 Opening record store...");
    let database = match Database::new(&config).await {
        Ok(db) => {
            info!("✅ Record store opened");
            db
        }
        Err(e) => {
            error!("Failed to open record store: {}", e);
            return Err(context_error!("Record store unavailable: {}", e));
        }
    };

    info!("🔄 Running database migrations...");
    if let Err(e) = database.migrate().await {
        error!("Database migration failed: {}", e);
        return Err(context_error!("Migration failed: {}", e));
    }
    info!("✅ Database migrations completed");

    if let Err(e) = database.health_check().await {
        error!("Database health check failed: {}", e);
        return Err(context_error!("Database health check failed: {}", e));
    }
    info!("✅ Database health check passed");

    info!("🛠️  Building application routes...");
    let app = build_router(config.clone(), database.pool().clone())?
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| context_error!("Invalid server address: {}", e))?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| context_error!("Failed to bind to {}: {}", addr, e))?;

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║                     SERVER READY                         ║");
    info!("╟──────────────────────────────────────────────────────────╢");
    info!("║ 🌐 API:     http://{}/api/moderators", addr);
    info!("║ 📊 Stats:   http://{}/api/stats", addr);
    info!("║ 💚 Health:  http://{}/health", addr);
    info!("╚══════════════════════════════════════════════════════════╝");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| context_error!("Server error: {}", e))?;

    database.close().await;
    info!("👋 Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received terminate signal, shutting down gracefully...");
        },
    }
}
