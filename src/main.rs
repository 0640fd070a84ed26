//! Folio Viewer Server
//!
//! Serves the multi-document viewer core to a browser front end.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_viewer::config::Config;
use folio_viewer::engine::{MupdfEngine, PdfEngine};
use folio_viewer::messages;
use folio_viewer::state::AppState;
use folio_viewer::store::{Persistence, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_viewer=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting Folio Viewer v{}", env!("CARGO_PKG_VERSION"));

    // A missing store only disables persistence and notes
    let store = open_store(&config.database.url).await;

    let engine: Arc<dyn PdfEngine> = Arc::new(MupdfEngine::new());
    let app_state = AppState::new(config.clone(), engine, store);
    let app = folio_viewer::app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    tracing::info!("Folio Viewer listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn open_store(url: &str) -> Option<Arc<dyn Persistence>> {
    let store = match SqliteStore::connect(url).await {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!("{} ({})", messages::STORE_UNAVAILABLE, e);
            return None;
        }
    };
    if let Err(e) = store.initialize().await {
        tracing::warn!("{} ({})", messages::STORE_UNAVAILABLE, e);
        return None;
    }
    tracing::info!("Database initialized at {}", url);
    Some(Arc::new(store))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
