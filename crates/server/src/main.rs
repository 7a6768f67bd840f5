use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gamedex_core::{
    load_config, validate_config, BulkImporter, CacheAsideResolver, GameStore, ImportManager,
    LogFormat, RawgClient, RemoteCatalog, SqliteGameStore, WatchlistStore,
};
use gamedex_server::{create_router, AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // The subscriber may not be installed yet if config loading failed.
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("GAMEDEX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Initialize logging
    let (json_layer, pretty_layer) = match config.logging.format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer())),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(json_layer)
        .with(pretty_layer)
        .init();

    info!("gamedex {} starting", VERSION);
    info!("Configuration loaded from {:?}", config_path);
    info!("Database path: {:?}", config.database.path);

    // Create SQLite game store
    let sqlite = Arc::new(
        SqliteGameStore::new(&config.database.path).context("Failed to create game store")?,
    );
    let store: Arc<dyn GameStore> = Arc::clone(&sqlite) as Arc<dyn GameStore>;
    let watchlists: Arc<dyn WatchlistStore> = sqlite;
    info!("Game store initialized");

    // Create remote catalog if configured
    let remote: Option<Arc<dyn RemoteCatalog>> = match &config.rawg {
        Some(rawg_config) => {
            let client =
                RawgClient::new(rawg_config.clone()).context("Failed to create RAWG client")?;
            info!("RAWG client initialized");
            Some(Arc::new(client))
        }
        None => {
            warn!("No [rawg] section configured, serving from the local store only");
            None
        }
    };

    let settings = config.sync.settings();
    info!(
        stale_after_hours = config.sync.stale_after_hours,
        remote_timeout_secs = config.sync.remote_timeout_secs,
        "Cache-aside settings"
    );

    let resolver = CacheAsideResolver::new(Arc::clone(&store), remote.clone(), settings.clone());

    // Bulk import needs a remote to pull from
    let imports = remote.map(|remote| {
        ImportManager::new(BulkImporter::new(Arc::clone(&store), remote, settings))
    });

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), resolver, watchlists, imports));

    // Create router
    let app = create_router(Arc::clone(&state));

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop a running import between pages
    if let Some(imports) = state.imports() {
        if imports.cancel().await {
            info!("Cancelled running import");
        }
    }

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
