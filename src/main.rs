//! Redis Snapshot - point-in-time views of a Redis keyspace
//!
//! Polls a Redis server on an interval and serves the last complete
//! snapshot of its keyspace over HTTP.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redis_snapshot::api::create_router;
use redis_snapshot::source::RedisSource;
use redis_snapshot::{spawn_poller, AppState, Config, SnapshotEngine};

/// Main entry point for the snapshot service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the Redis source and try an initial connection
/// 4. Start the background poller
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redis_snapshot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Redis Snapshot service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: redis={}:{} db={}, port={}, interval={}, auto_refresh={}, timeout={}s",
        config.redis_host,
        config.redis_port,
        config.redis_db,
        config.server_port,
        config.refresh_interval,
        config.auto_refresh,
        config.poll_timeout
    );

    let mut source = RedisSource::from_config(&config).context("invalid Redis configuration")?;
    // Not fatal: the poller reconnects on every tick
    if let Err(err) = source.connect().await {
        warn!("Redis not reachable yet ({}), will retry on each poll", err);
    }

    let engine = SnapshotEngine::new(source, config.engine_options());
    let (state, settings_rx) = AppState::from_config(engine, &config);

    let poller_handle = spawn_poller(state.engine.clone(), state.board.clone(), settings_rx);
    info!("Snapshot poller started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(poller_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the poller and allows graceful shutdown.
async fn shutdown_signal(poller_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    poller_handle.abort();
    warn!("Snapshot poller aborted");
}
