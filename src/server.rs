//! HTTP server initialization and runtime setup.
//!
//! Wires the code store, allocator, page-view worker and sweeper together,
//! serves HTTP until a shutdown signal arrives, then stops the background
//! tasks in order.

use crate::application::services::{CleanupOptions, CodeAllocator, LinkService, Sweeper};
use crate::config::{self, Config};
use crate::domain::pageview_worker::run_pageview_worker;
use crate::domain::repositories::CodeStore;
use crate::infrastructure::pageview::FilePageViewTracker;
use crate::infrastructure::persistence::PgCodeStore;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and schema
/// - Code allocator with its refill worker
/// - Page-view tracker and worker
/// - Lifecycle sweeper (options reloadable via `SIGHUP`)
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or schema setup fails
/// - The page-view directory cannot be created
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let store: Arc<dyn CodeStore> = Arc::new(PgCodeStore::new(Arc::new(pool)));
    store
        .initialize_schema()
        .await
        .context("Failed to initialize database schema")?;

    let allocator = Arc::new(CodeAllocator::start(
        store.clone(),
        config.allocator_settings(),
    ));
    let link_service = Arc::new(LinkService::new(
        allocator.clone(),
        store.clone(),
        config.base_url.clone(),
    ));

    let tracker = FilePageViewTracker::new(
        config.pageview_log_dir.clone(),
        config.pageview_salt_file.clone(),
    )
    .await
    .context("Failed to prepare page-view log directory")?;
    let (pageview_tx, pageview_rx) = mpsc::channel(config.pageview_queue_capacity);
    let pageview_worker = tokio::spawn(run_pageview_worker(pageview_rx, Arc::new(tracker)));

    let shutdown = CancellationToken::new();
    let (options_tx, options_rx) = watch::channel(config.cleanup_options()?);
    let sweeper = Sweeper::new(store.clone(), options_rx, shutdown.child_token()).spawn();
    let reloader = spawn_options_reloader(options_tx, shutdown.child_token());

    let state = AppState::new(link_service, pageview_tx);
    let app = app_router(state, &config.static_dir);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    let served = axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await;

    info!("Stopping background tasks");
    shutdown.cancel();

    if let Err(e) = sweeper.await {
        error!(error = %e, "Sweeper task failed");
    }
    if let Err(e) = reloader.await {
        error!(error = %e, "Options reloader task failed");
    }
    allocator.shutdown().await;

    // The router owned the last page-view sender; the worker exits once drained.
    if let Err(e) = pageview_worker.await {
        error!(error = %e, "Page-view worker failed");
    }

    served.context("HTTP server error")?;
    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C, `SIGTERM` or cancellation of `token`.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
        _ = token.cancelled() => {}
    }
}

/// Re-reads cleanup options on every `SIGHUP` and publishes them to the sweeper.
///
/// Invalid values are logged and the previous options stay in effect.
#[cfg(unix)]
fn spawn_options_reloader(
    options: watch::Sender<CleanupOptions>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGHUP, cleanup options are fixed");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    match config::reload_cleanup_options() {
                        Ok(fresh) => {
                            info!(
                                interval_secs = fresh.interval.as_secs(),
                                log_only = fresh.log_only,
                                "Reloaded cleanup options"
                            );
                            options.send_replace(fresh);
                        }
                        Err(e) => warn!("Ignoring reloaded cleanup options: {e:#}"),
                    }
                }
            }
        }
    })
}

#[cfg(not(unix))]
fn spawn_options_reloader(
    options: watch::Sender<CleanupOptions>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        cancel.cancelled().await;
        drop(options);
    })
}
