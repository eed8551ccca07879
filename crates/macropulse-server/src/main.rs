// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::sync::Arc;

use macropulse_server::{build_router, spawn_scheduler, AppState, Refresher, ServerConfig};
use macropulse_store::{FileKv, KvStore, MemoryKv};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn log_interrupt(result: std::io::Result<()>) {
    match result {
        Ok(()) => info!("interrupt received, shutting down"),
        Err(e) => warn!("cannot listen for interrupt: {e}"),
    }
}

/// Resolves once the process should stop serving: SIGTERM where available,
/// ctrl-c everywhere.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => tokio::select! {
                _ = term.recv() => info!("SIGTERM received, shutting down"),
                interrupt = tokio::signal::ctrl_c() => log_interrupt(interrupt),
            },
            Err(e) => {
                warn!("cannot listen for SIGTERM: {e}");
                log_interrupt(tokio::signal::ctrl_c().await);
            }
        }
    }
    #[cfg(not(unix))]
    log_interrupt(tokio::signal::ctrl_c().await);
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = ServerConfig::from_env();
    init_tracing(config.log_json);

    if config.fred_api_key.is_none() {
        warn!("FRED_API_KEY is not set; refreshes will fail until it is configured");
    }

    let store: Arc<dyn KvStore> = match &config.data_dir {
        Some(root) => {
            info!(root = %root.display(), "snapshots persisted on disk");
            Arc::new(FileKv::open(root).map_err(|e| format!("open data dir: {e}"))?)
        }
        None => Arc::new(MemoryKv::new()),
    };

    let refresher = Arc::new(
        Refresher::new(
            store.clone(),
            config.fred_base_url.clone(),
            config.indeed_base_url.clone(),
            config.fred_api_key.clone(),
        )
        .map_err(|e| e.to_string())?,
    );

    if config.scheduler_enabled {
        spawn_scheduler(refresher.clone());
    } else {
        info!("scheduler disabled; refreshes run only via POST /api/refresh");
    }

    let state = AppState::new(store, refresher, config.refresh_token.clone());
    let app = build_router(state);

    let listener = TcpListener::bind(&config.bind)
        .await
        .map_err(|e| format!("bind {} failed: {e}", config.bind))?;
    info!("macropulse-server listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
