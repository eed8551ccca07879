#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::{from_fn, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use macropulse_store::KvStore;

mod config;
mod http;
mod refresh;
mod scheduler;

#[cfg(test)]
mod refresh_tests;

pub use config::ServerConfig;
pub use refresh::{RefreshError, RefreshOutcome, Refresher};
pub use scheduler::{next_cron_after, spawn_scheduler};

pub const CRATE_NAME: &str = "macropulse-server";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
    pub refresher: Arc<Refresher>,
    pub refresh_token: Option<String>,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: Arc<dyn KvStore>,
        refresher: Arc<Refresher>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            store,
            refresher,
            refresh_token,
        }
    }
}

async fn access_log_middleware(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let resp = next.run(req).await;
    info!(
        method = %method,
        path = %path,
        status = resp.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    resp
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::landing_handler))
        .route("/healthz", get(http::healthz_handler))
        .route("/api/health", get(http::health_handler))
        .route("/api/indicators", get(http::indicators_handler))
        .route("/api/fred_raw", get(http::fred_raw_handler))
        .route("/api/indeed_raw", get(http::indeed_raw_handler))
        .route("/api/runs", get(http::runs_handler))
        .route("/api/refresh", post(http::refresh_handler))
        .fallback(http::fallback_handler)
        .layer(from_fn(access_log_middleware))
        .with_state(state)
}
