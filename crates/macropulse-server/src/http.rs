// SPDX-License-Identifier: Apache-2.0

use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use macropulse_model::Trigger;
use macropulse_store::{
    get_text, read_consecutive_failures, read_latest, read_run_log, SnapshotKind,
    KEY_LAST_ATTEMPT, KEY_LAST_DURATION_MS, KEY_LAST_ERROR, KEY_LAST_SUCCESS, KEY_LAST_UPDATED,
    KEY_LATEST_VERSION,
};

use crate::refresh::RefreshOutcome;
use crate::AppState;

/// Published data is cached briefly at the edge; every `/api/*` response
/// carries the same headers.
fn api_response(status: StatusCode, body: Vec<u8>) -> Response {
    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    resp.headers_mut().insert(
        "cache-control",
        HeaderValue::from_static("public, max-age=60"),
    );
    resp
}

fn api_json(status: StatusCode, value: Value) -> Response {
    api_response(status, value.to_string().into_bytes())
}

async fn meta_text(state: &AppState, key: &str) -> Option<String> {
    get_text(state.store.as_ref(), key)
        .await
        .ok()
        .flatten()
        .filter(|v| !v.is_empty())
}

fn age_minutes_since(iso: &str) -> Option<f64> {
    let ts = DateTime::parse_from_rfc3339(iso).ok()?;
    let age = Utc::now().signed_duration_since(ts.with_timezone(&Utc));
    Some((age.num_seconds() as f64 / 60.0 * 10.0).round() / 10.0)
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Response {
    let last_updated = meta_text(&state, KEY_LAST_UPDATED).await;
    let last_attempt = meta_text(&state, KEY_LAST_ATTEMPT).await;
    let last_success = meta_text(&state, KEY_LAST_SUCCESS).await;
    let last_error = meta_text(&state, KEY_LAST_ERROR).await;
    let version = meta_text(&state, KEY_LATEST_VERSION).await;
    let last_duration_ms = meta_text(&state, KEY_LAST_DURATION_MS)
        .await
        .and_then(|v| v.parse::<u64>().ok());
    let consecutive_failures = read_consecutive_failures(state.store.as_ref()).await;

    let age_minutes = last_success.as_deref().and_then(age_minutes_since);
    let healthy = last_success.is_some()
        && age_minutes.map_or(true, |age| age < 720.0)
        && consecutive_failures < 3;

    api_json(
        StatusCode::OK,
        json!({
            "healthy": healthy,
            "last_updated": last_updated,
            "last_attempt": last_attempt,
            "last_success": last_success,
            "last_error": last_error,
            "consecutive_failures": consecutive_failures,
            "version": version,
            "last_duration_ms": last_duration_ms,
            "age_minutes": age_minutes,
        }),
    )
}

async fn snapshot_response(state: &AppState, kind: SnapshotKind) -> Response {
    match read_latest(state.store.as_ref(), kind).await {
        Ok(Some(bytes)) => api_response(StatusCode::OK, bytes),
        Ok(None) => api_json(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": "No data yet."}),
        ),
        Err(e) => api_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": e.to_string()}),
        ),
    }
}

pub(crate) async fn indicators_handler(State(state): State<AppState>) -> Response {
    snapshot_response(&state, SnapshotKind::Indicators).await
}

pub(crate) async fn fred_raw_handler(State(state): State<AppState>) -> Response {
    snapshot_response(&state, SnapshotKind::FredRaw).await
}

pub(crate) async fn indeed_raw_handler(State(state): State<AppState>) -> Response {
    snapshot_response(&state, SnapshotKind::IndeedRaw).await
}

pub(crate) async fn runs_handler(State(state): State<AppState>) -> Response {
    let runs = read_run_log(state.store.as_ref()).await;
    api_json(StatusCode::OK, json!({"ok": true, "runs": runs}))
}

fn bearer_token_matches(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let Some((scheme, token)) = value.trim().split_once(' ') else {
        return false;
    };
    scheme.eq_ignore_ascii_case("bearer") && token.trim() == expected
}

pub(crate) async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    if !bearer_token_matches(&headers, state.refresh_token.as_deref()) {
        return api_json(StatusCode::UNAUTHORIZED, json!({"error": "unauthorized"}));
    }

    match state.refresher.run(Trigger::Manual).await {
        RefreshOutcome::Skipped { reason } => api_json(
            StatusCode::CONFLICT,
            json!({"error": "refresh_locked", "reason": reason}),
        ),
        RefreshOutcome::Failed { error } => {
            api_json(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": error}))
        }
        RefreshOutcome::Completed {
            generated_at,
            version,
            warnings,
            run_id,
        } => api_json(
            StatusCode::OK,
            json!({
                "ok": true,
                "generated_at": generated_at,
                "version": version,
                "warnings": warnings,
                "run_id": run_id,
            }),
        ),
    }
}

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn landing_handler() -> Response {
    let html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Macropulse</title></head><body>\
<h1>Macropulse</h1>\
<p>Version: <code>{}</code></p>\
<ul>\
<li><a href=\"/api/health\">/api/health</a></li>\
<li><a href=\"/api/indicators\">/api/indicators</a></li>\
<li><a href=\"/api/fred_raw\">/api/fred_raw</a></li>\
<li><a href=\"/api/indeed_raw\">/api/indeed_raw</a></li>\
<li><a href=\"/api/runs\">/api/runs</a></li>\
</ul>\
</body></html>",
        env!("CARGO_PKG_VERSION"),
    );
    let mut resp = Response::new(Body::from(html));
    resp.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

pub(crate) async fn fallback_handler(uri: Uri) -> Response {
    if uri.path().starts_with("/api/") {
        api_json(StatusCode::NOT_FOUND, json!({"error": "not_found"}))
    } else {
        (StatusCode::NOT_FOUND, "not found").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).expect("header"));
        headers
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let headers = headers_with_auth("BEARER sekrit");
        assert!(bearer_token_matches(&headers, Some("sekrit")));
        let headers = headers_with_auth("bearer sekrit");
        assert!(bearer_token_matches(&headers, Some("sekrit")));
    }

    #[test]
    fn token_comparison_is_exact() {
        let headers = headers_with_auth("Bearer sekrit");
        assert!(!bearer_token_matches(&headers, Some("SEKRIT")));
        assert!(!bearer_token_matches(&headers, Some("other")));
    }

    #[test]
    fn missing_config_rejects_everything() {
        let headers = headers_with_auth("Bearer anything");
        assert!(!bearer_token_matches(&headers, None));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(!bearer_token_matches(&HeaderMap::new(), Some("t")));
        let headers = headers_with_auth("sekrit");
        assert!(!bearer_token_matches(&headers, Some("sekrit")));
        let headers = headers_with_auth("Basic sekrit");
        assert!(!bearer_token_matches(&headers, Some("sekrit")));
    }

    #[test]
    fn age_minutes_from_rfc3339() {
        let recent = Utc::now() - chrono::Duration::minutes(30);
        let age = age_minutes_since(&recent.to_rfc3339()).expect("age");
        assert!((29.0..31.0).contains(&age), "age {age}");
        assert!(age_minutes_since("not a timestamp").is_none());
    }
}
