// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::error::{FetchError, FetchErrorCode};

/// Per-call retry policy. Defaults match the pipeline contract: 12s per
/// attempt, three attempts total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub attempts: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(12_000),
            attempts: 3,
        }
    }
}

/// Delay before the attempt after `completed` finished attempts:
/// `min(2500, 300 * 2^(completed-1) + U[0,120))` milliseconds.
fn backoff_delay(completed: u32) -> Duration {
    let base = 300_u64.saturating_mul(1_u64 << (completed.saturating_sub(1)).min(16));
    let jitter = rand::thread_rng().gen_range(0_u64..120);
    Duration::from_millis(base.saturating_add(jitter).min(2_500))
}

async fn attempt_once(
    request: reqwest::RequestBuilder,
    label: &str,
) -> Result<String, FetchError> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::network(label, e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::status(label, status.as_u16()));
    }
    response
        .text()
        .await
        .map_err(|e| FetchError::network(label, e.to_string()))
}

/// Issues the request with the policy's timeout and retry loop, returning the
/// 2xx response body. Network errors and retryable statuses are retried with
/// backoff; everything else fails immediately with the label attached.
pub async fn fetch_text(
    request: reqwest::RequestBuilder,
    label: &str,
    policy: &FetchPolicy,
) -> Result<String, FetchError> {
    let mut last_error: Option<FetchError> = None;

    for completed in 0..policy.attempts {
        if completed > 0 {
            let delay = backoff_delay(completed);
            debug!(label, attempt = completed + 1, delay_ms = delay.as_millis() as u64, "retrying fetch");
            tokio::time::sleep(delay).await;
        }

        let Some(request) = request.try_clone() else {
            return Err(FetchError::new(
                FetchErrorCode::Internal,
                label,
                "request body is not replayable",
                false,
            ));
        };

        match tokio::time::timeout(policy.timeout, attempt_once(request, label)).await {
            Err(_) => {
                last_error = Some(FetchError::timeout(label, policy.timeout.as_millis() as u64));
            }
            Ok(Err(err)) if err.retryable => last_error = Some(err),
            Ok(Err(err)) => return Err(err),
            Ok(Ok(body)) => return Ok(body),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        FetchError::new(FetchErrorCode::Internal, label, "no attempts were made", false)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};

    fn client() -> reqwest::Client {
        reqwest::Client::new()
    }

    fn quick_policy() -> FetchPolicy {
        FetchPolicy {
            timeout: Duration::from_millis(2_000),
            attempts: 3,
        }
    }

    #[test]
    fn backoff_grows_and_caps() {
        for _ in 0..50 {
            let first = backoff_delay(1).as_millis() as u64;
            assert!((300..420).contains(&first), "first backoff {first}");
            let second = backoff_delay(2).as_millis() as u64;
            assert!((600..720).contains(&second), "second backoff {second}");
            assert!(backoff_delay(10).as_millis() as u64 <= 2_500);
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/data");
                then.status(200).body("payload");
            })
            .await;

        let body = fetch_text(
            client().get(server.url("/data")),
            "test data",
            &quick_policy(),
        )
        .await
        .expect("fetch");
        assert_eq!(body, "payload");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn terminal_4xx_fails_without_retry() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/denied");
                then.status(403);
            })
            .await;

        let err = fetch_text(
            client().get(server.url("/denied")),
            "denied call",
            &quick_policy(),
        )
        .await
        .expect_err("terminal status");
        assert_eq!(err.code, FetchErrorCode::BadStatus);
        assert_eq!(mock.hits_async().await, 1, "no retry on 403");
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_last_error_with_label() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/down");
                then.status(500);
            })
            .await;

        let err = fetch_text(
            client().get(server.url("/down")),
            "FRED UNRATE",
            &quick_policy(),
        )
        .await
        .expect_err("exhausted");
        assert_eq!(mock.hits_async().await, 3);
        assert!(err.to_string().contains("FRED UNRATE"));
    }
}
