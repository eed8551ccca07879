use std::sync::Arc;
use std::time::Duration;

use httpmock::{Method::GET, MockServer};

use macropulse_ingest::FetchPolicy;
use macropulse_model::{IndicatorsSnapshot, SourceStatus, Trigger, SERIES_CATALOG};
use macropulse_store::{
    acquire_refresh_lock, get_text, read_consecutive_failures, read_latest, read_run_log,
    KvStore, MemoryKv, SnapshotKind, KEY_LAST_SUCCESS, KEY_LATEST_VERSION,
};

use crate::refresh::{RefreshOutcome, Refresher};

const AGGREGATE_CSV: &str = "\
date,indeed_job_postings_index_SA,indeed_job_postings_index
2025-01-01,101.5,100.9
2025-01-02,100.2,100.1
";

const SECTORS_CSV: &str = "\
date,display_name,variable,indeed_job_postings_index
2025-01-01,Software Development,total postings,88.0
2025-01-02,Software Development,total postings,87.5
2025-01-01,Accounting,total postings,95.0
";

fn fred_body(values: &[f64]) -> String {
    let base = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).expect("date");
    let rows: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let date = base + chrono::Days::new(i as u64);
            format!(r#"{{"date":"{date}","value":"{v}"}}"#)
        })
        .collect();
    format!(r#"{{"observations":[{}]}}"#, rows.join(","))
}

/// Mocks every configured series flat at 5.0 except the ids in `failing`,
/// which return 500, plus both Indeed CSVs.
async fn mock_universe(server: &MockServer, failing: &[&str]) {
    let body = fred_body(&[5.0; 60]);
    for spec in &SERIES_CATALOG {
        let status = if failing.contains(&spec.id) { 500 } else { 200 };
        let body = body.clone();
        server
            .mock_async(move |when, then| {
                when.method(GET)
                    .path("/fred/series/observations")
                    .query_param("series_id", spec.id);
                if status == 200 {
                    then.status(200).body(body);
                } else {
                    then.status(status);
                }
            })
            .await;
    }
    server
        .mock_async(|when, then| {
            when.method(GET).path("/US/aggregate_job_postings_US.csv");
            then.status(200).body(AGGREGATE_CSV);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/US/job_postings_by_sector_US.csv");
            then.status(200).body(SECTORS_CSV);
        })
        .await;
}

fn refresher(store: &Arc<MemoryKv>, server: &MockServer) -> Refresher {
    let store: Arc<dyn KvStore> = store.clone();
    Refresher::new(
        store,
        server.base_url(),
        server.base_url(),
        Some("test-key".to_string()),
    )
    .expect("refresher")
    .with_policy(FetchPolicy {
        timeout: Duration::from_millis(2_000),
        attempts: 2,
    })
}

async fn published_indicators(store: &MemoryKv) -> IndicatorsSnapshot {
    let bytes = read_latest(store, SnapshotKind::Indicators)
        .await
        .expect("read latest")
        .expect("indicators published");
    serde_json::from_slice(&bytes).expect("decode indicators")
}

#[tokio::test]
async fn all_normal_run_publishes_a_zero_composite() {
    let server = MockServer::start_async().await;
    mock_universe(&server, &[]).await;
    let store = Arc::new(MemoryKv::new());

    let outcome = refresher(&store, &server).run(Trigger::Cron).await;
    let RefreshOutcome::Completed {
        version, warnings, ..
    } = outcome
    else {
        panic!("expected completed run, got {outcome:?}");
    };
    assert!(warnings.is_empty());

    let snapshot = published_indicators(store.as_ref()).await;
    assert_eq!(snapshot.pipeline.version, version);
    assert_eq!(snapshot.composite_index.value, 0.0);
    assert!(snapshot
        .composite_index
        .interpretation
        .starts_with("Normal"));
    assert_eq!(snapshot.pipeline.source_status.fred, SourceStatus::Fresh);
    assert_eq!(snapshot.pipeline.source_status.indeed, SourceStatus::Fresh);
    for link in snapshot.chain_links.values() {
        assert_eq!(link.status.as_str(), "normal", "link {}", link.name);
    }

    // All three per-version payloads exist.
    for kind in [
        SnapshotKind::Indicators,
        SnapshotKind::FredRaw,
        SnapshotKind::IndeedRaw,
    ] {
        assert!(
            store
                .get(&macropulse_store::snap_key(&version, kind))
                .await
                .expect("get")
                .is_some(),
            "missing payload {}",
            kind.as_str()
        );
    }

    assert_eq!(read_consecutive_failures(store.as_ref()).await, 0);
    assert!(get_text(store.as_ref(), KEY_LAST_SUCCESS)
        .await
        .expect("meta")
        .is_some());
    let runs = read_run_log(store.as_ref()).await;
    assert!(runs[0].ok);
    assert_eq!(runs[0].version.as_deref(), Some(version.as_str()));
}

#[tokio::test]
async fn failed_series_falls_back_to_the_previous_snapshot() {
    let store = Arc::new(MemoryKv::new());

    let healthy = MockServer::start_async().await;
    mock_universe(&healthy, &[]).await;
    let first = refresher(&store, &healthy).run(Trigger::Cron).await;
    assert!(matches!(first, RefreshOutcome::Completed { .. }));

    let degraded = MockServer::start_async().await;
    mock_universe(&degraded, &["UMCSENT"]).await;
    let outcome = refresher(&store, &degraded).run(Trigger::Manual).await;
    let RefreshOutcome::Completed { warnings, .. } = outcome else {
        panic!("fallback run should succeed, got {outcome:?}");
    };
    assert!(warnings.contains(&"FRED UMCSENT fallback to previous snapshot".to_string()));

    let snapshot = published_indicators(store.as_ref()).await;
    assert_eq!(snapshot.pipeline.source_status.fred, SourceStatus::Stale);
    assert_eq!(snapshot.pipeline.fallback_counts.fred_series, 1);
    assert_eq!(snapshot.pipeline.trigger, Trigger::Manual);

    // The carried-over series is still in the published raw data.
    let fred_bytes = read_latest(store.as_ref(), SnapshotKind::FredRaw)
        .await
        .expect("read")
        .expect("fred_raw");
    let fred: macropulse_model::FredRaw =
        serde_json::from_slice(&fred_bytes).expect("decode fred_raw");
    assert!(fred.find_series("UMCSENT").is_some());
}

#[tokio::test]
async fn first_run_with_a_missing_series_aborts() {
    let server = MockServer::start_async().await;
    mock_universe(&server, &["UMCSENT"]).await;
    let store = Arc::new(MemoryKv::new());

    let outcome = refresher(&store, &server).run(Trigger::Cron).await;
    let RefreshOutcome::Failed { error } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(error.contains("UMCSENT"), "error should name the series: {error}");

    assert!(store
        .get(KEY_LATEST_VERSION)
        .await
        .expect("get")
        .is_none());
    assert!(read_latest(store.as_ref(), SnapshotKind::Indicators)
        .await
        .expect("read")
        .is_none());
    assert_eq!(read_consecutive_failures(store.as_ref()).await, 1);
    let runs = read_run_log(store.as_ref()).await;
    assert!(!runs[0].ok);
    assert!(runs[0].error.is_some());
}

#[tokio::test]
async fn indeed_failure_reuses_the_previous_snapshot() {
    let store = Arc::new(MemoryKv::new());

    let healthy = MockServer::start_async().await;
    mock_universe(&healthy, &[]).await;
    assert!(matches!(
        refresher(&store, &healthy).run(Trigger::Cron).await,
        RefreshOutcome::Completed { .. }
    ));

    // Second upstream serves FRED but 404s both CSVs.
    let degraded = MockServer::start_async().await;
    let body = fred_body(&[5.0; 60]);
    for spec in &SERIES_CATALOG {
        let body = body.clone();
        degraded
            .mock_async(move |when, then| {
                when.method(GET)
                    .path("/fred/series/observations")
                    .query_param("series_id", spec.id);
                then.status(200).body(body);
            })
            .await;
    }

    let outcome = refresher(&store, &degraded).run(Trigger::Cron).await;
    let RefreshOutcome::Completed { warnings, .. } = outcome else {
        panic!("expected completed run, got {outcome:?}");
    };
    assert!(warnings
        .iter()
        .any(|w| w.contains("Indeed fetch failed")));
    let snapshot = published_indicators(store.as_ref()).await;
    assert_eq!(snapshot.pipeline.source_status.indeed, SourceStatus::Stale);
    assert_eq!(snapshot.pipeline.source_status.fred, SourceStatus::Fresh);
}

#[tokio::test]
async fn indeed_failure_with_no_prior_snapshot_aborts() {
    let server = MockServer::start_async().await;
    let body = fred_body(&[5.0; 60]);
    for spec in &SERIES_CATALOG {
        let body = body.clone();
        server
            .mock_async(move |when, then| {
                when.method(GET)
                    .path("/fred/series/observations")
                    .query_param("series_id", spec.id);
                then.status(200).body(body);
            })
            .await;
    }
    let store = Arc::new(MemoryKv::new());

    let outcome = refresher(&store, &server).run(Trigger::Cron).await;
    assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
    assert!(store.get(KEY_LATEST_VERSION).await.expect("get").is_none());
}

#[tokio::test]
async fn concurrent_refresh_is_skipped_under_the_lock() {
    let server = MockServer::start_async().await;
    mock_universe(&server, &[]).await;
    let store = Arc::new(MemoryKv::new());

    acquire_refresh_lock(store.as_ref(), "in-flight-run")
        .await
        .expect("seed lock");

    let outcome = refresher(&store, &server).run(Trigger::Manual).await;
    let RefreshOutcome::Skipped { reason } = outcome else {
        panic!("expected skip, got {outcome:?}");
    };
    assert_eq!(reason, "refresh locked by in-flight-run");

    assert!(store.get(KEY_LATEST_VERSION).await.expect("get").is_none());
    assert_eq!(read_consecutive_failures(store.as_ref()).await, 0);
    let runs = read_run_log(store.as_ref()).await;
    assert_eq!(runs[0].skipped, Some(true));
    assert!(!runs[0].ok);
    assert_eq!(runs[0].reason.as_deref(), Some("refresh locked by in-flight-run"));
}

#[tokio::test]
async fn missing_api_key_fails_before_any_fetch() {
    let server = MockServer::start_async().await;
    let store = Arc::new(MemoryKv::new());
    let store_dyn: Arc<dyn KvStore> = store.clone();
    let refresher = Refresher::new(store_dyn, server.base_url(), server.base_url(), None)
        .expect("refresher");

    let outcome = refresher.run(Trigger::Cron).await;
    let RefreshOutcome::Failed { error } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(error.contains("FRED_API_KEY"));
    assert_eq!(read_consecutive_failures(store.as_ref()).await, 1);
}

#[tokio::test]
async fn lock_is_released_after_a_successful_run() {
    let server = MockServer::start_async().await;
    mock_universe(&server, &[]).await;
    let store = Arc::new(MemoryKv::new());

    let r = refresher(&store, &server);
    assert!(matches!(
        r.run(Trigger::Cron).await,
        RefreshOutcome::Completed { .. }
    ));
    // A second run right away must not see a held lock.
    assert!(matches!(
        r.run(Trigger::Cron).await,
        RefreshOutcome::Completed { .. }
    ));
}
