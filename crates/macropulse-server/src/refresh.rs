// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Months, SecondsFormat, Utc};
use rand::Rng;
use tracing::{error, info, warn};

use macropulse_compute::{chain_links, composite_index, displacement_velocity, ghost_gdp};
use macropulse_ingest::{fetch_fred_series, fetch_indeed, FetchPolicy};
use macropulse_model::{
    publication_version, FallbackCounts, FredRaw, IndeedRaw, IndicatorsSnapshot, PipelineMeta,
    RunLogEntry, Series, SeriesMeta, SeriesSpec, SourceStatus, SourceStatusMap, Trigger,
    SERIES_CATALOG,
};
use macropulse_store::{
    acquire_refresh_lock, append_run_log, publish_version, put_text, read_consecutive_failures,
    read_latest, release_refresh_lock, KvStore, LockError, SnapshotKind, KEY_CONSECUTIVE_FAILURES,
    KEY_LAST_ATTEMPT, KEY_LAST_DURATION_MS, KEY_LAST_ERROR, KEY_LAST_SUCCESS, KEY_LAST_UPDATED,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshError(pub String);

impl Display for RefreshError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for RefreshError {}

/// Result of one refresh attempt, as seen by the scheduler and the manual
/// trigger endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed {
        generated_at: String,
        version: String,
        warnings: Vec<String>,
        run_id: String,
    },
    Skipped {
        reason: String,
    },
    Failed {
        error: String,
    },
}

struct Published {
    generated_at: String,
    version: String,
    warnings: Vec<String>,
}

/// Drives one end-to-end refresh: lock, parallel fetch with last-good
/// fallback, compute, publish, metadata. A failed run never clobbers the
/// previously published version.
pub struct Refresher {
    store: Arc<dyn KvStore>,
    http: reqwest::Client,
    fred_base_url: String,
    indeed_base_url: String,
    fred_api_key: Option<String>,
    policy: FetchPolicy,
}

fn new_run_id() -> String {
    let mut bytes = [0_u8; 16];
    rand::thread_rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn series_meta(spec: &SeriesSpec) -> SeriesMeta {
    SeriesMeta {
        name: spec.name.to_string(),
        frequency: spec.frequency,
        unit: spec.unit.to_string(),
        note: spec.note.map(str::to_string),
    }
}

impl Refresher {
    pub fn new(
        store: Arc<dyn KvStore>,
        fred_base_url: impl Into<String>,
        indeed_base_url: impl Into<String>,
        fred_api_key: Option<String>,
    ) -> Result<Self, RefreshError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("macropulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RefreshError(format!("http client init failed: {e}")))?;
        Ok(Self {
            store,
            http,
            fred_base_url: fred_base_url.into(),
            indeed_base_url: indeed_base_url.into(),
            fred_api_key,
            policy: FetchPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn run(&self, trigger: Trigger) -> RefreshOutcome {
        let run_id = new_run_id();
        let started = Instant::now();
        let store = self.store.as_ref();

        if let Err(e) = put_text(store, KEY_LAST_ATTEMPT, &iso_now()).await {
            warn!(run_id = %run_id, "recording last_attempt failed: {e}");
        }

        match acquire_refresh_lock(store, &run_id).await {
            Ok(()) => {}
            Err(err @ LockError::Held { .. }) => {
                let reason = err.to_string();
                info!(run_id = %run_id, trigger = trigger.as_str(), reason = %reason, "refresh skipped");
                self.log_run(RunLogEntry {
                    ts: iso_now(),
                    ok: false,
                    skipped: Some(true),
                    reason: Some(reason.clone()),
                    error: None,
                    trigger,
                    run_id,
                    duration_ms: started.elapsed().as_millis() as u64,
                    version: None,
                    warnings_count: None,
                })
                .await;
                return RefreshOutcome::Skipped { reason };
            }
            Err(err) => {
                return self
                    .record_failure(trigger, &run_id, started, err.to_string())
                    .await;
            }
        }

        let result = self.execute(trigger, &run_id).await;

        if let Err(e) = release_refresh_lock(store, &run_id).await {
            warn!(run_id = %run_id, "lock release failed: {e}");
        }

        match result {
            Ok(published) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                self.record_success(&published, duration_ms).await;
                self.log_run(RunLogEntry {
                    ts: iso_now(),
                    ok: true,
                    skipped: None,
                    reason: None,
                    error: None,
                    trigger,
                    run_id: run_id.clone(),
                    duration_ms,
                    version: Some(published.version.clone()),
                    warnings_count: Some(published.warnings.len() as u32),
                })
                .await;
                info!(
                    run_id = %run_id,
                    trigger = trigger.as_str(),
                    version = %published.version,
                    warnings = published.warnings.len(),
                    duration_ms,
                    "refresh published"
                );
                RefreshOutcome::Completed {
                    generated_at: published.generated_at,
                    version: published.version,
                    warnings: published.warnings,
                    run_id,
                }
            }
            Err(err) => self.record_failure(trigger, &run_id, started, err.0).await,
        }
    }

    async fn execute(&self, trigger: Trigger, run_id: &str) -> Result<Published, RefreshError> {
        let store = self.store.as_ref();
        let api_key = self
            .fred_api_key
            .clone()
            .ok_or_else(|| RefreshError("FRED_API_KEY is not configured".to_string()))?;

        let observation_start = Utc::now()
            .date_naive()
            .checked_sub_months(Months::new(60))
            .unwrap_or_else(|| Utc::now().date_naive())
            .to_string();

        let prev_fred: Option<FredRaw> = self.read_latest_snapshot(SnapshotKind::FredRaw).await;
        let prev_indeed: Option<IndeedRaw> =
            self.read_latest_snapshot(SnapshotKind::IndeedRaw).await;

        let mut tasks = Vec::with_capacity(SERIES_CATALOG.len());
        for spec in SERIES_CATALOG {
            let client = self.http.clone();
            let base = self.fred_base_url.clone();
            let key = api_key.clone();
            let start = observation_start.clone();
            let policy = self.policy.clone();
            tasks.push(tokio::spawn(async move {
                let result =
                    fetch_fred_series(&client, &base, &key, spec.id, &start, &policy).await;
                (spec, result)
            }));
        }

        let mut groups: BTreeMap<String, BTreeMap<String, Series>> = BTreeMap::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut fred_fallbacks = 0_u32;
        let mut missing: Vec<String> = Vec::new();

        for task in tasks {
            let (spec, result) = task
                .await
                .map_err(|e| RefreshError(format!("series fetch task failed: {e}")))?;
            let group = groups.entry(spec.link.as_str().to_string()).or_default();
            match result {
                Ok(observations) => {
                    group.insert(
                        spec.id.to_string(),
                        Series::new(series_meta(&spec), Some(spec.id.to_string()), observations),
                    );
                }
                Err(err) => {
                    if let Some(previous) =
                        prev_fred.as_ref().and_then(|p| p.find_series(spec.id))
                    {
                        warn!(run_id = %run_id, series = spec.id, "using previous snapshot: {err}");
                        group.insert(spec.id.to_string(), previous.clone());
                        fred_fallbacks += 1;
                        warnings.push(format!("FRED {} fallback to previous snapshot", spec.id));
                    } else {
                        missing.push(format!("{} ({err})", spec.id));
                    }
                }
            }
        }

        if !missing.is_empty() {
            return Err(RefreshError(format!(
                "missing series with no fallback: {}",
                missing.join(", ")
            )));
        }

        let fred = FredRaw {
            fetched_at: iso_now(),
            chain_links: groups,
        };

        let (indeed, indeed_stale) =
            match fetch_indeed(&self.http, &self.indeed_base_url, &self.policy).await {
                Ok(raw) => (raw, false),
                Err(err) => match prev_indeed {
                    Some(previous) => {
                        warn!(run_id = %run_id, "using previous Indeed snapshot: {err}");
                        warnings.push("Indeed fetch failed; reusing previous snapshot".to_string());
                        (previous, true)
                    }
                    None => {
                        return Err(RefreshError(format!(
                            "indeed fetch failed with no fallback: {err}"
                        )));
                    }
                },
            };

        let mut derived = BTreeMap::new();
        derived.insert("ghost_gdp".to_string(), ghost_gdp(&fred));
        derived.insert(
            "displacement_velocity".to_string(),
            displacement_velocity(&fred),
        );
        let links = chain_links(&fred);
        let composite = composite_index(&links);

        let generated_at = iso_now();
        let version = publication_version(Utc::now().timestamp_millis(), run_id);
        let snapshot = IndicatorsSnapshot {
            generated_at: generated_at.clone(),
            fred_fetched_at: Some(fred.fetched_at.clone()),
            indeed_fetched_at: Some(indeed.fetched_at.clone()),
            composite_index: composite,
            derived_indicators: derived,
            chain_links: links,
            pipeline: PipelineMeta {
                version: version.clone(),
                trigger,
                run_id: run_id.to_string(),
                source_status: SourceStatusMap {
                    fred: if fred_fallbacks > 0 {
                        SourceStatus::Stale
                    } else {
                        SourceStatus::Fresh
                    },
                    indeed: if indeed_stale {
                        SourceStatus::Stale
                    } else {
                        SourceStatus::Fresh
                    },
                },
                fallback_counts: FallbackCounts {
                    fred_series: fred_fallbacks,
                },
                warnings: warnings.clone(),
            },
        };

        let indicators_bytes = serde_json::to_vec(&snapshot)
            .map_err(|e| RefreshError(format!("encode indicators: {e}")))?;
        let fred_bytes = serde_json::to_vec(&fred)
            .map_err(|e| RefreshError(format!("encode fred_raw: {e}")))?;
        let indeed_bytes = serde_json::to_vec(&indeed)
            .map_err(|e| RefreshError(format!("encode indeed_raw: {e}")))?;

        publish_version(store, &version, indicators_bytes, fred_bytes, indeed_bytes)
            .await
            .map_err(|e| RefreshError(format!("publish failed: {e}")))?;

        Ok(Published {
            generated_at,
            version,
            warnings,
        })
    }

    async fn read_latest_snapshot<T: serde::de::DeserializeOwned>(
        &self,
        kind: SnapshotKind,
    ) -> Option<T> {
        match read_latest(self.store.as_ref(), kind).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(kind = kind.as_str(), "reading previous snapshot failed: {e}");
                None
            }
        }
    }

    async fn record_success(&self, published: &Published, duration_ms: u64) {
        let store = self.store.as_ref();
        let writes = [
            (KEY_LAST_UPDATED, published.generated_at.clone()),
            (KEY_LAST_SUCCESS, published.generated_at.clone()),
            (KEY_LAST_ERROR, String::new()),
            (KEY_CONSECUTIVE_FAILURES, "0".to_string()),
            (KEY_LAST_DURATION_MS, duration_ms.to_string()),
        ];
        for (key, value) in writes {
            if let Err(e) = put_text(store, key, &value).await {
                warn!(key, "metadata write failed: {e}");
            }
        }
    }

    async fn record_failure(
        &self,
        trigger: Trigger,
        run_id: &str,
        started: Instant,
        message: String,
    ) -> RefreshOutcome {
        let store = self.store.as_ref();
        let duration_ms = started.elapsed().as_millis() as u64;
        let failures = read_consecutive_failures(store).await + 1;

        error!(run_id = %run_id, trigger = trigger.as_str(), "refresh failed: {message}");
        let writes = [
            (KEY_LAST_ERROR, message.clone()),
            (KEY_CONSECUTIVE_FAILURES, failures.to_string()),
            (KEY_LAST_DURATION_MS, duration_ms.to_string()),
        ];
        for (key, value) in writes {
            if let Err(e) = put_text(store, key, &value).await {
                warn!(key, "metadata write failed: {e}");
            }
        }

        self.log_run(RunLogEntry {
            ts: iso_now(),
            ok: false,
            skipped: None,
            reason: None,
            error: Some(message.clone()),
            trigger,
            run_id: run_id.to_string(),
            duration_ms,
            version: None,
            warnings_count: None,
        })
        .await;

        RefreshOutcome::Failed { error: message }
    }

    async fn log_run(&self, entry: RunLogEntry) {
        if let Err(e) = append_run_log(self.store.as_ref(), entry).await {
            warn!("run log append failed: {e}");
        }
    }
}
