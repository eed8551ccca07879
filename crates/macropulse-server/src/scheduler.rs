// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use macropulse_model::Trigger;

use crate::refresh::{RefreshOutcome, Refresher};

const CRON_STEP_SECS: i64 = 6 * 3600;

/// Next `0 */6 * * *` boundary strictly after `now` (UTC).
#[must_use]
pub fn next_cron_after(now: DateTime<Utc>) -> DateTime<Utc> {
    let secs = now.timestamp();
    let next = secs - secs.rem_euclid(CRON_STEP_SECS) + CRON_STEP_SECS;
    DateTime::from_timestamp(next, 0).unwrap_or(now + chrono::Duration::seconds(CRON_STEP_SECS))
}

/// Fires the refresh on the fixed six-hour cron cadence until the process
/// exits. Lock contention with a manual trigger surfaces as a skipped run.
pub fn spawn_scheduler(refresher: Arc<Refresher>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_cron_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next = %next.to_rfc3339(), "scheduler waiting for next refresh window");
            tokio::time::sleep(wait).await;

            match refresher.run(Trigger::Cron).await {
                RefreshOutcome::Completed { version, .. } => {
                    info!(version = %version, "scheduled refresh published");
                }
                RefreshOutcome::Skipped { reason } => {
                    info!(reason = %reason, "scheduled refresh skipped");
                }
                RefreshOutcome::Failed { error } => {
                    error!(error = %error, "scheduled refresh failed");
                }
            }
        }
    })
}
