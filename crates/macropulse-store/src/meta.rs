// SPDX-License-Identifier: Apache-2.0

use macropulse_model::RunLogEntry;
use tracing::warn;

use crate::error::StoreError;
use crate::keys::{KEY_CONSECUTIVE_FAILURES, KEY_RUN_LOG};
use crate::kv::{put_json, KvStore};

/// The run log keeps only recent history; older entries fall off the end.
pub const RUN_LOG_CAP: usize = 50;

pub async fn get_text(store: &dyn KvStore, key: &str) -> Result<Option<String>, StoreError> {
    Ok(store
        .get(key)
        .await?
        .and_then(|bytes| String::from_utf8(bytes).ok()))
}

pub async fn put_text(store: &dyn KvStore, key: &str, value: &str) -> Result<(), StoreError> {
    store.put(key, value.as_bytes().to_vec(), None).await
}

/// Stored as decimal text; anything unreadable counts as zero.
pub async fn read_consecutive_failures(store: &dyn KvStore) -> u32 {
    match get_text(store, KEY_CONSECUTIVE_FAILURES).await {
        Ok(Some(text)) => text.trim().parse().unwrap_or(0),
        Ok(None) => 0,
        Err(e) => {
            warn!("reading consecutive_failures failed: {e}");
            0
        }
    }
}

pub async fn read_run_log(store: &dyn KvStore) -> Vec<RunLogEntry> {
    match store.get(KEY_RUN_LOG).await {
        Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("reading run log failed: {e}");
            Vec::new()
        }
    }
}

/// Prepends the entry and truncates to the cap. Most-recent-first so readers
/// get the interesting entries without paging.
pub async fn append_run_log(store: &dyn KvStore, entry: RunLogEntry) -> Result<(), StoreError> {
    let mut entries = read_run_log(store).await;
    entries.insert(0, entry);
    entries.truncate(RUN_LOG_CAP);
    put_json(store, KEY_RUN_LOG, &entries, None).await
}
