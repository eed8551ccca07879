// SPDX-License-Identifier: Apache-2.0

use crate::error::StoreError;
use crate::keys::{legacy_key, snap_key, SnapshotKind, KEY_LATEST_VERSION};
use crate::kv::KvStore;

/// Publishes one version atomically enough for non-transactional stores: all
/// three per-version payloads are written (concurrently) before the pointer
/// flips, and the legacy direct keys are refreshed only after the flip. A
/// reader racing the flip sees the previous coherent version.
pub async fn publish_version(
    store: &dyn KvStore,
    version: &str,
    indicators: Vec<u8>,
    fred_raw: Vec<u8>,
    indeed_raw: Vec<u8>,
) -> Result<(), StoreError> {
    let key_indicators = snap_key(version, SnapshotKind::Indicators);
    let key_fred_raw = snap_key(version, SnapshotKind::FredRaw);
    let key_indeed_raw = snap_key(version, SnapshotKind::IndeedRaw);
    let (a, b, c) = tokio::join!(
        store.put(&key_indicators, indicators.clone(), None),
        store.put(&key_fred_raw, fred_raw.clone(), None),
        store.put(&key_indeed_raw, indeed_raw.clone(), None),
    );
    a?;
    b?;
    c?;

    store
        .put(KEY_LATEST_VERSION, version.as_bytes().to_vec(), None)
        .await?;

    store
        .put(&legacy_key(SnapshotKind::Indicators), indicators, None)
        .await?;
    store
        .put(&legacy_key(SnapshotKind::FredRaw), fred_raw, None)
        .await?;
    store
        .put(&legacy_key(SnapshotKind::IndeedRaw), indeed_raw, None)
        .await?;
    Ok(())
}

/// Resolves the currently published payload of one kind: pointer first, then
/// the per-version key, then the legacy direct key for stores written before
/// versioning existed.
pub async fn read_latest(
    store: &dyn KvStore,
    kind: SnapshotKind,
) -> Result<Option<Vec<u8>>, StoreError> {
    if let Some(pointer) = store.get(KEY_LATEST_VERSION).await? {
        if let Ok(version) = String::from_utf8(pointer) {
            if let Some(bytes) = store.get(&snap_key(&version, kind)).await? {
                return Ok(Some(bytes));
            }
        }
    }
    store.get(&legacy_key(kind)).await
}
