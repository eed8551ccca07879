// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::keys::KEY_REFRESH_LOCK;
use crate::kv::{get_json, put_json, KvStore};

/// Advisory single-writer lock for the refresh pipeline. The TTL is a
/// backstop: a crashed refresh stops blocking successors after 15 minutes.
pub const LOCK_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshLock {
    pub owner: String,
    pub acquired_at: String,
    pub expires_at_ms: u64,
}

#[derive(Debug)]
pub enum LockError {
    /// A non-expired lock is already held.
    Held { owner: String },
    /// The lock read back after the write names a different owner.
    VerifyFailed,
    Store(StoreError),
}

impl Display for LockError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Held { owner } => write!(f, "refresh locked by {owner}"),
            Self::VerifyFailed => write!(f, "lock verification failed"),
            Self::Store(e) => write!(f, "lock store error: {e}"),
        }
    }
}

impl std::error::Error for LockError {}

impl From<StoreError> for LockError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

fn iso_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Acquires the refresh lock for `owner`, then re-reads to verify ownership;
/// the store is only guaranteed per-key atomicity, so the verify step guards
/// against a racing writer landing after ours.
pub async fn acquire_refresh_lock(store: &dyn KvStore, owner: &str) -> Result<(), LockError> {
    let now = unix_millis();
    if let Some(existing) = get_json::<RefreshLock>(store, KEY_REFRESH_LOCK).await? {
        if existing.expires_at_ms > now {
            return Err(LockError::Held {
                owner: existing.owner,
            });
        }
    }

    let lock = RefreshLock {
        owner: owner.to_string(),
        acquired_at: iso_now(),
        expires_at_ms: now + LOCK_TTL.as_millis() as u64,
    };
    put_json(store, KEY_REFRESH_LOCK, &lock, Some(LOCK_TTL)).await?;

    match get_json::<RefreshLock>(store, KEY_REFRESH_LOCK).await? {
        Some(read_back) if read_back.owner == owner => Ok(()),
        _ => Err(LockError::VerifyFailed),
    }
}

/// Deletes the lock if `owner` still holds it; someone else's lock is left
/// alone.
pub async fn release_refresh_lock(store: &dyn KvStore, owner: &str) -> Result<(), StoreError> {
    match get_json::<RefreshLock>(store, KEY_REFRESH_LOCK).await? {
        Some(lock) if lock.owner == owner => store.delete(KEY_REFRESH_LOCK).await,
        _ => Ok(()),
    }
}
