#![forbid(unsafe_code)]
//! Snapshot storage: a small byte-oriented key-value abstraction with
//! optional TTLs, the fixed key set of the pipeline, the atomic versioned
//! publication protocol, the refresh lock, and the bounded run log.

mod error;
mod file;
mod keys;
mod kv;
mod lock;
mod memory;
mod meta;
mod publish;

pub use error::{StoreError, StoreErrorCode};
pub use file::FileKv;
pub use keys::{
    legacy_key, snap_key, SnapshotKind, KEY_CONSECUTIVE_FAILURES, KEY_LAST_ATTEMPT,
    KEY_LAST_DURATION_MS, KEY_LAST_ERROR, KEY_LAST_SUCCESS, KEY_LAST_UPDATED,
    KEY_LATEST_VERSION, KEY_REFRESH_LOCK, KEY_RUN_LOG,
};
pub use kv::{get_json, put_json, KvStore};
pub use lock::{acquire_refresh_lock, release_refresh_lock, LockError, RefreshLock, LOCK_TTL};
pub use memory::MemoryKv;
pub use meta::{
    append_run_log, get_text, put_text, read_consecutive_failures, read_run_log, RUN_LOG_CAP,
};
pub use publish::{publish_version, read_latest};

pub const CRATE_NAME: &str = "macropulse-store";
