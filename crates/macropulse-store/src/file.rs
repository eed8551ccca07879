// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::kv::KvStore;

/// File-backed store: one JSON envelope per key under a root directory, so
/// published snapshots survive restarts. Writes land in a temp file first and
/// are renamed into place.
pub struct FileKv {
    root: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at_ms: Option<u64>,
    value_b64: String,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

fn file_name_for(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 5);
    for c in key.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => name.push(c),
            ':' => name.push_str("__"),
            _ => name.push('-'),
        }
    }
    name.push_str(".json");
    name
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut f = std::fs::File::create(path).map_err(|e| StoreError::io(e.to_string()))?;
    f.write_all(bytes).map_err(|e| StoreError::io(e.to_string()))?;
    f.sync_all().map_err(|e| StoreError::io(e.to_string()))?;
    Ok(())
}

impl FileKv {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StoreError::io(e.to_string()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(file_name_for(key))
    }
}

#[async_trait]
impl KvStore for FileKv {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(e.to_string())),
        };
        let envelope: Envelope = serde_json::from_slice(&raw)
            .map_err(|e| StoreError::codec(format!("corrupt envelope for {key}: {e}")))?;
        if let Some(expires) = envelope.expires_at_ms {
            if expires <= now_ms() {
                let _ = std::fs::remove_file(&path);
                return Ok(None);
            }
        }
        BASE64
            .decode(envelope.value_b64.as_bytes())
            .map(Some)
            .map_err(|e| StoreError::codec(format!("corrupt value for {key}: {e}")))
    }

    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let envelope = Envelope {
            expires_at_ms: ttl.map(|d| now_ms() + d.as_millis() as u64),
            value_b64: BASE64.encode(&value),
        };
        let bytes = serde_json::to_vec(&envelope)
            .map_err(|e| StoreError::codec(e.to_string()))?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        write_and_sync(&tmp, &bytes)?;
        std::fs::rename(&tmp, &path).map_err(|e| StoreError::io(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(e.to_string())),
        }
    }
}
