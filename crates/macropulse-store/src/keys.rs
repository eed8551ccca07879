// SPDX-License-Identifier: Apache-2.0

//! The fixed key set. Readers resolve "latest" through `latest:version`; the
//! direct `latest:*` keys survive for older dashboard builds.

pub const KEY_LATEST_VERSION: &str = "latest:version";
pub const KEY_LAST_UPDATED: &str = "meta:last_updated";
pub const KEY_LAST_ATTEMPT: &str = "meta:last_attempt";
pub const KEY_LAST_SUCCESS: &str = "meta:last_success";
pub const KEY_LAST_ERROR: &str = "meta:last_error";
pub const KEY_CONSECUTIVE_FAILURES: &str = "meta:consecutive_failures";
pub const KEY_LAST_DURATION_MS: &str = "meta:last_duration_ms";
pub const KEY_RUN_LOG: &str = "meta:run_log";
pub const KEY_REFRESH_LOCK: &str = "lock:refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Indicators,
    FredRaw,
    IndeedRaw,
}

impl SnapshotKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Indicators => "indicators",
            Self::FredRaw => "fred_raw",
            Self::IndeedRaw => "indeed_raw",
        }
    }
}

#[must_use]
pub fn snap_key(version: &str, kind: SnapshotKind) -> String {
    format!("snap:{version}:{}", kind.as_str())
}

#[must_use]
pub fn legacy_key(kind: SnapshotKind) -> String {
    format!("latest:{}", kind.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_shapes() {
        assert_eq!(
            snap_key("1700000000000-abcd1234", SnapshotKind::FredRaw),
            "snap:1700000000000-abcd1234:fred_raw"
        );
        assert_eq!(legacy_key(SnapshotKind::Indicators), "latest:indicators");
        assert_eq!(KEY_LATEST_VERSION, "latest:version");
    }
}
