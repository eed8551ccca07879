// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// What started a refresh run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Cron,
    Manual,
}

impl Trigger {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cron => "cron",
            Self::Manual => "manual",
        }
    }
}

/// Whether a source's data in the published snapshot came from a live fetch
/// or from the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Fresh,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatusMap {
    pub fred: SourceStatus,
    pub indeed: SourceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackCounts {
    pub fred_series: u32,
}

/// Provenance metadata attached to every published indicators snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMeta {
    pub version: String,
    pub trigger: Trigger,
    pub run_id: String,
    pub source_status: SourceStatusMap,
    pub fallback_counts: FallbackCounts,
    pub warnings: Vec<String>,
}

/// One entry in the bounded, most-recent-first run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub ts: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub trigger: Trigger,
    pub run_id: String,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings_count: Option<u32>,
}
