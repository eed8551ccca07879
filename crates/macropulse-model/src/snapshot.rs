// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineMeta;
use crate::series::Series;
use crate::status::Status;

/// Raw FRED payload for one refresh: every configured series, grouped by
/// chain link. Each series id appears under exactly one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FredRaw {
    pub fetched_at: String,
    pub chain_links: BTreeMap<String, BTreeMap<String, Series>>,
}

impl FredRaw {
    #[must_use]
    pub fn find_series(&self, series_id: &str) -> Option<&Series> {
        self.chain_links
            .values()
            .find_map(|group| group.get(series_id))
    }

    /// Observations for a series, or an empty slice when it is absent.
    #[must_use]
    pub fn observations(&self, series_id: &str) -> &[crate::series::Observation] {
        match self.find_series(series_id) {
            Some(series) => &series.observations,
            None => &[],
        }
    }
}

/// Raw Indeed Hiring Lab payload: the aggregate postings index plus the
/// configured white-collar sectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndeedRaw {
    pub fetched_at: String,
    pub source: String,
    pub attribution: String,
    pub aggregate: Series,
    pub sectors: BTreeMap<String, Series>,
}

/// Per-indicator line inside a chain link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorEntry {
    pub z: Option<f64>,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkResult {
    pub name: String,
    pub status: Status,
    pub z_score: Option<f64>,
    pub indicators: BTreeMap<String, IndicatorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedIndicator {
    pub name: String,
    pub description: String,
    pub value: Option<f64>,
    pub components: BTreeMap<String, Option<f64>>,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    pub value: f64,
    pub scale: String,
    pub chain_link_statuses: BTreeMap<String, u32>,
    pub interpretation: String,
}

/// The published, versioned indicators dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorsSnapshot {
    pub generated_at: String,
    pub fred_fetched_at: Option<String>,
    pub indeed_fetched_at: Option<String>,
    pub composite_index: Composite,
    pub derived_indicators: BTreeMap<String, DerivedIndicator>,
    pub chain_links: BTreeMap<String, LinkResult>,
    pub pipeline: PipelineMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Frequency, Observation, SeriesMeta};

    fn series(id: &str, values: &[f64]) -> Series {
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation::new(format!("2025-01-{:02}", i + 1), *v))
            .collect();
        Series::new(
            SeriesMeta {
                name: id.to_string(),
                frequency: Frequency::Monthly,
                unit: "percent".to_string(),
                note: None,
            },
            Some(id.to_string()),
            observations,
        )
    }

    #[test]
    fn find_series_searches_every_link() {
        let mut links: BTreeMap<String, BTreeMap<String, Series>> = BTreeMap::new();
        links
            .entry("displacement".to_string())
            .or_default()
            .insert("UNRATE".to_string(), series("UNRATE", &[4.0, 4.1]));
        links
            .entry("spending".to_string())
            .or_default()
            .insert("RSAFS".to_string(), series("RSAFS", &[700.0]));
        let raw = FredRaw {
            fetched_at: "2026-01-01T00:00:00Z".to_string(),
            chain_links: links,
        };
        assert_eq!(raw.find_series("RSAFS").map(|s| s.count), Some(1));
        assert_eq!(raw.observations("UNRATE").len(), 2);
        assert!(raw.observations("MISSING").is_empty());
    }
}
