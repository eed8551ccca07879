// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// One dated data point. Fetchers only construct observations with finite
/// values and ISO (`YYYY-MM-DD`) dates; everything downstream relies on that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: String,
    pub value: f64,
}

impl Observation {
    #[must_use]
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }

    /// Number of periods that make up one year at this frequency.
    #[must_use]
    pub const fn yoy_periods(self) -> usize {
        match self {
            Self::Daily => 252,
            Self::Weekly => 52,
            Self::Monthly => 12,
            Self::Quarterly => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMeta {
    pub name: String,
    pub frequency: Frequency,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A named series with its observations in strictly ascending date order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(flatten)]
    pub meta: SeriesMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    pub observations: Vec<Observation>,
    pub latest: Option<Observation>,
    pub count: usize,
}

impl Series {
    /// Builds a series, restoring the ordering invariant: observations are
    /// sorted ascending by date and exact-date duplicates keep the last value.
    #[must_use]
    pub fn new(
        meta: SeriesMeta,
        series_id: Option<String>,
        mut observations: Vec<Observation>,
    ) -> Self {
        observations.sort_by(|a, b| a.date.cmp(&b.date));
        observations.dedup_by(|next, prev| {
            if next.date == prev.date {
                prev.value = next.value;
                true
            } else {
                false
            }
        });
        let latest = observations.last().cloned();
        let count = observations.len();
        Self {
            meta,
            series_id,
            observations,
            latest,
            count,
        }
    }

    #[must_use]
    pub fn is_strictly_ascending(&self) -> bool {
        self.observations
            .windows(2)
            .all(|pair| pair[0].date < pair[1].date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> SeriesMeta {
        SeriesMeta {
            name: "Overall Unemployment Rate".to_string(),
            frequency: Frequency::Monthly,
            unit: "percent".to_string(),
            note: None,
        }
    }

    #[test]
    fn series_new_restores_ordering_and_latest() {
        let s = Series::new(
            meta(),
            Some("UNRATE".to_string()),
            vec![
                Observation::new("2025-02-01", 4.1),
                Observation::new("2025-01-01", 4.0),
                Observation::new("2025-02-01", 4.2),
            ],
        );
        assert!(s.is_strictly_ascending());
        assert_eq!(s.count, 2);
        assert_eq!(s.latest.as_ref().map(|o| o.value), Some(4.2));
    }

    #[test]
    fn empty_series_has_no_latest() {
        let s = Series::new(meta(), None, Vec::new());
        assert_eq!(s.latest, None);
        assert_eq!(s.count, 0);
    }

    #[test]
    fn series_serializes_meta_inline() {
        let s = Series::new(
            meta(),
            Some("UNRATE".to_string()),
            vec![Observation::new("2025-01-01", 4.0)],
        );
        let v = serde_json::to_value(&s).expect("serialize series");
        assert_eq!(v["frequency"], "monthly");
        assert_eq!(v["series_id"], "UNRATE");
        assert_eq!(v["count"], 1);
        assert_eq!(v["latest"]["date"], "2025-01-01");
        assert!(v.get("note").is_none());
    }

    #[test]
    fn yoy_periods_per_frequency() {
        assert_eq!(Frequency::Monthly.yoy_periods(), 12);
        assert_eq!(Frequency::Quarterly.yoy_periods(), 4);
        assert_eq!(Frequency::Weekly.yoy_periods(), 52);
        assert_eq!(Frequency::Daily.yoy_periods(), 252);
    }
}
