// SPDX-License-Identifier: Apache-2.0

use macropulse_model::Observation;
use serde::Deserialize;

use crate::client::{fetch_text, FetchPolicy};
use crate::error::{FetchError, FetchErrorCode};

pub const FRED_DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org";

/// Permissive wire shape: FRED serializes every value as a string and uses a
/// literal `"."` for missing observations. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct ObservationsPage {
    #[serde(default)]
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    #[serde(default)]
    date: String,
    #[serde(default)]
    value: String,
}

/// Fetches one series' observations, ascending by date, with missing and
/// non-finite values filtered out. A series with nothing usable left is an
/// `empty-series` failure, never an empty success.
pub async fn fetch_fred_series(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    series_id: &str,
    observation_start: &str,
    policy: &FetchPolicy,
) -> Result<Vec<Observation>, FetchError> {
    let label = format!("FRED {series_id}");
    let request = client
        .get(format!("{base_url}/fred/series/observations"))
        .query(&[
            ("series_id", series_id),
            ("api_key", api_key),
            ("file_type", "json"),
            ("sort_order", "asc"),
            ("observation_start", observation_start),
        ]);

    let body = fetch_text(request, &label, policy).await?;
    let page: ObservationsPage =
        serde_json::from_str(&body).map_err(|e| FetchError::decode(&label, e.to_string()))?;

    let observations: Vec<Observation> = page
        .observations
        .into_iter()
        .filter(|raw| !raw.date.is_empty() && !raw.value.is_empty() && raw.value != ".")
        .filter_map(|raw| {
            raw.value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|value| Observation::new(raw.date, value))
        })
        .collect();

    if observations.is_empty() {
        return Err(FetchError::empty(FetchErrorCode::EmptySeries, &label));
    }
    Ok(observations)
}
