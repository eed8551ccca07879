// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use macropulse_model::{Frequency, IndeedRaw, Observation, Series, SeriesMeta, TARGET_SECTORS};

use crate::client::{fetch_text, FetchPolicy};
use crate::error::{FetchError, FetchErrorCode};

pub const INDEED_DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/hiring-lab/job_postings_tracker/master";

const SOURCE: &str = "Indeed Hiring Lab (CC-BY-4.0)";
const ATTRIBUTION: &str = "Indeed Hiring Lab, https://github.com/hiring-lab/job_postings_tracker";

/// Daily data back two years is all the dashboard charts.
const MAX_OBSERVATIONS: usize = 730;

/// Naive CSV row access: split on commas, index by header position. The
/// upstream datasets never emit quoted commas; rows with a stray column count
/// are skipped rather than guessed at.
struct CsvTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    fn parse(text: &str) -> Self {
        let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));
        let header: Vec<String> = lines
            .next()
            .unwrap_or_default()
            .split(',')
            .map(str::to_string)
            .collect();
        let width = header.len();
        let rows = lines
            .filter(|l| !l.is_empty())
            .map(|l| l.split(',').map(str::to_string).collect::<Vec<_>>())
            .filter(|cols| cols.len() == width)
            .collect();
        Self { header, rows }
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

fn trim_tail(mut observations: Vec<Observation>) -> Vec<Observation> {
    if observations.len() > MAX_OBSERVATIONS {
        observations.drain(..observations.len() - MAX_OBSERVATIONS);
    }
    observations
}

fn parse_aggregate(text: &str) -> Vec<Observation> {
    let table = CsvTable::parse(text);
    let (Some(date_col), Some(sa_col), Some(nsa_col)) = (
        table.column("date"),
        table.column("indeed_job_postings_index_SA"),
        table.column("indeed_job_postings_index"),
    ) else {
        return Vec::new();
    };

    let observations = table
        .rows
        .iter()
        .filter_map(|row| {
            let date = row[date_col].as_str();
            if date.is_empty() {
                return None;
            }
            let raw = if row[sa_col].is_empty() {
                row[nsa_col].as_str()
            } else {
                row[sa_col].as_str()
            };
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|value| Observation::new(date, value))
        })
        .collect();
    trim_tail(observations)
}

fn parse_sectors(text: &str) -> BTreeMap<String, Vec<Observation>> {
    let table = CsvTable::parse(text);
    let (Some(date_col), Some(name_col), Some(var_col), Some(value_col)) = (
        table.column("date"),
        table.column("display_name"),
        table.column("variable"),
        table.column("indeed_job_postings_index"),
    ) else {
        return BTreeMap::new();
    };

    let mut sectors: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for row in &table.rows {
        let sector = row[name_col].as_str();
        if !TARGET_SECTORS.contains(&sector) || row[var_col] != "total postings" {
            continue;
        }
        let date = row[date_col].as_str();
        if date.is_empty() {
            continue;
        }
        let Some(value) = row[value_col].parse::<f64>().ok().filter(|v| v.is_finite()) else {
            continue;
        };
        sectors
            .entry(sector.to_string())
            .or_default()
            .push(Observation::new(date, value));
    }
    sectors
        .into_iter()
        .map(|(sector, observations)| (sector, trim_tail(observations)))
        .collect()
}

fn aggregate_series(observations: Vec<Observation>) -> Series {
    Series::new(
        SeriesMeta {
            name: "Indeed Job Postings Index (SA)".to_string(),
            frequency: Frequency::Daily,
            unit: "index_feb2020_100".to_string(),
            note: Some("Seasonally adjusted. 100 = Feb 1, 2020 baseline.".to_string()),
        },
        None,
        observations,
    )
}

fn sector_series(sector: &str, observations: Vec<Observation>) -> Series {
    Series::new(
        SeriesMeta {
            name: format!("Indeed Postings: {sector}"),
            frequency: Frequency::Daily,
            unit: "index_feb2020_100".to_string(),
            note: None,
        },
        None,
        observations,
    )
}

/// Fetches and projects both Indeed datasets. The two CSV downloads run as a
/// concurrent pair; either failing fails the whole fetch.
pub async fn fetch_indeed(
    client: &reqwest::Client,
    base_url: &str,
    policy: &FetchPolicy,
) -> Result<IndeedRaw, FetchError> {
    let aggregate_url = format!("{base_url}/US/aggregate_job_postings_US.csv");
    let sectors_url = format!("{base_url}/US/job_postings_by_sector_US.csv");

    let (aggregate_text, sectors_text) = tokio::join!(
        fetch_text(client.get(aggregate_url), "Indeed aggregate", policy),
        fetch_text(client.get(sectors_url), "Indeed sectors", policy),
    );
    let aggregate_text = aggregate_text?;
    let sectors_text = sectors_text?;

    let aggregate = parse_aggregate(&aggregate_text);
    if aggregate.is_empty() {
        return Err(FetchError::empty(
            FetchErrorCode::EmptyAggregate,
            "Indeed aggregate",
        ));
    }

    let sectors = parse_sectors(&sectors_text);
    if sectors.values().all(|obs| obs.is_empty()) {
        return Err(FetchError::empty(
            FetchErrorCode::EmptySectors,
            "Indeed sectors",
        ));
    }

    Ok(IndeedRaw {
        fetched_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        source: SOURCE.to_string(),
        attribution: ATTRIBUTION.to_string(),
        aggregate: aggregate_series(aggregate),
        sectors: sectors
            .into_iter()
            .map(|(sector, observations)| {
                let series = sector_series(&sector, observations);
                (sector, series)
            })
            .collect(),
    })
}
