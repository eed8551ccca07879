#![forbid(unsafe_code)]
//! Macropulse model SSOT.
//!
//! Plain data types shared by every other crate: observations and series,
//! chain-link identities, status classification labels, the published
//! snapshot shapes, and the static catalog of upstream series.

mod catalog;
mod pipeline;
mod series;
mod snapshot;
mod status;
mod version;

pub use catalog::{
    series_spec, ChainLink, SeriesSpec, SCORED_LINKS, SERIES_CATALOG, TARGET_SECTORS,
};
pub use pipeline::{
    FallbackCounts, PipelineMeta, RunLogEntry, SourceStatus, SourceStatusMap, Trigger,
};
pub use series::{Frequency, Observation, Series, SeriesMeta};
pub use snapshot::{
    Composite, DerivedIndicator, FredRaw, IndeedRaw, IndicatorEntry, IndicatorsSnapshot,
    LinkResult,
};
pub use status::Status;
pub use version::publication_version;

pub const CRATE_NAME: &str = "macropulse-model";
