#![forbid(unsafe_code)]
//! Pure computation over fetched series: no IO, no clocks, deterministic for
//! a given input snapshot.

mod classify;
mod composite;
mod derived;
mod links;
mod stats;

pub use classify::classify;
pub use composite::composite_index;
pub use derived::{displacement_velocity, ghost_gdp};
pub use links::chain_links;
pub use stats::{pct_change, yoy_change, z_score_vs_history, Z_LOOKBACK};

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub const CRATE_NAME: &str = "macropulse-compute";
