// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use macropulse_model::{DerivedIndicator, FredRaw, Frequency};

use crate::classify::classify;
use crate::round2;
use crate::stats::{pct_change, yoy_change};

/// Ghost GDP: productivity growing while real wages stagnate. Score is the
/// YoY gap in percentage points; a 2-point gap classifies as one sigma.
#[must_use]
pub fn ghost_gdp(fred: &FredRaw) -> DerivedIndicator {
    let prod_yoy = yoy_change(fred.observations("OPHNFB"), Frequency::Quarterly);
    let wage_yoy = yoy_change(fred.observations("LES1252881600Q"), Frequency::Quarterly);
    let score = match (prod_yoy, wage_yoy) {
        (Some(p), Some(w)) => Some(p - w),
        _ => None,
    };

    let mut components = BTreeMap::new();
    components.insert("productivity_yoy_pct".to_string(), prod_yoy.map(round2));
    components.insert("real_wage_yoy_pct".to_string(), wage_yoy.map(round2));

    DerivedIndicator {
        name: "Ghost GDP Score".to_string(),
        description: "Productivity growth minus real wage growth. Positive = output not reaching workers.".to_string(),
        value: score.map(round2),
        components,
        status: classify(score.map(|s| s / 2.0), false),
    }
}

/// Displacement velocity: white-collar unemployment deterioration relative to
/// the overall rate, over a 3-period window.
#[must_use]
pub fn displacement_velocity(fred: &FredRaw) -> DerivedIndicator {
    let prof_change = pct_change(fred.observations("LNU04032239"), 3);
    let info_change = pct_change(fred.observations("LNU04032237"), 3);
    let overall_change = pct_change(fred.observations("UNRATE"), 3);

    let avg_wc_change = match (prof_change, info_change) {
        (Some(prof), Some(info)) => Some((prof + info) / 2.0),
        _ => None,
    };

    let velocity = match (avg_wc_change, overall_change) {
        (Some(wc), Some(overall)) if overall != 0.0 => Some(wc / overall.abs()),
        _ => None,
    };

    let mut components = BTreeMap::new();
    components.insert("prof_biz_3mo_change_pct".to_string(), prof_change.map(round2));
    components.insert("info_3mo_change_pct".to_string(), info_change.map(round2));
    components.insert(
        "overall_3mo_change_pct".to_string(),
        overall_change.map(round2),
    );

    DerivedIndicator {
        name: "Displacement Velocity".to_string(),
        description: "White-collar unemployment change relative to overall. >1 = white-collar deteriorating faster.".to_string(),
        value: velocity.map(round2),
        components,
        status: classify(velocity.map(|v| v - 1.0), false),
    }
}
