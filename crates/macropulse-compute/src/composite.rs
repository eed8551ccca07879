// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use macropulse_model::{Composite, LinkResult};

use crate::round1;

fn interpret(score: f64) -> &'static str {
    if score >= 75.0 {
        "Critical: Multiple chain links showing severe stress"
    } else if score >= 50.0 {
        "Warning: Significant stress in the displacement chain"
    } else if score >= 25.0 {
        "Elevated: Early signals present in some chain links"
    } else {
        "Normal: No significant displacement signals detected"
    }
}

/// Collapses the per-link statuses into the 0-100 composite index.
#[must_use]
pub fn composite_index(links: &BTreeMap<String, LinkResult>) -> Composite {
    let scores: Vec<f64> = links.values().map(|l| l.status.score()).collect();
    let value = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    let value = round1(value);

    let mut chain_link_statuses: BTreeMap<String, u32> = BTreeMap::new();
    for link in links.values() {
        *chain_link_statuses
            .entry(link.status.as_str().to_string())
            .or_insert(0) += 1;
    }

    Composite {
        value,
        scale: "0-100 (0=all normal, 100=all critical)".to_string(),
        chain_link_statuses,
        interpretation: interpret(value).to_string(),
    }
}
