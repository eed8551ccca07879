// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use macropulse_model::{ChainLink, FredRaw, IndicatorEntry, LinkResult};

use crate::classify::classify;
use crate::round2;
use crate::stats::z_score_vs_history;

fn mean_present(scores: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = scores.iter().copied().flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

fn indicator(z: Option<f64>, inverted: bool) -> IndicatorEntry {
    IndicatorEntry {
        z: z.map(round2),
        status: classify(z, inverted),
    }
}

fn link(
    chain: ChainLink,
    composite_z: Option<f64>,
    indicators: BTreeMap<String, IndicatorEntry>,
) -> LinkResult {
    LinkResult {
        name: chain.display_name().to_string(),
        status: classify(composite_z, false),
        z_score: composite_z.map(round2),
        indicators,
    }
}

/// Scores the five chain links from a raw FRED snapshot. An indicator whose
/// z-score is unavailable drops out of its link's mean; a link with no
/// usable indicators classifies as unknown.
#[must_use]
pub fn chain_links(fred: &FredRaw) -> BTreeMap<String, LinkResult> {
    let z = |id: &str| z_score_vs_history(fred.observations(id));
    let mut links = BTreeMap::new();

    // White-collar displacement: unemployment rates score directly, the
    // employment level is inverted (falling headcount = stress).
    let prof_z = z("LNU04032239");
    let info_z = z("LNU04032237");
    let emp_z = z("CES6054000001");
    let displacement_z = mean_present(&[prof_z, info_z, emp_z.map(|v| -v)]);
    let mut indicators = BTreeMap::new();
    indicators.insert("LNU04032239".to_string(), indicator(prof_z, false));
    indicators.insert("LNU04032237".to_string(), indicator(info_z, false));
    indicators.insert("CES6054000001".to_string(), indicator(emp_z, true));
    links.insert(
        ChainLink::Displacement.as_str().to_string(),
        link(ChainLink::Displacement, displacement_z, indicators),
    );

    // Consumer spending: all three are inverted as a group.
    let pce_z = z("PCEC96");
    let sent_z = z("UMCSENT");
    let retail_z = z("RSAFS");
    let spending_z = mean_present(&[pce_z, sent_z, retail_z]).map(|v| -v);
    let mut indicators = BTreeMap::new();
    indicators.insert("PCEC96".to_string(), indicator(pce_z, true));
    indicators.insert("UMCSENT".to_string(), indicator(sent_z, true));
    indicators.insert("RSAFS".to_string(), indicator(retail_z, true));
    links.insert(
        ChainLink::Spending.as_str().to_string(),
        link(ChainLink::Spending, spending_z, indicators),
    );

    // Ghost GDP link: declining money velocity is the stress signal.
    let m2v_z = z("M2V");
    let mut indicators = BTreeMap::new();
    indicators.insert("M2V".to_string(), indicator(m2v_z, true));
    links.insert(
        ChainLink::GhostGdp.as_str().to_string(),
        link(ChainLink::GhostGdp, m2v_z.map(|v| -v), indicators),
    );

    // Credit stress.
    let hy_z = z("BAMLH0A0HYM2");
    let ccc_z = z("BAMLH0A3HYC");
    let delinq_z = z("DRCLACBS");
    let credit_z = mean_present(&[hy_z, ccc_z, delinq_z]);
    let mut indicators = BTreeMap::new();
    indicators.insert("BAMLH0A0HYM2".to_string(), indicator(hy_z, false));
    indicators.insert("BAMLH0A3HYC".to_string(), indicator(ccc_z, false));
    indicators.insert("DRCLACBS".to_string(), indicator(delinq_z, false));
    links.insert(
        ChainLink::CreditStress.as_str().to_string(),
        link(ChainLink::CreditStress, credit_z, indicators),
    );

    // Mortgage stress.
    let mort_z = z("DRSFRMACBS");
    let mut indicators = BTreeMap::new();
    indicators.insert("DRSFRMACBS".to_string(), indicator(mort_z, false));
    links.insert(
        ChainLink::MortgageStress.as_str().to_string(),
        link(ChainLink::MortgageStress, mort_z, indicators),
    );

    links
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use macropulse_model::{
        Observation, Series, SeriesMeta, Status, SCORED_LINKS, SERIES_CATALOG,
    };

    /// Builds a FredRaw with the given (id, values) series placed under their
    /// configured links; dates are synthetic ascending.
    pub(crate) fn fred_with(series: &[(&str, &[f64])]) -> FredRaw {
        let mut chain_links: BTreeMap<String, BTreeMap<String, Series>> = BTreeMap::new();
        for (id, values) in series {
            let spec = macropulse_model::series_spec(id).expect("series in catalog");
            let observations = values
                .iter()
                .enumerate()
                .map(|(i, v)| Observation::new(format!("d{i:05}"), *v))
                .collect();
            let s = Series::new(
                SeriesMeta {
                    name: spec.name.to_string(),
                    frequency: spec.frequency,
                    unit: spec.unit.to_string(),
                    note: spec.note.map(str::to_string),
                },
                Some((*id).to_string()),
                observations,
            );
            chain_links
                .entry(spec.link.as_str().to_string())
                .or_default()
                .insert((*id).to_string(), s);
        }
        FredRaw {
            fetched_at: "2026-01-01T00:00:00Z".to_string(),
            chain_links,
        }
    }

    /// Every configured series seeded with the same flat history.
    pub(crate) fn flat_fred(value: f64, points: usize) -> FredRaw {
        let values = vec![value; points];
        let series: Vec<(&str, &[f64])> = SERIES_CATALOG
            .iter()
            .map(|spec| (spec.id, values.as_slice()))
            .collect();
        fred_with(&series)
    }

    #[test]
    fn all_flat_series_score_every_link_normal() {
        let fred = flat_fred(5.0, 60);
        let links = chain_links(&fred);
        assert_eq!(links.len(), SCORED_LINKS.len());
        for (name, link) in &links {
            assert_eq!(link.status, Status::Normal, "link {name}");
            assert_eq!(link.z_score, Some(0.0), "link {name}");
        }
        // Flat history means z = 0 for each indicator too, not null.
        let displacement = &links["displacement"];
        assert_eq!(displacement.indicators["CES6054000001"].z, Some(0.0));
    }

    #[test]
    fn credit_spike_elevates_the_credit_link_only() {
        let mut fred = flat_fred(5.0, 60);
        let mut values = vec![5.0; 59];
        values.push(12.0);
        let spiked = fred_with(&[("BAMLH0A0HYM2", &values)]);
        let credit = fred
            .chain_links
            .get_mut("credit_stress")
            .expect("credit link");
        credit.insert(
            "BAMLH0A0HYM2".to_string(),
            spiked.find_series("BAMLH0A0HYM2").expect("series").clone(),
        );

        let links = chain_links(&fred);
        let credit = &links["credit_stress"];
        assert!(
            matches!(credit.status, Status::Warning | Status::Critical),
            "spiked credit link should be warning or critical, got {}",
            credit.status
        );
        assert_eq!(
            credit.indicators["BAMLH0A0HYM2"].status,
            Status::Critical
        );
        assert_eq!(links["displacement"].status, Status::Normal);
        assert_eq!(links["mortgage_stress"].status, Status::Normal);
    }

    #[test]
    fn missing_indicators_drop_out_of_the_mean() {
        // Only one of the three credit series present, spiked.
        let mut values = vec![5.0; 59];
        values.push(12.0);
        let fred = fred_with(&[("BAMLH0A0HYM2", &values)]);
        let links = chain_links(&fred);
        let credit = &links["credit_stress"];
        // Mean over the single present z, not diluted by the missing two.
        assert_eq!(credit.status, Status::Critical);
        assert_eq!(credit.indicators["DRCLACBS"].z, None);
        assert_eq!(credit.indicators["DRCLACBS"].status, Status::Unknown);
    }

    #[test]
    fn link_with_no_data_is_unknown() {
        let fred = fred_with(&[]);
        let links = chain_links(&fred);
        for (name, link) in &links {
            assert_eq!(link.status, Status::Unknown, "link {name}");
            assert_eq!(link.z_score, None, "link {name}");
        }
    }

    #[test]
    fn spending_inversion_flips_the_sign() {
        // Sentiment collapsing: last value far below the window mean.
        let mut values = vec![100.0; 59];
        values.push(40.0);
        let fred = fred_with(&[("UMCSENT", &values)]);
        let links = chain_links(&fred);
        let spending = &links["spending"];
        // Raw z is strongly negative; the link negates it into stress.
        assert!(spending.z_score.expect("z") > 2.0);
        assert_eq!(spending.status, Status::Critical);
        assert_eq!(spending.indicators["UMCSENT"].status, Status::Critical);
        assert!(spending.indicators["UMCSENT"].z.expect("raw z") < 0.0);
    }
}
