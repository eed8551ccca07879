// SPDX-License-Identifier: Apache-2.0

use crate::series::Frequency;

/// One of the five scored stress categories, plus the unscored context group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainLink {
    Displacement,
    Spending,
    GhostGdp,
    CreditStress,
    MortgageStress,
    Context,
}

impl ChainLink {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Displacement => "displacement",
            Self::Spending => "spending",
            Self::GhostGdp => "ghost_gdp",
            Self::CreditStress => "credit_stress",
            Self::MortgageStress => "mortgage_stress",
            Self::Context => "context",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Displacement => "White-Collar Displacement",
            Self::Spending => "Consumer Spending",
            Self::GhostGdp => "Ghost GDP",
            Self::CreditStress => "Credit Stress",
            Self::MortgageStress => "Mortgage & Housing Stress",
            Self::Context => "Context",
        }
    }
}

/// The five links that feed the composite, in scoring order.
pub const SCORED_LINKS: [ChainLink; 5] = [
    ChainLink::Displacement,
    ChainLink::Spending,
    ChainLink::GhostGdp,
    ChainLink::CreditStress,
    ChainLink::MortgageStress,
];

/// Static configuration for one upstream series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesSpec {
    pub id: &'static str,
    pub link: ChainLink,
    pub name: &'static str,
    pub frequency: Frequency,
    pub unit: &'static str,
    pub note: Option<&'static str>,
}

/// Every series the pipeline fetches, grouped by chain link. This set is
/// closed: ingestion, computation, and fallback all key off it.
pub const SERIES_CATALOG: [SeriesSpec; 17] = [
    SeriesSpec {
        id: "LNU04032239",
        link: ChainLink::Displacement,
        name: "Unemployment Rate: Professional & Business Services",
        frequency: Frequency::Monthly,
        unit: "percent",
        note: None,
    },
    SeriesSpec {
        id: "LNU04032237",
        link: ChainLink::Displacement,
        name: "Unemployment Rate: Information Industry",
        frequency: Frequency::Monthly,
        unit: "percent",
        note: None,
    },
    SeriesSpec {
        id: "CES6054000001",
        link: ChainLink::Displacement,
        name: "Employees: Professional, Scientific & Technical Services",
        frequency: Frequency::Monthly,
        unit: "thousands",
        note: None,
    },
    SeriesSpec {
        id: "UNRATE",
        link: ChainLink::Displacement,
        name: "Overall Unemployment Rate",
        frequency: Frequency::Monthly,
        unit: "percent",
        note: Some("Baseline comparator for white-collar vs overall"),
    },
    SeriesSpec {
        id: "PCEC96",
        link: ChainLink::Spending,
        name: "Real Personal Consumption Expenditures",
        frequency: Frequency::Monthly,
        unit: "billions_2017_dollars",
        note: None,
    },
    SeriesSpec {
        id: "UMCSENT",
        link: ChainLink::Spending,
        name: "Consumer Sentiment (UMich)",
        frequency: Frequency::Monthly,
        unit: "index_1966q1_100",
        note: None,
    },
    SeriesSpec {
        id: "RSAFS",
        link: ChainLink::Spending,
        name: "Advance Retail Sales: Retail and Food Services",
        frequency: Frequency::Monthly,
        unit: "millions_dollars",
        note: None,
    },
    SeriesSpec {
        id: "OPHNFB",
        link: ChainLink::GhostGdp,
        name: "Nonfarm Business Sector: Real Output Per Hour",
        frequency: Frequency::Quarterly,
        unit: "index_2017_100",
        note: None,
    },
    SeriesSpec {
        id: "LES1252881600Q",
        link: ChainLink::GhostGdp,
        name: "Median Usual Weekly Real Earnings",
        frequency: Frequency::Quarterly,
        unit: "2025_dollars",
        note: None,
    },
    SeriesSpec {
        id: "M2V",
        link: ChainLink::GhostGdp,
        name: "Velocity of M2 Money Stock",
        frequency: Frequency::Quarterly,
        unit: "ratio",
        note: None,
    },
    SeriesSpec {
        id: "BAMLH0A0HYM2",
        link: ChainLink::CreditStress,
        name: "ICE BofA US High Yield Index OAS",
        frequency: Frequency::Daily,
        unit: "percent",
        note: None,
    },
    SeriesSpec {
        id: "BAMLH0A3HYC",
        link: ChainLink::CreditStress,
        name: "ICE BofA CCC & Lower US High Yield Index OAS",
        frequency: Frequency::Daily,
        unit: "percent",
        note: None,
    },
    SeriesSpec {
        id: "DRCLACBS",
        link: ChainLink::CreditStress,
        name: "Delinquency Rate on Consumer Loans",
        frequency: Frequency::Quarterly,
        unit: "percent",
        note: None,
    },
    SeriesSpec {
        id: "DRSFRMACBS",
        link: ChainLink::MortgageStress,
        name: "Delinquency Rate: Single-Family Residential Mortgages",
        frequency: Frequency::Quarterly,
        unit: "percent",
        note: None,
    },
    SeriesSpec {
        id: "BABATOTALSAUS",
        link: ChainLink::Context,
        name: "New Business Applications (Total)",
        frequency: Frequency::Monthly,
        unit: "applications",
        note: Some("Rising = entrepreneurial dynamism. Falling = creative destruction failing."),
    },
    SeriesSpec {
        id: "USCONS",
        link: ChainLink::Context,
        name: "Construction Employment",
        frequency: Frequency::Monthly,
        unit: "thousands",
        note: Some(
            "AI capex is driving data center construction hiring. Tracks whether AI creates offsetting jobs.",
        ),
    },
    SeriesSpec {
        id: "JTSJOL",
        link: ChainLink::Context,
        name: "Job Openings (JOLTS)",
        frequency: Frequency::Monthly,
        unit: "thousands",
        note: Some("Total labor demand. Falling openings = weakening demand for workers."),
    },
];

/// Sectors projected out of the Indeed by-sector dataset.
pub const TARGET_SECTORS: [&str; 5] = [
    "Software Development",
    "Marketing",
    "Media & Communications",
    "Banking & Finance",
    "Accounting",
];

#[must_use]
pub fn series_spec(id: &str) -> Option<&'static SeriesSpec> {
    SERIES_CATALOG.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn catalog_ids_are_unique() {
        let ids: BTreeSet<_> = SERIES_CATALOG.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), SERIES_CATALOG.len());
    }

    #[test]
    fn every_scored_link_has_at_least_one_series() {
        for link in SCORED_LINKS {
            assert!(
                SERIES_CATALOG.iter().any(|s| s.link == link),
                "no series configured for {}",
                link.as_str()
            );
        }
    }

    #[test]
    fn lookup_by_id() {
        let spec = series_spec("UNRATE").expect("UNRATE configured");
        assert_eq!(spec.link, ChainLink::Displacement);
        assert_eq!(spec.frequency, Frequency::Monthly);
        assert!(series_spec("NOPE").is_none());
    }
}
