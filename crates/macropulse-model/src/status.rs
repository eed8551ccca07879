// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Stress classification of an indicator, a chain link, or the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Elevated,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Elevated => "elevated",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }

    /// Contribution of one chain link to the 0-100 composite.
    #[must_use]
    pub const fn score(self) -> f64 {
        match self {
            Self::Normal | Self::Unknown => 0.0,
            Self::Elevated => 25.0,
            Self::Warning => 50.0,
            Self::Critical => 100.0,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
