// SPDX-License-Identifier: Apache-2.0

use macropulse_model::Status;

/// Maps a z-score-shaped value onto a status band. `inverted` evaluates the
/// negated score, for indicators where higher raw values are good (employment
/// levels, consumption, sentiment).
#[must_use]
pub fn classify(score: Option<f64>, inverted: bool) -> Status {
    let Some(mut s) = score else {
        return Status::Unknown;
    };
    if s.is_nan() {
        return Status::Unknown;
    }
    if inverted {
        s = -s;
    }
    if s >= 2.0 {
        Status::Critical
    } else if s >= 1.0 {
        Status::Warning
    } else if s >= 0.5 {
        Status::Elevated
    } else {
        Status::Normal
    }
}
