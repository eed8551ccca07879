// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchErrorCode {
    Timeout,
    Network,
    BadStatus,
    Decode,
    EmptySeries,
    EmptyAggregate,
    EmptySectors,
    Internal,
}

impl FetchErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::BadStatus => "bad_status",
            Self::Decode => "decode",
            Self::EmptySeries => "empty-series",
            Self::EmptyAggregate => "empty-aggregate",
            Self::EmptySectors => "empty-sectors",
            Self::Internal => "internal",
        }
    }
}

/// Fetch failure tagged with the caller-supplied label so aggregated fan-out
/// errors stay attributable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub code: FetchErrorCode,
    pub label: String,
    pub message: String,
    pub retryable: bool,
}

impl FetchError {
    #[must_use]
    pub fn new(
        code: FetchErrorCode,
        label: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            code,
            label: label.into(),
            message: message.into(),
            retryable,
        }
    }

    #[must_use]
    pub fn timeout(label: &str, after_ms: u64) -> Self {
        Self::new(
            FetchErrorCode::Timeout,
            label,
            format!("attempt timed out after {after_ms}ms"),
            true,
        )
    }

    #[must_use]
    pub fn network(label: &str, message: impl Into<String>) -> Self {
        Self::new(FetchErrorCode::Network, label, message, true)
    }

    #[must_use]
    pub fn status(label: &str, status: u16) -> Self {
        Self::new(
            FetchErrorCode::BadStatus,
            label,
            format!("HTTP {status}"),
            is_retryable_status(status),
        )
    }

    #[must_use]
    pub fn decode(label: &str, message: impl Into<String>) -> Self {
        Self::new(FetchErrorCode::Decode, label, message, false)
    }

    #[must_use]
    pub fn empty(code: FetchErrorCode, label: &str) -> Self {
        Self::new(code, label, "no usable observations", false)
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.label, self.code.as_str(), self.message)
    }
}

impl std::error::Error for FetchError {}

/// Statuses worth another attempt: request timeout, too-early, rate limiting,
/// and anything server-side.
#[must_use]
pub const fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 425 | 429) || status >= 500
}
