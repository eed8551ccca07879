// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::PathBuf;

use macropulse_ingest::{FRED_DEFAULT_BASE_URL, INDEED_DEFAULT_BASE_URL};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub fred_api_key: Option<String>,
    pub refresh_token: Option<String>,
    pub fred_base_url: String,
    pub indeed_base_url: String,
    pub data_dir: Option<PathBuf>,
    pub scheduler_enabled: bool,
    pub log_json: bool,
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Reads a boolean flag, case-insensitively; unrecognised values keep the
/// default rather than erroring.
pub(crate) fn env_bool(name: &str, default: bool) -> bool {
    const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];
    const FALSY: [&str; 4] = ["0", "false", "no", "off"];

    let Ok(raw) = env::var(name) else {
        return default;
    };
    let raw = raw.trim();
    if TRUTHY.iter().any(|v| raw.eq_ignore_ascii_case(v)) {
        true
    } else if FALSY.iter().any(|v| raw.eq_ignore_ascii_case(v)) {
        false
    } else {
        default
    }
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bind: env_str("MACROPULSE_BIND", "127.0.0.1:8788"),
            fred_api_key: env_opt("FRED_API_KEY"),
            refresh_token: env_opt("REFRESH_TOKEN"),
            fred_base_url: env_str("MACROPULSE_FRED_BASE_URL", FRED_DEFAULT_BASE_URL),
            indeed_base_url: env_str("MACROPULSE_INDEED_BASE_URL", INDEED_DEFAULT_BASE_URL),
            data_dir: env_opt("MACROPULSE_DATA_DIR").map(PathBuf::from),
            scheduler_enabled: env_bool("MACROPULSE_SCHEDULER_ENABLED", true),
            log_json: env_bool("MACROPULSE_LOG_JSON", true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_bool_accepts_common_spellings() {
        assert!(env_bool("MACROPULSE_TEST_UNSET_FLAG", true));
        std::env::set_var("MACROPULSE_TEST_FLAG_A", "yes");
        assert!(env_bool("MACROPULSE_TEST_FLAG_A", false));
        std::env::set_var("MACROPULSE_TEST_FLAG_B", "0");
        assert!(!env_bool("MACROPULSE_TEST_FLAG_B", true));
        std::env::set_var("MACROPULSE_TEST_FLAG_C", "maybe");
        assert!(env_bool("MACROPULSE_TEST_FLAG_C", true));
        std::env::set_var("MACROPULSE_TEST_FLAG_D", "TRUE");
        assert!(env_bool("MACROPULSE_TEST_FLAG_D", false));
        std::env::set_var("MACROPULSE_TEST_FLAG_E", " Off ");
        assert!(!env_bool("MACROPULSE_TEST_FLAG_E", true));
    }
}
