// SPDX-License-Identifier: Apache-2.0

/// Formats a publication version: unix millis plus the first eight chars of
/// the run id. Opaque to readers; only equality and key derivation matter.
#[must_use]
pub fn publication_version(unix_millis: i64, run_id: &str) -> String {
    let short: String = run_id.chars().take(8).collect();
    format!("{unix_millis}-{short}")
}

#[cfg(test)]
mod tests {
    use super::publication_version;

    #[test]
    fn version_combines_millis_and_run_id_prefix() {
        assert_eq!(
            publication_version(1_700_000_000_000, "deadbeefcafe0123"),
            "1700000000000-deadbeef"
        );
    }

    #[test]
    fn short_run_ids_are_taken_whole() {
        assert_eq!(publication_version(1, "abc"), "1-abc");
    }
}
