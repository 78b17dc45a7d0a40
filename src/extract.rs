use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

static FOUND_ISSUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Found issue #(\d+)").expect("pattern is valid"));

/// Issue numbers mentioned as `Found issue #<n>` in `text`, deduplicated and
/// sorted ascending. Numbers too large for `u64` are ignored.
pub fn extract_issue_numbers(text: &str) -> Vec<u64> {
    FOUND_ISSUE
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<u64>().ok())
        .collect::<BTreeSet<u64>>()
        .into_iter()
        .collect()
}

/// Reads `path` and extracts the issue numbers it mentions.
pub fn extract_from_file(path: &Path) -> Result<Vec<u64>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    let ids = extract_issue_numbers(&content);
    tracing::info!(count = ids.len(), path = %path.display(), "Found {} unique issues to process.", ids.len());
    Ok(ids)
}
