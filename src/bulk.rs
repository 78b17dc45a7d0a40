use crate::github::issues::IssueRecord;
use crate::github::timeline::fetch_timeline;
use crate::github::{IssueApi, IssueOutcome, RepoRef};
use std::collections::BTreeSet;
use std::time::Duration;

/// Pause between two issues.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Metadata plus full timeline for one issue.
async fn fetch_record<A: IssueApi>(api: &A, repo: &RepoRef, number: u64) -> IssueOutcome<IssueRecord> {
    let metadata = match IssueOutcome::from(api.issue(repo, number).await) {
        IssueOutcome::Fetched(metadata) => metadata,
        IssueOutcome::Skipped(reason) => return IssueOutcome::Skipped(reason),
        IssueOutcome::RateLimited { reset } => return IssueOutcome::RateLimited { reset },
    };

    IssueOutcome::from(fetch_timeline(api, repo, number).await)
        .map(|timeline| IssueRecord::from_metadata(number, &metadata, timeline))
}

/// Fetches a record for every issue in `ids`.
///
/// Ids are deduplicated and processed in ascending order. Issues that cannot
/// be fetched, including rate-limited ones, are logged and left out; the
/// batch always runs to the end.
pub async fn fetch_all<A: IssueApi>(
    api: &A,
    repo: &RepoRef,
    ids: &[u64],
    delay: Duration,
) -> Vec<IssueRecord> {
    let ids: BTreeSet<u64> = ids.iter().copied().collect();
    let total = ids.len();
    let mut records = Vec::with_capacity(total);

    tracing::info!(total, repo = %repo, "Starting data collection...");

    for (i, number) in ids.into_iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        tracing::info!("[{}/{}] Processing issue #{}...", i + 1, total, number);

        match fetch_record(api, repo, number).await {
            IssueOutcome::Fetched(record) => records.push(record),
            IssueOutcome::Skipped(reason) => {
                tracing::warn!(number, %reason, "skipping issue");
            }
            IssueOutcome::RateLimited { reset } => {
                tracing::warn!(number, reset = ?reset, "rate limit exceeded, skipping issue");
            }
        }
    }

    tracing::info!(fetched = records.len(), total, "data collection finished");
    records
}
