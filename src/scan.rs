//! Walks closed issues newest first and collects those whose tracked label
//! was applied and later removed.

use crate::error::FetchError;
use crate::github::issues::{Issue, parse_issue};
use crate::github::label_history::classify;
use crate::github::timeline::{fetch_timeline, parse_timeline};
use crate::github::{IssueApi, IssueOutcome, PER_PAGE, RepoRef};
use crate::storage::RecordStore;
use std::collections::HashSet;

/// How a scan ended. Both variants carry the matched issues in the order
/// they were found.
#[derive(Debug, PartialEq)]
pub enum ScanOutcome {
    /// The listing ran out of pages.
    Completed(Vec<Issue>),
    /// The API quota ran out; `issues` holds what was matched before that.
    RateLimited {
        issues: Vec<Issue>,
        reset: Option<String>,
    },
}

impl ScanOutcome {
    pub fn issues(&self) -> &[Issue] {
        match self {
            ScanOutcome::Completed(issues) | ScanOutcome::RateLimited { issues, .. } => issues,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, ScanOutcome::RateLimited { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to list closed issues on page {page}: {source}")]
    Listing {
        page: u32,
        #[source]
        source: FetchError,
    },

    #[error("failed to save collected issues: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Fetches the timeline of `number` and tells whether it matches.
async fn check_issue<A: IssueApi>(
    api: &A,
    repo: &RepoRef,
    number: u64,
    label: &str,
) -> IssueOutcome<bool> {
    IssueOutcome::from(fetch_timeline(api, repo, number).await)
        .map(|events| classify(&parse_timeline(&events), label))
}

/// Scans every closed issue of `repo`.
///
/// Pull requests are skipped without fetching their timeline. An issue whose
/// timeline cannot be fetched is skipped with a warning. A rate limit on any
/// request ends the scan early with the issues matched so far. In both
/// non-error endings the matched issues are saved to `store` before
/// returning; a listing failure saves nothing.
#[tracing::instrument(skip(api, repo, store), fields(repo = %repo))]
pub async fn scan<A, S>(
    api: &A,
    repo: &RepoRef,
    label: &str,
    store: &S,
) -> Result<ScanOutcome, ScanError>
where
    A: IssueApi,
    S: RecordStore<Issue>,
{
    let mut collected: Vec<Issue> = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();
    let mut page = 1;

    let outcome = 'pages: loop {
        tracing::info!(page, "Fetching page {page}...");
        let items = match api.closed_issues_page(repo, page, PER_PAGE).await {
            Ok(items) => items,
            Err(FetchError::RateLimited { reset }) => {
                tracing::warn!(page, reset = ?reset, "Rate limit reached. Stopping at page {page}.");
                break ScanOutcome::RateLimited {
                    issues: collected,
                    reset,
                };
            }
            Err(source) => return Err(ScanError::Listing { page, source }),
        };

        if items.is_empty() {
            break ScanOutcome::Completed(collected);
        }

        for value in &items {
            let Some(issue) = parse_issue(value) else {
                tracing::warn!(page, "skipping malformed issue entry");
                continue;
            };
            if issue.is_pull_request {
                tracing::info!(number = issue.number, "skipping pull request");
                continue;
            }
            if !seen.insert(issue.number) {
                tracing::debug!(number = issue.number, "already examined");
                continue;
            }

            match check_issue(api, repo, issue.number, label).await {
                IssueOutcome::Fetched(true) => {
                    tracing::info!(
                        "Found issue #{} with label '{}' applied and later removed",
                        issue.number,
                        label
                    );
                    collected.push(issue);
                }
                IssueOutcome::Fetched(false) => {}
                IssueOutcome::Skipped(reason) => {
                    tracing::warn!(number = issue.number, %reason, "skipping issue");
                }
                IssueOutcome::RateLimited { reset } => {
                    tracing::warn!(
                        number = issue.number,
                        reset = ?reset,
                        "Rate limit reached while fetching timeline. Stopping at page {page}."
                    );
                    break 'pages ScanOutcome::RateLimited {
                        issues: collected,
                        reset,
                    };
                }
            }
        }

        page += 1;
    };

    store
        .save(outcome.issues())
        .map_err(|e| ScanError::Store(e.into()))?;

    tracing::info!(
        matched = outcome.issues().len(),
        partial = outcome.is_partial(),
        "scan finished"
    );
    Ok(outcome)
}
