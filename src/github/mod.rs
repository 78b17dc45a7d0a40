pub mod client;
pub mod issues;
pub mod label_history;
pub mod timeline;

use crate::error::FetchError;
use serde_json::Value;
use std::fmt;

/// Page size used for every paginated endpoint.
pub const PER_PAGE: u32 = 100;

/// Repository coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoRef {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// The three issue endpoints both pipelines are built on.
///
/// Every method returns the raw JSON so callers decide how much of it to
/// interpret. List endpoints return the items of one page; an empty vector
/// means the listing is exhausted.
#[allow(async_fn_in_trait)]
pub trait IssueApi {
    /// One page of closed issues, newest first.
    async fn closed_issues_page(
        &self,
        repo: &RepoRef,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, FetchError>;

    async fn issue(&self, repo: &RepoRef, number: u64) -> Result<Value, FetchError>;

    async fn timeline_page(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, FetchError>;
}

/// Why a single issue was left out of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NotFound,
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "not found (404)"),
            SkipReason::Failed(message) => write!(f, "{message}"),
        }
    }
}

/// Result of a per-issue operation.
///
/// Pipelines branch on this tag: the scanner stops on `RateLimited`, the bulk
/// fetcher treats it like any other skip.
#[derive(Debug, PartialEq)]
pub enum IssueOutcome<T> {
    /// The operation produced a value
    Fetched(T),
    /// The issue should be left out, with the reason
    Skipped(SkipReason),
    /// The API quota is exhausted
    RateLimited { reset: Option<String> },
}

impl<T> IssueOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> IssueOutcome<U> {
        match self {
            IssueOutcome::Fetched(value) => IssueOutcome::Fetched(f(value)),
            IssueOutcome::Skipped(reason) => IssueOutcome::Skipped(reason),
            IssueOutcome::RateLimited { reset } => IssueOutcome::RateLimited { reset },
        }
    }
}

impl<T> From<Result<T, FetchError>> for IssueOutcome<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => IssueOutcome::Fetched(value),
            Err(FetchError::RateLimited { reset }) => IssueOutcome::RateLimited { reset },
            Err(FetchError::NotFound) => IssueOutcome::Skipped(SkipReason::NotFound),
            Err(err) => IssueOutcome::Skipped(SkipReason::Failed(err.to_string())),
        }
    }
}
