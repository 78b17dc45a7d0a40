use super::{IssueApi, PER_PAGE, RepoRef};
use crate::error::FetchError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::future::Future;

/// Upper bound on timeline pages fetched for a single issue.
pub const MAX_TIMELINE_PAGES: u32 = 500;

/// One entry of an issue timeline.
///
/// Only label changes are interpreted; every other kind is kept as its event
/// name and passed through unexamined.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    Labeled {
        label: String,
        created_at: DateTime<Utc>,
    },
    Unlabeled {
        label: String,
        created_at: DateTime<Utc>,
    },
    Other(String),
}

impl TimelineEvent {
    pub fn from_value(value: &Value) -> Self {
        let kind = value["event"].as_str().unwrap_or_default();
        let label = value["label"]["name"].as_str().map(str::to_string);
        let created_at = value["created_at"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        // A label change we cannot place in time is as good as opaque.
        match (kind, label, created_at) {
            ("labeled", Some(label), Some(created_at)) => TimelineEvent::Labeled { label, created_at },
            ("unlabeled", Some(label), Some(created_at)) => {
                TimelineEvent::Unlabeled { label, created_at }
            }
            _ => TimelineEvent::Other(kind.to_string()),
        }
    }
}

pub fn parse_timeline(events: &[Value]) -> Vec<TimelineEvent> {
    events.iter().map(TimelineEvent::from_value).collect()
}

/// Concatenates pages produced by `fetch_page(1)`, `fetch_page(2)`, ...
///
/// Stops at the first empty page or the first error. Reaching `max_pages`
/// without seeing an empty page is reported as [`FetchError::PageLimit`].
pub async fn collect_pages<F, Fut>(max_pages: u32, mut fetch_page: F) -> Result<Vec<Value>, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<Value>, FetchError>>,
{
    let mut items = Vec::new();

    for page in 1..=max_pages {
        let page_items = fetch_page(page).await?;
        if page_items.is_empty() {
            return Ok(items);
        }
        items.extend(page_items);
    }

    Err(FetchError::PageLimit { limit: max_pages })
}

/// Full timeline of one issue, in fetch order.
pub async fn fetch_timeline<A: IssueApi>(
    api: &A,
    repo: &RepoRef,
    number: u64,
) -> Result<Vec<Value>, FetchError> {
    let events = collect_pages(MAX_TIMELINE_PAGES, |page| {
        tracing::trace!(number, page, "fetching timeline page");
        api.timeline_page(repo, number, page, PER_PAGE)
    })
    .await?;
    tracing::debug!(number, events = events.len(), "timeline fetched");
    Ok(events)
}
