use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// Snapshot of an issue as returned by the list or single-issue endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub body: Option<String>,
    pub author: Option<String>,
    pub labels: Vec<String>,
    pub html_url: Option<String>,
    pub is_pull_request: bool,
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn label_names(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|labels| {
            labels
                .iter()
                .filter_map(|label| label["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Builds an [`Issue`] from its JSON form.
///
/// `number`, `title` and a known `state` are required; anything else missing
/// becomes `None`/empty. Pull requests are recognised by the presence of a
/// `pull_request` field, whatever its value.
pub fn parse_issue(issue: &Value) -> Option<Issue> {
    let (Some(number), Some(title), Some(state)) = (
        issue["number"].as_u64(),
        issue["title"].as_str(),
        issue["state"].as_str(),
    ) else {
        return None;
    };

    let state = match state {
        "open" => IssueState::Open,
        "closed" => IssueState::Closed,
        _ => return None,
    };

    Some(Issue {
        number,
        title: title.to_string(),
        state,
        created_at: parse_timestamp(&issue["created_at"]),
        closed_at: parse_timestamp(&issue["closed_at"]),
        body: issue["body"].as_str().map(str::to_string),
        author: issue["user"]["login"].as_str().map(str::to_string),
        labels: label_names(&issue["labels"]),
        html_url: issue["html_url"].as_str().map(str::to_string),
        is_pull_request: issue.get("pull_request").is_some(),
    })
}

/// Issue metadata bundled with its raw timeline, as written by the bulk fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub issue_number: u64,
    pub title: Option<String>,
    pub state: Option<String>,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
    pub body: Option<String>,
    pub user: Option<String>,
    pub current_labels: Vec<String>,
    pub timeline_data: Vec<Value>,
}

impl IssueRecord {
    /// Lenient: metadata fields are copied as-is and missing ones stay `None`.
    pub fn from_metadata(issue_number: u64, metadata: &Value, timeline_data: Vec<Value>) -> Self {
        let text = |key: &str| metadata[key].as_str().map(str::to_string);
        IssueRecord {
            issue_number,
            title: text("title"),
            state: text("state"),
            created_at: text("created_at"),
            closed_at: text("closed_at"),
            body: text("body"),
            user: metadata["user"]["login"].as_str().map(str::to_string),
            current_labels: label_names(&metadata["labels"]),
            timeline_data,
        }
    }
}
