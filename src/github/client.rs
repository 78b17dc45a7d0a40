use super::{IssueApi, RepoRef};
use crate::error::{FetchError, error_for_status};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "bugscan";
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// Authenticated REST client for the issue endpoints.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(GitHubClient {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn issues_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}/issues", self.api_url, repo.owner, repo.repo)
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.token)
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            return Ok(serde_json::from_str(&text)?);
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let remaining = header("x-ratelimit-remaining");
        let reset = header("x-ratelimit-reset");
        let body = response.text().await.unwrap_or_default();

        tracing::debug!(%status, url, "request failed");
        Err(error_for_status(status, remaining.as_deref(), reset, body))
    }

    async fn get_page(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<Value>, FetchError> {
        match self.get_json(url, query).await? {
            Value::Array(items) => Ok(items),
            other => Err(FetchError::UnexpectedShape(format!(
                "expected a JSON array, got {}",
                kind_of(&other)
            ))),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl IssueApi for GitHubClient {
    async fn closed_issues_page(
        &self,
        repo: &RepoRef,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, FetchError> {
        let query = [
            ("state", "closed".to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
        ];
        self.get_page(&self.issues_url(repo), &query).await
    }

    async fn issue(&self, repo: &RepoRef, number: u64) -> Result<Value, FetchError> {
        let url = format!("{}/{}", self.issues_url(repo), number);
        match self.get_json(&url, &[]).await? {
            issue @ Value::Object(_) => Ok(issue),
            other => Err(FetchError::UnexpectedShape(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    async fn timeline_page(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}/{}/timeline", self.issues_url(repo), number);
        let query = [("per_page", per_page.to_string()), ("page", page.to_string())];
        self.get_page(&url, &query).await
    }
}
