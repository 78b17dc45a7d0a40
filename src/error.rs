use reqwest::StatusCode;

/// Errors produced by a single GitHub REST request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The resource does not exist (HTTP 404).
    #[error("resource not found")]
    NotFound,

    /// HTTP 403 with an exhausted quota. `reset` carries the raw
    /// `X-RateLimit-Reset` header when the server sent one.
    #[error("rate limit exceeded (X-RateLimit-Reset={})", reset.as_deref().unwrap_or("unknown"))]
    RateLimited { reset: Option<String> },

    /// Any other non-success status.
    #[error("GitHub API error: {status} {body}")]
    Status { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Pagination did not reach an empty page within the bound.
    #[error("pagination did not terminate within {limit} pages")]
    PageLimit { limit: u32 },
}

impl FetchError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }
}

/// Maps a non-success response onto the error taxonomy.
///
/// Only a 403 whose remaining-quota header is exactly `"0"` counts as a rate
/// limit; any other 403 is reported as a plain status error.
pub fn error_for_status(
    status: StatusCode,
    remaining: Option<&str>,
    reset: Option<String>,
    body: String,
) -> FetchError {
    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound,
        StatusCode::FORBIDDEN if remaining == Some("0") => FetchError::RateLimited { reset },
        _ => FetchError::Status { status, body },
    }
}
