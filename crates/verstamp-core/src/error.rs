use thiserror::Error;

/// Failure of a single version check.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to fetch version info: {0}")]
    Request(#[source] reqwest::Error),
    #[error("failed to fetch version info: HTTP {status}{body_snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body_snippet: String,
    },
    #[error("failed to parse version info: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Invalid checker configuration, reported before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("version check requires an api_url")]
    MissingApiUrl,
    #[error("invalid api_url {url:?}: {reason}")]
    InvalidApiUrl { url: String, reason: String },
    #[error("failed to build version check client: {0}")]
    Client(#[source] reqwest::Error),
}

pub(crate) fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}
