use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::Deserialize;

use crate::config::Environment;
use crate::error::{CheckError, ConfigError, response_snippet};

pub const ENVIRONMENT_HEADER: &str = "X-Environment";

/// Payload served by the version endpoint, e.g. `{"version": "1.4.0"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LatestVersion {
    pub version: String,
    #[serde(default, rename = "updateUrl")]
    pub update_url: Option<String>,
}

/// Where the latest published version comes from.
///
/// One call is one request; implementations never retry.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Fetch the latest published version, tagged with `environment`.
    ///
    /// # Errors
    /// Returns an error when the request fails, the response status is not a
    /// success, or the body is not a version payload.
    async fn fetch_latest(&self, environment: Environment) -> Result<LatestVersion, CheckError>;
}

pub struct HttpVersionSource {
    client: reqwest::Client,
    api_url: reqwest::Url,
}

impl HttpVersionSource {
    #[must_use]
    pub fn new(client: reqwest::Client, api_url: reqwest::Url) -> Self {
        Self { client, api_url }
    }

    /// Build a source with its own HTTP client.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn with_default_client(api_url: reqwest::Url) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(format!("verstamp/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ConfigError::Client)?;
        Ok(Self::new(client, api_url))
    }

    #[must_use]
    pub fn api_url(&self) -> &reqwest::Url {
        &self.api_url
    }
}

#[async_trait]
impl VersionSource for HttpVersionSource {
    async fn fetch_latest(&self, environment: Environment) -> Result<LatestVersion, CheckError> {
        let response = self
            .client
            .get(self.api_url.clone())
            .header(PRAGMA, "no-cache")
            .header(CACHE_CONTROL, "no-cache")
            .header(ENVIRONMENT_HEADER, environment.as_str())
            .send()
            .await
            .map_err(CheckError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body_snippet = response
                .text()
                .await
                .ok()
                .map(|body| response_snippet(&body, 160))
                .unwrap_or_default();
            return Err(CheckError::HttpStatus {
                status,
                body_snippet,
            });
        }

        let body = response.text().await.map_err(CheckError::Request)?;
        parse_latest_version(&body)
    }
}

pub(crate) fn parse_latest_version(body: &str) -> Result<LatestVersion, CheckError> {
    serde_json::from_str(body).map_err(CheckError::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_version_and_update_url() {
        let latest = parse_latest_version(
            r#"{"version":"2.1.0","updateUrl":"https://example.com/changelog"}"#,
        )
        .expect("payload should parse");
        assert_eq!(latest.version, "2.1.0");
        assert_eq!(
            latest.update_url.as_deref(),
            Some("https://example.com/changelog")
        );
    }

    #[test]
    fn update_url_is_optional_and_extra_fields_are_ignored() {
        let latest = parse_latest_version(r#"{"version":"2.1.0","builtAt":"today"}"#)
            .expect("payload should parse");
        assert_eq!(latest.update_url, None);
    }

    #[test]
    fn missing_version_is_a_parse_error() {
        let error = parse_latest_version(r#"{"updateUrl":"x"}"#).expect_err("no version");
        assert!(matches!(error, CheckError::Parse(_)));
        assert!(error.to_string().contains("version"));
    }

    #[test]
    fn non_json_body_is_a_parse_error() {
        let error = parse_latest_version("<html>oops</html>").expect_err("not json");
        assert!(matches!(error, CheckError::Parse(_)));
    }
}
