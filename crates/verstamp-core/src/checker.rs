use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::Level;

use crate::config::{CheckConfig, Environment, ResolvedConfig};
use crate::error::{CheckError, ConfigError};
use crate::result::VersionCheckResult;
use crate::source::{HttpVersionSource, VersionSource};

pub const FALLBACK_VERSION: &str = "0.0.0";

/// Performs single version checks against a [`VersionSource`].
///
/// Every check reports to the configured sinks and returns its outcome; errors
/// are never swallowed.
pub struct VersionChecker {
    config: ResolvedConfig,
    source: Arc<dyn VersionSource>,
}

impl VersionChecker {
    /// Validate `config` and build a checker that talks to `config.api_url`
    /// over HTTP.
    ///
    /// # Errors
    /// Returns an error when `api_url` is missing or invalid, or when the HTTP
    /// client cannot be built.
    pub fn new(config: CheckConfig) -> Result<Self, ConfigError> {
        let config = config.resolve()?;
        let source = HttpVersionSource::with_default_client(config.api_url.clone())?;
        Ok(Self {
            config,
            source: Arc::new(source),
        })
    }

    /// Like [`VersionChecker::new`], with a caller-supplied source.
    ///
    /// # Errors
    /// Returns an error when `api_url` is missing or invalid.
    pub fn with_source(
        config: CheckConfig,
        source: Arc<dyn VersionSource>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            config: config.resolve()?,
            source,
        })
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    #[must_use]
    pub fn api_url(&self) -> &reqwest::Url {
        &self.config.api_url
    }

    pub(crate) fn interval(&self) -> Duration {
        self.config.interval
    }

    pub(crate) fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// The configured override, else the embedded version, else `"0.0.0"`.
    #[must_use]
    pub fn current_version(&self) -> String {
        self.config
            .current_version
            .clone()
            .or_else(|| {
                self.config
                    .embedded_version
                    .as_ref()
                    .and_then(|provider| provider())
                    .filter(|v| !v.trim().is_empty())
            })
            .unwrap_or_else(|| FALLBACK_VERSION.to_string())
    }

    /// Run one check and deliver the outcome to the configured sinks.
    ///
    /// # Errors
    /// Returns the request, HTTP status, or parse failure after it has been
    /// passed to `on_error`.
    pub async fn check(&self) -> Result<VersionCheckResult, CheckError> {
        match self.fetch_result().await {
            Ok(result) => {
                if let Some(on_result) = &self.config.on_result {
                    on_result(&result);
                }
                Ok(result)
            }
            Err(error) => {
                self.trace(Level::Error, format_args!("Error: {error}"));
                if let Some(on_error) = &self.config.on_error {
                    on_error(&error);
                }
                Err(error)
            }
        }
    }

    async fn fetch_result(&self) -> Result<VersionCheckResult, CheckError> {
        self.trace(Level::Info, format_args!("Checking for updates..."));

        let current_version = self.current_version();
        self.trace(
            Level::Info,
            format_args!("Current version: {current_version}"),
        );

        let latest = self.source.fetch_latest(self.config.environment).await?;
        self.trace(
            Level::Info,
            format_args!("Latest version: {}", latest.version),
        );

        let has_new_version = (self.config.compare)(&current_version, &latest.version);
        if has_new_version {
            self.trace(Level::Info, format_args!("New version available!"));
        }

        Ok(self.apply_environment_policy(VersionCheckResult {
            current_version,
            latest_version: latest.version,
            has_new_version,
            update_url: latest.update_url,
            environment: self.config.environment,
        }))
    }

    fn apply_environment_policy(&self, mut result: VersionCheckResult) -> VersionCheckResult {
        if self.config.suppress_new_versions && result.has_new_version {
            self.trace(
                Level::Info,
                format_args!("Update notices are disabled in development"),
            );
            result.has_new_version = false;
        }
        result
    }

    pub(crate) fn trace(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.config.debug {
            log::log!(
                level,
                "[version-check][{}] {args}",
                self.config.environment
            );
        }
    }
}
