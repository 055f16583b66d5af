use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compare::compare_versions;
use crate::error::{CheckError, ConfigError};
use crate::result::VersionCheckResult;

const DEVELOPMENT_POLLING_INTERVAL: Duration = Duration::from_secs(60);
const PRODUCTION_POLLING_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Replacement comparator; receives `(current, latest)`.
pub type CompareFn = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;
pub type ResultSink = Arc<dyn Fn(&VersionCheckResult) + Send + Sync>;
pub type ErrorSink = Arc<dyn Fn(&CheckError) + Send + Sync>;
/// Supplies the version embedded in the running artifact, if any.
pub type VersionProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    #[must_use]
    pub fn default_polling_interval(self) -> Duration {
        match self {
            Environment::Development => DEVELOPMENT_POLLING_INTERVAL,
            Environment::Production => PRODUCTION_POLLING_INTERVAL,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a version check or a polling controller.
///
/// Plain options deserialize from JSON; the callable hooks are attached with
/// the `with_*` builder methods.
#[derive(Clone, Default, Deserialize)]
pub struct CheckConfig {
    #[serde(default)]
    pub api_url: String,

    #[serde(default)]
    pub current_version: Option<String>,

    #[serde(default)]
    pub polling: bool,

    /// Milliseconds between cycles; unset or `0` uses the environment default.
    #[serde(default)]
    pub polling_interval_ms: Option<u64>,

    /// Consecutive failed cycles before polling stops; `0` retries forever.
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default)]
    pub environment: Environment,

    /// Defaults to `true` in development and `false` in production.
    #[serde(default)]
    pub debug: Option<bool>,

    #[serde(default)]
    pub disable_dev_updates: bool,

    #[serde(skip)]
    pub compare_versions: Option<CompareFn>,

    #[serde(skip)]
    pub on_result: Option<ResultSink>,

    #[serde(skip)]
    pub on_error: Option<ErrorSink>,

    #[serde(skip)]
    pub embedded_version: Option<VersionProvider>,
}

impl CheckConfig {
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_polling(mut self, polling: bool) -> Self {
        self.polling = polling;
        self
    }

    #[must_use]
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval_ms = Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    #[must_use]
    pub fn with_disable_dev_updates(mut self, disable: bool) -> Self {
        self.disable_dev_updates = disable;
        self
    }

    #[must_use]
    pub fn with_compare_versions<F>(mut self, compare: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.compare_versions = Some(Arc::new(compare));
        self
    }

    #[must_use]
    pub fn with_on_result<F>(mut self, sink: F) -> Self
    where
        F: Fn(&VersionCheckResult) + Send + Sync + 'static,
    {
        self.on_result = Some(Arc::new(sink));
        self
    }

    #[must_use]
    pub fn with_on_error<F>(mut self, sink: F) -> Self
    where
        F: Fn(&CheckError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(sink));
        self
    }

    #[must_use]
    pub fn with_embedded_version<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.embedded_version = Some(Arc::new(provider));
        self
    }

    pub(crate) fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let api_url = self.api_url.trim();
        if api_url.is_empty() {
            return Err(ConfigError::MissingApiUrl);
        }
        let api_url = reqwest::Url::parse(api_url).map_err(|error| ConfigError::InvalidApiUrl {
            url: api_url.to_string(),
            reason: error.to_string(),
        })?;

        let environment = self.environment;
        let interval = match self.polling_interval_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => environment.default_polling_interval(),
        };

        Ok(ResolvedConfig {
            api_url,
            current_version: self.current_version.filter(|v| !v.trim().is_empty()),
            interval,
            max_retries: self.max_retries,
            environment,
            debug: self
                .debug
                .unwrap_or(environment == Environment::Development),
            suppress_new_versions: environment == Environment::Development
                && self.disable_dev_updates,
            compare: self
                .compare_versions
                .unwrap_or_else(|| Arc::new(compare_versions) as CompareFn),
            on_result: self.on_result,
            on_error: self.on_error,
            embedded_version: self.embedded_version,
        })
    }
}

impl fmt::Debug for CheckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckConfig")
            .field("api_url", &self.api_url)
            .field("current_version", &self.current_version)
            .field("polling", &self.polling)
            .field("polling_interval_ms", &self.polling_interval_ms)
            .field("max_retries", &self.max_retries)
            .field("environment", &self.environment)
            .field("debug", &self.debug)
            .field("disable_dev_updates", &self.disable_dev_updates)
            .field("compare_versions", &self.compare_versions.is_some())
            .field("on_result", &self.on_result.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("embedded_version", &self.embedded_version.is_some())
            .finish()
    }
}

/// Configuration after validation and environment defaults, fixed for the
/// lifetime of a checker.
#[derive(Clone)]
pub(crate) struct ResolvedConfig {
    pub api_url: reqwest::Url,
    pub current_version: Option<String>,
    pub interval: Duration,
    pub max_retries: u32,
    pub environment: Environment,
    pub debug: bool,
    pub suppress_new_versions: bool,
    pub compare: CompareFn,
    pub on_result: Option<ResultSink>,
    pub on_error: Option<ErrorSink>,
    pub embedded_version: Option<VersionProvider>,
}
