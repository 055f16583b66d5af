//! Client-side checks for newer deployed versions.
//!
//! - [`compare_versions`]: dot-separated numeric version comparison.
//! - [`VersionChecker`]: one request to the version endpoint, reported to the
//!   configured result and error sinks.
//! - [`PollController`]: repeated checks with a retry budget and
//!   start/stop/check-now controls.
//! - [`check_app_version`]: picks a one-shot check or a controller from the
//!   config.

mod checker;
mod compare;
mod config;
mod error;
mod poll;
mod result;
mod source;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use checker::{FALLBACK_VERSION, VersionChecker};
pub use compare::compare_versions;
pub use config::{CheckConfig, CompareFn, Environment, ErrorSink, ResultSink, VersionProvider};
pub use error::{CheckError, ConfigError};
pub use poll::PollController;
pub use result::VersionCheckResult;
pub use source::{ENVIRONMENT_HEADER, HttpVersionSource, LatestVersion, VersionSource};

pub type PendingCheck = Pin<Box<dyn Future<Output = Result<VersionCheckResult, CheckError>> + Send>>;

/// What [`check_app_version`] hands back, depending on `config.polling`.
pub enum AppVersionCheck {
    /// A single check, run when awaited.
    Once(PendingCheck),
    /// An idle controller; call [`PollController::start`] to begin.
    Polling(PollController),
}

impl AppVersionCheck {
    /// Whether this is the [`AppVersionCheck::Polling`] variant; says nothing
    /// about whether the controller is running.
    #[must_use]
    pub fn is_controller(&self) -> bool {
        matches!(self, AppVersionCheck::Polling(_))
    }
}

/// Validate `config` and return either a one-shot check or a poll controller
/// that fetches over HTTP.
///
/// # Errors
/// Fails before any network activity when `api_url` is missing or invalid, or
/// the HTTP client cannot be built.
pub fn check_app_version(config: CheckConfig) -> Result<AppVersionCheck, ConfigError> {
    let polling = config.polling;
    Ok(wrap(VersionChecker::new(config)?, polling))
}

/// Like [`check_app_version`], fetching through `source` instead of HTTP.
///
/// # Errors
/// Fails when `api_url` is missing or invalid.
pub fn check_app_version_with(
    config: CheckConfig,
    source: Arc<dyn VersionSource>,
) -> Result<AppVersionCheck, ConfigError> {
    let polling = config.polling;
    Ok(wrap(VersionChecker::with_source(config, source)?, polling))
}

fn wrap(checker: VersionChecker, polling: bool) -> AppVersionCheck {
    if polling {
        AppVersionCheck::Polling(PollController::new(checker))
    } else {
        AppVersionCheck::Once(Box::pin(async move { checker.check().await }))
    }
}
