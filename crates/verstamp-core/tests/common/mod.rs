use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use verstamp_core::{CheckError, Environment, LatestVersion, VersionSource};

pub const API_URL: &str = "https://updates.example.com/version.json";

/// Counts requests and answers with a fixed version or a fixed failure,
/// optionally after a delay.
pub struct MockSource {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latest: Option<&'static str>,
    delay: Duration,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockSource {
    fn build(latest: Option<&'static str>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            latest,
            delay,
        })
    }

    pub fn serving(version: &'static str) -> Arc<Self> {
        Self::build(Some(version), Duration::ZERO)
    }

    pub fn serving_slowly(version: &'static str, delay: Duration) -> Arc<Self> {
        Self::build(Some(version), delay)
    }

    pub fn failing() -> Arc<Self> {
        Self::build(None, Duration::ZERO)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VersionSource for MockSource {
    async fn fetch_latest(&self, _: Environment) -> Result<LatestVersion, CheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.latest {
            Some(version) => Ok(LatestVersion {
                version: version.to_string(),
                update_url: Some("https://example.com/release-notes".to_string()),
            }),
            None => Err(CheckError::HttpStatus {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body_snippet: String::new(),
            }),
        }
    }
}
