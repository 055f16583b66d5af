use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::Level;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::checker::VersionChecker;
use crate::error::CheckError;
use crate::result::VersionCheckResult;

#[derive(Debug, Default)]
struct PollState {
    is_polling: bool,
    retry_count: u32,
    session: u64,
    timer: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    checker: VersionChecker,
    state: Mutex<PollState>,
    polling_tx: watch::Sender<bool>,
}

/// Repeatedly checks for a newer version until one is found, retries run
/// out, or [`PollController::stop`] is called.
///
/// Cycles never overlap: the next one is scheduled only after the previous
/// cycle has finished. Dropping the controller stops it.
pub struct PollController {
    shared: Arc<Shared>,
    lifetime: CancellationToken,
}

impl PollController {
    #[must_use]
    pub fn new(checker: VersionChecker) -> Self {
        let (polling_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                checker,
                state: Mutex::new(PollState::default()),
                polling_tx,
            }),
            lifetime: CancellationToken::new(),
        }
    }

    /// Begin polling with an immediate check. Does nothing if already polling.
    ///
    /// A fetch still in flight from a previous session is aborted, so its
    /// result is never delivered and at most one fetch runs per controller.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut state = self.shared.lock();
        if state.is_polling {
            return;
        }

        state.is_polling = true;
        state.retry_count = 0;
        state.session += 1;
        let timer = CancellationToken::new();
        state.timer = Some(timer.clone());
        if let Some(previous) = state.task.take() {
            previous.abort();
        }

        self.shared.checker.trace(
            Level::Info,
            format_args!(
                "Starting polling (interval: {}ms)",
                self.shared.checker.interval().as_millis()
            ),
        );
        self.shared.polling_tx.send_replace(true);
        state.task = Some(tokio::spawn(run_polling(
            Arc::clone(&self.shared),
            state.session,
            timer,
        )));
    }

    /// Cancel the pending check and return to idle. Does nothing if idle.
    pub fn stop(&self) {
        self.shared.stop(None);
    }

    /// Check once, independent of polling state and retry budget.
    ///
    /// # Errors
    /// Returns the check failure after it has been passed to `on_error`.
    pub async fn check_now(&self) -> Result<VersionCheckResult, CheckError> {
        self.shared
            .checker
            .trace(Level::Info, format_args!("Manually triggering check"));
        self.shared.checker.check().await
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.shared.lock().is_polling
    }

    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.shared.lock().retry_count
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.shared.checker.interval()
    }

    #[must_use]
    pub fn checker(&self) -> &VersionChecker {
        &self.shared.checker
    }

    /// Resolves once the controller is idle.
    pub async fn stopped(&self) {
        let mut polling = self.shared.polling_tx.subscribe();
        let _ = polling.wait_for(|is_polling| !*is_polling).await;
    }

    /// Stop polling when `teardown` resolves, e.g. on a shutdown signal.
    ///
    /// The registration ends with the controller; it never keeps it alive.
    pub fn stop_on<F>(&self, teardown: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shared = Arc::downgrade(&self.shared);
        let lifetime = self.lifetime.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = teardown => {
                    if let Some(shared) = shared.upgrade() {
                        shared.checker.trace(Level::Info, format_args!("Teardown requested"));
                        shared.stop(None);
                    }
                }
                () = lifetime.cancelled() => {}
            }
        });
    }
}

impl Drop for PollController {
    fn drop(&mut self) {
        self.lifetime.cancel();
        self.shared.stop(None);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PollState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns to idle. With `Some(session)`, only stops that polling session,
    /// so a cycle that outlived its session cannot stop a newer one.
    fn stop(&self, session: Option<u64>) -> bool {
        {
            let mut state = self.lock();
            if !state.is_polling || session.is_some_and(|id| id != state.session) {
                return false;
            }

            state.is_polling = false;
            if let Some(timer) = state.timer.take() {
                timer.cancel();
            }
        }

        self.checker
            .trace(Level::Info, format_args!("Stopping polling"));
        self.polling_tx.send_replace(false);
        true
    }

    /// Returns the updated count, or `None` when `session` is no longer current.
    fn record_failure(&self, session: u64) -> Option<u32> {
        let mut state = self.lock();
        if state.session != session {
            return None;
        }
        state.retry_count += 1;
        Some(state.retry_count)
    }

    fn reset_retries(&self, session: u64) {
        let mut state = self.lock();
        if state.session == session {
            state.retry_count = 0;
        }
    }

    async fn run_cycle(&self, session: u64) -> Result<Option<VersionCheckResult>, CheckError> {
        match self.checker.check().await {
            Ok(result) => {
                if result.has_new_version {
                    self.checker.trace(
                        Level::Info,
                        format_args!("Found new version, stopping polling."),
                    );
                    self.stop(Some(session));
                }
                self.reset_retries(session);
                Ok(Some(result))
            }
            Err(error) => {
                let Some(retry_count) = self.record_failure(session) else {
                    return Err(error);
                };

                let max_retries = self.checker.max_retries();
                self.checker.trace(
                    RETRY_FAILURE_LEVEL,
                    format_args!("{}", retry_failure_line(retry_count, max_retries, &error)),
                );
                if max_retries > 0 && retry_count >= max_retries {
                    self.checker.trace(
                        Level::Warn,
                        format_args!("Max retries reached ({retry_count}), stopping."),
                    );
                    self.stop(Some(session));
                    return Ok(None);
                }

                Err(error)
            }
        }
    }
}

const RETRY_FAILURE_LEVEL: Level = Level::Warn;

fn retry_failure_line(retry_count: u32, max_retries: u32, error: &CheckError) -> String {
    if max_retries == 0 {
        format!("Check failed (retry {retry_count}): {error}")
    } else {
        format!("Check failed (retry {retry_count}/{max_retries}): {error}")
    }
}

async fn run_polling(shared: Arc<Shared>, session: u64, timer: CancellationToken) {
    loop {
        if let Err(error) = shared.run_cycle(session).await {
            log::debug!("Polling cycle of session {session} ended with: {error}");
        }

        if timer.is_cancelled() {
            break;
        }

        tokio::select! {
            () = timer.cancelled() => break,
            () = tokio::time::sleep(shared.checker.interval()) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> CheckError {
        CheckError::HttpStatus {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body_snippet: String::new(),
        }
    }

    #[test]
    fn retry_failure_line_carries_the_count() {
        let line = retry_failure_line(2, 3, &unavailable());
        assert!(line.starts_with("Check failed (retry 2/3): "));
        assert!(line.contains("503"));

        let line = retry_failure_line(7, 0, &unavailable());
        assert!(line.starts_with("Check failed (retry 7): "));
    }

    #[test]
    fn retry_failures_show_at_the_default_log_level() {
        assert!(RETRY_FAILURE_LEVEL <= log::LevelFilter::Info);
    }
}
