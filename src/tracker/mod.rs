//! Extraction process tracking
//!
//! A tracker owns the polling loop for one book's extraction job. The job
//! lifecycle is `Unrequested → Requested → InProgress → Complete`;
//! `Complete` is terminal and stops polling permanently. Selecting a
//! different book cancels the tracker's token, and a response that lands
//! after cancellation is discarded rather than applied.

mod cancel;
mod estimate;

pub use cancel::{CancelToken, Cancelled};
pub use estimate::{estimate, EstimatorConfig, ProgressReport};

use crate::client::{ApiError, BookService};
use crate::model::{BookId, ExtractionProcess, ProcessState};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Errors from extraction tracking
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("extraction already requested for book {0}")]
    AlreadyRequested(BookId),

    #[error("status polling cancelled")]
    Cancelled,

    #[error("{failures} consecutive status polls failed")]
    Stalled {
        failures: u32,
        #[source]
        last: ApiError,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<Cancelled> for TrackerError {
    fn from(_: Cancelled) -> Self {
        TrackerError::Cancelled
    }
}

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Polling tuning
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// Time between status polls while the job is running
    pub interval: Duration,
    /// Consecutive transient failures tolerated before the watch aborts
    pub max_consecutive_failures: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_consecutive_failures: 30,
        }
    }
}

/// Completeness floor for the current run
///
/// The server never regresses a job, but a stale read can: the tracker
/// clamps observations to the highest completeness seen for the current
/// `requested_at`, and resets when a new run starts.
#[derive(Debug, Default)]
struct Baseline {
    requested_at: Option<DateTime<Utc>>,
    completeness: f64,
}

/// Polling state machine over one book's extraction job
pub struct ExtractionTracker {
    service: Arc<dyn BookService>,
    book_id: BookId,
    token: CancelToken,
    config: TrackerConfig,
    estimator: EstimatorConfig,
    baseline: Mutex<Baseline>,
}

impl ExtractionTracker {
    /// Create a tracker for a book with default tuning
    pub fn new(service: Arc<dyn BookService>, book_id: BookId) -> Self {
        Self {
            service,
            book_id,
            token: CancelToken::new(),
            config: TrackerConfig::default(),
            estimator: EstimatorConfig::default(),
            baseline: Mutex::new(Baseline::default()),
        }
    }

    /// Replace the polling tuning
    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the estimator tuning
    pub fn with_estimator(mut self, estimator: EstimatorConfig) -> Self {
        self.estimator = estimator;
        self
    }

    /// Use an externally owned cancellation token
    ///
    /// The session registers a token per (resource, book) so switching
    /// books cancels the tracker from outside.
    pub fn with_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    /// The tracked book
    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    /// A clone of the cancellation token
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Fetch current status once, with cancellation and monotonicity applied
    pub async fn status(&self) -> TrackerResult<ExtractionProcess> {
        self.token.checkpoint()?;
        let process = self.service.extraction_process(&self.book_id).await?;
        self.token.checkpoint()?;
        Ok(self.observe(process).await)
    }

    /// Trigger the job; rejected unless the process is still unrequested
    pub async fn trigger(&self) -> TrackerResult<ExtractionProcess> {
        let process = self.status().await?;
        if process.state() != ProcessState::Unrequested {
            return Err(TrackerError::AlreadyRequested(self.book_id));
        }
        self.service.trigger_extraction(&self.book_id).await?;
        info!(book_id = %self.book_id, "extraction triggered");
        self.status().await
    }

    /// Poll until the job completes, reporting each observation
    ///
    /// Transient failures are swallowed and retried on the next tick;
    /// `max_consecutive_failures` of them in a row aborts the watch.
    /// Auth and not-found failures abort immediately. Returns the final,
    /// complete process record.
    pub async fn watch<F>(&self, mut on_update: F) -> TrackerResult<ExtractionProcess>
    where
        F: FnMut(&ExtractionProcess, &ProgressReport),
    {
        let mut ticker = tokio::time::interval(self.config.interval);
        let mut failures = 0u32;
        loop {
            ticker.tick().await;
            self.token.checkpoint()?;
            match self.service.extraction_process(&self.book_id).await {
                Ok(raw) => {
                    // A late response for a cancelled watch must not leak
                    // into the caller's state.
                    self.token.checkpoint()?;
                    failures = 0;
                    let process = self.observe(raw).await;
                    let report = estimate(&process, Utc::now(), &self.estimator);
                    on_update(&process, &report);
                    if process.state().is_terminal() {
                        info!(book_id = %self.book_id, "extraction complete");
                        return Ok(process);
                    }
                }
                Err(err) if err.is_transient() => {
                    failures += 1;
                    debug!(
                        book_id = %self.book_id,
                        failures,
                        error = %err,
                        "transient poll failure"
                    );
                    if failures >= self.config.max_consecutive_failures {
                        warn!(book_id = %self.book_id, failures, "status polling stalled");
                        return Err(TrackerError::Stalled { failures, last: err });
                    }
                }
                Err(err) => return Err(TrackerError::Api(err)),
            }
        }
    }

    /// Clamp an observation to the monotonic baseline
    async fn observe(&self, mut process: ExtractionProcess) -> ExtractionProcess {
        let mut baseline = self.baseline.lock().await;
        if baseline.requested_at != process.requested_at {
            // New run (or first observation): the old floor no longer applies.
            baseline.requested_at = process.requested_at;
            baseline.completeness = 0.0;
        }
        if let Some(c) = process.completeness {
            let clamped = c.max(baseline.completeness);
            if clamped > c {
                debug!(
                    book_id = %self.book_id,
                    reported = c,
                    floor = baseline.completeness,
                    "clamped regressing completeness"
                );
            }
            baseline.completeness = clamped;
            process.completeness = Some(clamped);
        }
        process
    }
}
