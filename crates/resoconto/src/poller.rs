//! Report generation polling.
//!
//! A generation is a strictly sequential loop: create, one best-effort early
//! read, then fetch / sleep until the report reaches `ready` or `failed` or
//! the deadline passes. Every snapshot is merged into the shared
//! [`ReportStore`] as it arrives. Dropping the `generate` future stops the
//! loop.

use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::client::{codes, ApiError, ReportApi};
use crate::config::PollConfig;
use crate::markdown::normalize_markdown;
use crate::store::ReportStore;
use crate::types::{GenerationRequest, Report, ReportStatus};

/// Deadline used when the configured timeout does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Error)]
pub enum ReportError {
    /// The backend marked the report failed
    #[error("report generation failed: {0}")]
    GenerationFailed(String),

    /// No terminal state was observed before the deadline
    #[error("report generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    /// The backend refused an edit or confirmation because the report is
    /// not ready
    #[error("report {id} is not ready: {msg}")]
    NotReady { id: String, msg: String },

    #[error(transparent)]
    Transport(#[from] ApiError),
}

impl ReportError {
    fn from_api(id: &str, err: ApiError) -> Self {
        if err.code == codes::REPORT_NOT_READY {
            ReportError::NotReady {
                id: id.to_string(),
                msg: err.msg,
            }
        } else {
            ReportError::Transport(err)
        }
    }
}

/// Drives report generation and confirmation against a [`ReportApi`]
pub struct ReportPoller<A> {
    api: A,
    config: PollConfig,
    store: ReportStore,
}

impl<A: ReportApi> ReportPoller<A> {
    pub fn new(api: A, config: PollConfig, store: ReportStore) -> Self {
        Self { api, config, store }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Generate a report and wait for it to become ready.
    ///
    /// Intermediate snapshots are merged into the store as they are fetched.
    /// Failed and timed-out generations are returned as errors and never
    /// retried here.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Report, ReportError> {
        let started = Instant::now();
        let deadline = started
            .checked_add(self.config.timeout)
            .unwrap_or_else(|| started + FAR_FUTURE);

        let id = self.api.create_report(request).await?;
        info!(id = %id, key = %request.key(), "Report generation queued");

        let mut last_status = None;

        // Early read so observers see queued/processing sooner. Errors here
        // are not fatal.
        match timeout_at(deadline, self.api.get_report(&id)).await {
            Ok(Ok(snapshot)) => {
                self.observe(&mut last_status, &snapshot);
                self.store.merge(snapshot).await;
            }
            Ok(Err(e)) => debug!(id = %id, error = %e, "Placeholder fetch failed"),
            Err(_) => debug!(id = %id, "Placeholder fetch hit the deadline"),
        }

        let mut polls = 0u32;
        loop {
            if Instant::now() >= deadline {
                warn!(id = %id, polls, "Report generation timed out");
                return Err(ReportError::GenerationTimeout(self.config.timeout));
            }

            let snapshot = match timeout_at(deadline, self.api.get_report(&id)).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(id = %id, polls, "Report generation timed out during fetch");
                    return Err(ReportError::GenerationTimeout(self.config.timeout));
                }
            };
            polls += 1;

            self.observe(&mut last_status, &snapshot);
            self.store.merge(snapshot.clone()).await;

            match snapshot.status {
                ReportStatus::Ready => {
                    if !snapshot.matches(request) {
                        warn!(id = %id, key = %request.key(), "Ready report covers a different range or template");
                    }
                    info!(id = %id, polls, "Report ready");
                    return Ok(snapshot);
                }
                ReportStatus::Failed => {
                    let reason = snapshot.failure_reason().to_string();
                    warn!(id = %id, polls, reason = %reason, "Report generation failed");
                    return Err(ReportError::GenerationFailed(reason));
                }
                ReportStatus::Queued | ReportStatus::Processing => {
                    debug!(id = %id, status = %snapshot.status, polls, "Report still in progress");
                }
            }

            sleep(self.config.interval).await;
        }
    }

    /// Track the status sequence of one generation; out-of-order moves are
    /// logged and the latest snapshot is kept
    fn observe(&self, last: &mut Option<ReportStatus>, snapshot: &Report) {
        if let Some(prev) = *last {
            if !prev.can_transition_to(snapshot.status) {
                warn!(
                    id = %snapshot.id,
                    from = %prev,
                    to = %snapshot.status,
                    "Report status moved out of order, keeping latest"
                );
            }
        }
        *last = Some(snapshot.status);
    }

    /// Persist new content. The stored copy loses its confirmation.
    ///
    /// `content` may be editor HTML or markdown; it is stored as markdown.
    pub async fn edit(&self, id: &str, content: &str) -> Result<Report, ReportError> {
        self.save_content(id, content).await?;
        let snapshot = self.api.get_report(id).await?;
        self.store.merge(snapshot.clone()).await;
        Ok(snapshot)
    }

    async fn save_content(&self, id: &str, content: &str) -> Result<(), ReportError> {
        let markdown = normalize_markdown(content);
        self.api
            .edit_report(id, &markdown)
            .await
            .map_err(|e| ReportError::from_api(id, e))?;
        self.store.mark_unconfirmed(id).await;
        Ok(())
    }

    /// Confirm a report, saving `content` first when given.
    ///
    /// Callers only offer this for ready reports; a backend rejection still
    /// surfaces as [`ReportError::NotReady`].
    pub async fn confirm(&self, id: &str, content: Option<&str>) -> Result<Report, ReportError> {
        if let Some(content) = content {
            self.save_content(id, content).await?;
        }

        self.api
            .confirm_report(id)
            .await
            .map_err(|e| ReportError::from_api(id, e))?;

        let snapshot = self.api.get_report(id).await?;
        self.store.merge(snapshot.clone()).await;
        info!(id = %id, confirmed = snapshot.confirmed, "Report confirmed");
        Ok(snapshot)
    }
}
