//! Multi-survey export orchestration
//!
//! [`ExportPipeline`] runs the submit-poll-download sequence for every
//! survey in a [`SurveyRegistry`]. Pipelines are independent: one survey's
//! failure never aborts the others, and results come back in registry order
//! regardless of completion order. Concurrency defaults to one pipeline at
//! a time and is raised through `export.max_concurrent_exports`.

use crate::client::ExportClient;
use crate::error::{Error, Result};
use crate::options::ExportOptions;
use crate::registry::{SurveyEntry, SurveyRegistry};
use crate::retry::with_retry;
use crate::types::SurveyId;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Result of one survey's export run
#[derive(Debug)]
pub struct SurveyOutcome {
    /// The survey this outcome belongs to
    pub survey: SurveyId,
    /// Display name from the registry
    pub name: String,
    /// The downloaded archive bytes, or why the export failed
    pub result: Result<Vec<u8>>,
}

/// Orchestrates export pipelines across a survey registry
#[derive(Debug)]
pub struct ExportPipeline {
    client: ExportClient,
    cancel: CancellationToken,
}

impl ExportPipeline {
    /// Build a pipeline around a client
    pub fn new(client: ExportClient) -> Self {
        Self {
            client,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels every running and queued pipeline when fired
    ///
    /// Cancellation is cooperative: in-flight requests finish, but no new
    /// poll iteration or download starts afterwards, and no partial archive
    /// is returned.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Export every survey in the registry
    ///
    /// Starts one pipeline per entry, bounded by
    /// `export.max_concurrent_exports` (default 1, which reproduces strict
    /// sequential processing). Failures are isolated per survey; the
    /// returned outcomes are in registry order.
    pub async fn run(
        &self,
        registry: &SurveyRegistry,
        options: &ExportOptions,
    ) -> Vec<SurveyOutcome> {
        let limit = self.client.config().export.max_concurrent_exports;
        let semaphore = Arc::new(Semaphore::new(limit));
        info!(
            surveys = registry.len(),
            max_concurrent = limit,
            "starting export run"
        );

        let pipelines = registry.iter().map(|entry| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => self.export_one(entry, options).await,
                    // The semaphore is never closed; treat it like cancellation
                    Err(_) => Err(Error::Cancelled),
                };
                match &result {
                    Ok(bytes) => {
                        info!(survey = %entry.id, name = %entry.name, bytes = bytes.len(), "export finished")
                    }
                    Err(e) => {
                        error!(survey = %entry.id, name = %entry.name, error = %e, "export failed")
                    }
                }
                SurveyOutcome {
                    survey: entry.id.clone(),
                    name: entry.name.clone(),
                    result,
                }
            }
        });

        // join_all keeps registry order while the semaphore bounds parallelism
        futures::future::join_all(pipelines).await
    }

    /// Export a single survey, retrying transient failures
    ///
    /// Retries re-run the whole submit-poll-download sequence with the
    /// configured backoff; a poll that saw a classified error never resumes
    /// mid-job.
    pub async fn export_one(
        &self,
        entry: &SurveyEntry,
        options: &ExportOptions,
    ) -> Result<Vec<u8>> {
        with_retry(&self.client.config().retry, || self.attempt(entry, options)).await
    }

    async fn attempt(&self, entry: &SurveyEntry, options: &ExportOptions) -> Result<Vec<u8>> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let handle = self.client.submit(&entry.id, options).await?;

        let poll = self.client.poll(&handle, &self.cancel);
        let file = match self.client.config().export.poll_deadline {
            Some(deadline) => tokio::time::timeout(deadline, poll)
                .await
                .map_err(|_| Error::DeadlineElapsed {
                    elapsed_secs: deadline.as_secs(),
                })??,
            None => poll.await?,
        };

        let stream = self.client.download(&handle, &file).await?;
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            bytes = stream.collect() => bytes,
        }
    }
}
