//! Sequential job runner owning the retry budget.

use std::time::Duration;

use courier_core::{JobOutcome, RetryPolicy};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, info_span, warn, Instrument};

use super::Job;

/// Final verdict for one job, after all of its attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded,
    FailedPermanently { error: String },
    RetriesExhausted { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job: String,
    pub factory_key: &'static str,
    pub attempts: u32,
    pub status: JobStatus,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Succeeded
    }
}

/// Pulls jobs from a channel and drives each one until it succeeds, fails
/// permanently or runs out of retries.
pub struct JobRunner<J: Job> {
    job_rx: mpsc::Receiver<J>,
    report_tx: Option<mpsc::Sender<JobReport>>,
    retry_backoff: Duration,
}

impl<J: Job> JobRunner<J> {
    pub fn new(job_rx: mpsc::Receiver<J>, retry_backoff: Duration) -> Self {
        Self {
            job_rx,
            report_tx: None,
            retry_backoff,
        }
    }

    /// Deliver a [`JobReport`] for every finished job.
    pub fn with_reports(mut self, report_tx: mpsc::Sender<JobReport>) -> Self {
        self.report_tx = Some(report_tx);
        self
    }

    /// Run until the job channel is closed.
    pub async fn run(mut self) {
        while let Some(job) = self.job_rx.recv().await {
            let span = info_span!(
                "app.job_runner",
                job = %job.describe(),
                factory_key = job.factory_key(),
            );
            let report = self.process_with_retry(&job).instrument(span).await;

            if let Some(report_tx) = &self.report_tx {
                if report_tx.send(report).await.is_err() {
                    warn!("Job report receiver dropped");
                }
            }
        }
    }

    async fn process_with_retry(&self, job: &J) -> JobReport {
        let policy = RetryPolicy::new(job.max_failure_count(), self.retry_backoff);
        let mut failure_count: u32 = 0;
        let mut attempts: u32 = 0;

        let status = loop {
            attempts = attempts.saturating_add(1);
            match job.execute().await {
                JobOutcome::Succeeded => {
                    info!(attempts, "Job succeeded");
                    break JobStatus::Succeeded;
                }
                JobOutcome::FailedPermanently(err) => {
                    error!(attempts, error = %err, "Job failed permanently");
                    break JobStatus::FailedPermanently {
                        error: err.to_string(),
                    };
                }
                JobOutcome::Failed(err) => {
                    failure_count = failure_count.saturating_add(1);
                    if !policy.should_retry(failure_count) {
                        error!(
                            failure_count,
                            max_failure_count = policy.max_failure_count,
                            error = %err,
                            "Job exhausted its retries"
                        );
                        if let Err(hook_err) = job.on_retries_exhausted().await {
                            error!(error = %hook_err, "Failed to finalize exhausted job");
                        }
                        break JobStatus::RetriesExhausted {
                            error: err.to_string(),
                        };
                    }

                    let backoff = policy.backoff_for(failure_count);
                    warn!(
                        failure_count,
                        max_failure_count = policy.max_failure_count,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Job failed; retrying"
                    );
                    sleep(backoff).await;
                }
            }
        };

        JobReport {
            job: job.describe(),
            factory_key: job.factory_key(),
            attempts,
            status,
        }
    }
}
