use async_trait::async_trait;
use courier_core::{JobData, JobDataError, JobOutcome};

/// A retryable unit of work driven by a [`JobRunner`](super::JobRunner).
///
/// A job reports exactly one [`JobOutcome`] per `execute` call. Counting
/// failures, waiting between attempts and giving up belong to the owner.
#[async_trait]
pub trait Job: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Key of the factory able to rebuild this job from its [`JobData`].
    fn factory_key(&self) -> &'static str;

    /// Short human readable label used in logs and reports.
    fn describe(&self) -> String;

    /// Number of retryable failures after which the owner gives up.
    fn max_failure_count(&self) -> u32;

    async fn execute(&self) -> JobOutcome<Self::Error>;

    /// Called by the owner once the retry budget is spent.
    async fn on_retries_exhausted(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn to_job_data(&self) -> Result<JobData, JobDataError>;
}
