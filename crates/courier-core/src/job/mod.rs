//! Attachment download job: error taxonomy, outcome, retry budget and
//! persisted parameters.

mod error;
mod outcome;
mod params;
mod retry;

pub use error::{AttachmentJobError, DecryptError, DownloadError, FailureClass};
pub use outcome::JobOutcome;
pub use params::{AttachmentDownloadParams, JobData, JobDataError, ATTACHMENT_DOWNLOAD_JOB_KEY};
pub use retry::{RetryPolicy, DEFAULT_MAX_FAILURE_COUNT};
