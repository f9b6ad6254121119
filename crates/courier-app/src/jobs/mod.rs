//! Retryable units of work and the runner that owns their retry budget.

mod attachment_download;
mod factory;
mod job;
mod runner;
mod temp_blob;

pub use attachment_download::AttachmentDownloadJob;
pub use factory::{
    AttachmentDownloadJobFactory, AttachmentJobSettings, DEFAULT_MAX_ATTACHMENT_BYTES,
};
pub use job::Job;
pub use runner::{JobReport, JobRunner, JobStatus};
pub use temp_blob::TempBlob;
