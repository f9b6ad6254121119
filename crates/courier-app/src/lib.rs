//! Courier Application Orchestration Layer
//!
//! This crate contains the attachment download job and the runner that owns
//! its retry budget.

pub mod deps;
pub mod jobs;

pub use deps::AttachmentJobDeps;
pub use jobs::{
    AttachmentDownloadJob, AttachmentDownloadJobFactory, AttachmentJobSettings, Job, JobReport,
    JobRunner, JobStatus, TempBlob, DEFAULT_MAX_ATTACHMENT_BYTES,
};
