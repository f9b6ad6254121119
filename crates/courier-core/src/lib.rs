//! # courier-core
//!
//! Core domain models and ports for the Courier attachment pipeline.
//!
//! This crate contains pure business logic without any infrastructure dependencies.

pub mod attachment;
pub mod config;
pub mod ids;
pub mod job;
pub mod ports;

// Re-export commonly used types at the crate root
pub use attachment::{AttachmentRef, AttachmentState};
pub use config::AppConfig;
pub use ids::{AttachmentId, MessageId};
pub use job::{
    AttachmentDownloadParams, AttachmentJobError, DecryptError, DownloadError, FailureClass,
    JobData, JobDataError, JobOutcome, RetryPolicy,
};
