use std::path::PathBuf;
use std::sync::Arc;

use courier_core::ports::DownloadOptions;
use courier_core::{
    job::DEFAULT_MAX_FAILURE_COUNT, AttachmentDownloadParams, AttachmentId, JobData, JobDataError,
    MessageId,
};

use super::AttachmentDownloadJob;
use crate::deps::AttachmentJobDeps;

/// Largest attachment transfer accepted by the file server.
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Knobs shared by every attachment download job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentJobSettings {
    /// Where per-attempt temp blobs are created.
    pub cache_dir: PathBuf,
    pub max_attachment_bytes: u64,
    pub download_options: DownloadOptions,
    pub max_failure_count: u32,
}

impl AttachmentJobSettings {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            download_options: DownloadOptions::default(),
            max_failure_count: DEFAULT_MAX_FAILURE_COUNT,
        }
    }
}

/// Builds attachment download jobs, either for a freshly received pointer
/// or from persisted [`JobData`] after a restart.
#[derive(Clone)]
pub struct AttachmentDownloadJobFactory {
    deps: AttachmentJobDeps,
    settings: Arc<AttachmentJobSettings>,
}

impl AttachmentDownloadJobFactory {
    pub fn new(deps: AttachmentJobDeps, settings: AttachmentJobSettings) -> Self {
        Self {
            deps,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &AttachmentJobSettings {
        &self.settings
    }

    pub fn create(
        &self,
        attachment_id: AttachmentId,
        message_id: MessageId,
    ) -> AttachmentDownloadJob {
        AttachmentDownloadJob::new(
            AttachmentDownloadParams::new(attachment_id, message_id),
            self.deps.clone(),
            Arc::clone(&self.settings),
        )
    }

    pub fn restore(&self, data: &JobData) -> Result<AttachmentDownloadJob, JobDataError> {
        let params = AttachmentDownloadParams::from_job_data(data)?;
        Ok(self.create(params.attachment_id, params.message_id))
    }
}
