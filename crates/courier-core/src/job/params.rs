use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{AttachmentId, MessageId};

/// Factory key under which attachment download jobs are persisted.
pub const ATTACHMENT_DOWNLOAD_JOB_KEY: &str = "AttachmentDownloadJob";

/// The only job state that has to survive a process restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDownloadParams {
    pub attachment_id: AttachmentId,
    pub message_id: MessageId,
}

/// Persisted form of a job: the factory that can rebuild it plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobData {
    pub factory_key: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum JobDataError {
    #[error("job data belongs to factory {found}, expected {expected}")]
    FactoryMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("malformed job payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl AttachmentDownloadParams {
    pub fn new(attachment_id: AttachmentId, message_id: MessageId) -> Self {
        Self {
            attachment_id,
            message_id,
        }
    }

    pub fn to_job_data(&self) -> Result<JobData, JobDataError> {
        Ok(JobData {
            factory_key: ATTACHMENT_DOWNLOAD_JOB_KEY.to_string(),
            payload: serde_json::to_value(self)?,
        })
    }

    pub fn from_job_data(data: &JobData) -> Result<Self, JobDataError> {
        if data.factory_key != ATTACHMENT_DOWNLOAD_JOB_KEY {
            return Err(JobDataError::FactoryMismatch {
                expected: ATTACHMENT_DOWNLOAD_JOB_KEY,
                found: data.factory_key.clone(),
            });
        }
        Ok(serde_json::from_value(data.payload.clone())?)
    }
}

impl JobData {
    pub fn to_json(&self) -> Result<String, JobDataError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, JobDataError> {
        Ok(serde_json::from_str(json)?)
    }
}
