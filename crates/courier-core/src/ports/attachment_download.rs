use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::job::DownloadError;

/// How the file server wraps the blob in its response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// The body is the blob itself.
    #[default]
    Raw,
    /// The body is `{"result": "<base64 blob>"}`.
    JsonEnvelope,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    pub response_format: ResponseFormat,
    /// Per-request timeout; `None` leaves the client default in place.
    pub timeout: Option<Duration>,
}

#[async_trait]
pub trait AttachmentDownloadPort: Send + Sync {
    /// Fetch `url` into `destination`, failing with
    /// [`DownloadError::SizeExceeded`] once more than `max_bytes` arrive.
    async fn download(
        &self,
        destination: &Path,
        url: &str,
        max_bytes: u64,
        options: &DownloadOptions,
    ) -> Result<(), DownloadError>;
}
