//! HTTP adapter for the attachment download port.

use std::path::Path;

use async_trait::async_trait;
use base64::prelude::*;
use courier_core::ports::{AttachmentDownloadPort, DownloadOptions, ResponseFormat};
use courier_core::DownloadError;
use reqwest::Response;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Slack on top of the base64 expansion of a JSON envelope.
const ENVELOPE_OVERHEAD_BYTES: u64 = 1024;

/// Body of a file server response in [`ResponseFormat::JsonEnvelope`] mode.
#[derive(Debug, Deserialize)]
struct FileServerResponse {
    result: String,
}

/// Streams attachment blobs from a file server with `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpAttachmentDownloader {
    client: reqwest::Client,
}

impl HttpAttachmentDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AttachmentDownloadPort for HttpAttachmentDownloader {
    async fn download(
        &self,
        destination: &Path,
        url: &str,
        max_bytes: u64,
        options: &DownloadOptions,
    ) -> Result<(), DownloadError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Transport(format!(
                "file server responded with {status}"
            )));
        }

        let body_limit = body_limit(options.response_format, max_bytes);
        if let Some(declared) = response.content_length() {
            if declared > body_limit {
                return Err(DownloadError::SizeExceeded { max_bytes });
            }
        }

        let written = match options.response_format {
            ResponseFormat::Raw => stream_raw(response, destination, max_bytes).await?,
            ResponseFormat::JsonEnvelope => {
                write_envelope(response, destination, max_bytes, body_limit).await?
            }
        };

        debug!(url, bytes = written, "Attachment blob downloaded");
        Ok(())
    }
}

fn body_limit(format: ResponseFormat, max_bytes: u64) -> u64 {
    match format {
        ResponseFormat::Raw => max_bytes,
        ResponseFormat::JsonEnvelope => max_bytes
            .saturating_mul(4)
            .div_ceil(3)
            .saturating_add(ENVELOPE_OVERHEAD_BYTES),
    }
}

async fn stream_raw(
    mut response: Response,
    destination: &Path,
    max_bytes: u64,
) -> Result<u64, DownloadError> {
    let mut file = tokio::fs::File::create(destination).await?;
    let mut total: u64 = 0;

    while let Some(chunk) = response.chunk().await.map_err(map_reqwest_error)? {
        total = total.saturating_add(chunk.len() as u64);
        if total > max_bytes {
            return Err(DownloadError::SizeExceeded { max_bytes });
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(total)
}

async fn write_envelope(
    mut response: Response,
    destination: &Path,
    max_bytes: u64,
    body_limit: u64,
) -> Result<u64, DownloadError> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(map_reqwest_error)? {
        if (body.len() + chunk.len()) as u64 > body_limit {
            return Err(DownloadError::SizeExceeded { max_bytes });
        }
        body.extend_from_slice(&chunk);
    }

    let envelope: FileServerResponse = serde_json::from_slice(&body)
        .map_err(|e| DownloadError::ParseFailure(format!("invalid file server response: {e}")))?;
    let blob = BASE64_STANDARD
        .decode(envelope.result.as_bytes())
        .map_err(|e| DownloadError::ParseFailure(format!("invalid base64 payload: {e}")))?;

    if blob.len() as u64 > max_bytes {
        return Err(DownloadError::SizeExceeded { max_bytes });
    }

    tokio::fs::write(destination, &blob).await?;
    Ok(blob.len() as u64)
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        DownloadError::Transport(format!("request timed out: {err}"))
    } else {
        DownloadError::Transport(err.to_string())
    }
}
