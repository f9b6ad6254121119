use thiserror::Error;

/// Whether retrying could plausibly change the outcome of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Retry cannot help; the attachment is marked failed.
    Permanent,
    /// A later attempt may succeed; attachment state is left untouched.
    Retryable,
}

/// Errors reported by the download collaborator.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote answered, but not with an attachment (e.g. an error page).
    #[error("failed to parse download response: {0}")]
    ParseFailure(String),

    #[error("download exceeds the {max_bytes} byte limit")]
    SizeExceeded { max_bytes: u64 },

    #[error("failed to write download: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    pub fn failure_class(&self) -> FailureClass {
        match self {
            DownloadError::ParseFailure(_) => FailureClass::Permanent,
            DownloadError::Transport(_)
            | DownloadError::SizeExceeded { .. }
            | DownloadError::Io(_) => FailureClass::Retryable,
        }
    }
}

/// Errors reported by the authenticated-decryption collaborator.
#[derive(Debug, Error)]
pub enum DecryptError {
    /// The envelope is structurally invalid.
    #[error("malformed attachment envelope: {0}")]
    ParseFailure(String),

    #[error("attachment failed authentication")]
    AuthFailure,

    #[error("attachment size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("invalid attachment key: {0}")]
    InvalidKey(String),

    #[error("failed to read attachment: {0}")]
    Io(#[from] std::io::Error),
}

impl DecryptError {
    pub fn failure_class(&self) -> FailureClass {
        match self {
            DecryptError::ParseFailure(_) => FailureClass::Permanent,
            // An authentication failure cannot be told apart from a transient
            // read problem, so it stays retryable.
            DecryptError::AuthFailure
            | DecryptError::SizeMismatch { .. }
            | DecryptError::InvalidKey(_)
            | DecryptError::Io(_) => FailureClass::Retryable,
        }
    }
}

/// Cause attached to a failed attachment download attempt.
#[derive(Debug, Error)]
pub enum AttachmentJobError {
    #[error("no such attachment")]
    NoAttachment,

    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("decryption failed: {0}")]
    Decrypt(#[from] DecryptError),

    #[error("storage error: {0:#}")]
    Storage(#[source] anyhow::Error),

    #[error("temporary file error: {0}")]
    TempFile(#[source] std::io::Error),
}

impl AttachmentJobError {
    /// Pure mapping from error kind to failure class.
    ///
    /// Anything not explicitly recognised as permanent is retryable, so an
    /// attachment is never dropped because of an unexpected error.
    pub fn failure_class(&self) -> FailureClass {
        match self {
            AttachmentJobError::NoAttachment => FailureClass::Permanent,
            AttachmentJobError::Download(err) => err.failure_class(),
            AttachmentJobError::Decrypt(err) => err.failure_class(),
            AttachmentJobError::Storage(_) | AttachmentJobError::TempFile(_) => {
                FailureClass::Retryable
            }
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.failure_class() == FailureClass::Permanent
    }
}
