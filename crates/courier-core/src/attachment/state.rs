use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Download lifecycle of an attachment, as observed by anyone reading the datastore.
///
/// - `Pending`: pointer received, nothing attempted yet
/// - `Started`: a download job is (or was last) working on it
/// - `Failed`: a job gave up; durable marker distinct from a silent retry
/// - `Done`: decrypted content has been inserted into message storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentState {
    Pending,
    Started,
    Failed,
    Done,
}

impl AttachmentState {
    /// String representation for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentState::Pending => "Pending",
            AttachmentState::Started => "Started",
            AttachmentState::Failed => "Failed",
            AttachmentState::Done => "Done",
        }
    }

    /// Whether no further job will change this state on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttachmentState::Failed | AttachmentState::Done)
    }
}

impl fmt::Display for AttachmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown attachment state: {0}")]
pub struct ParseAttachmentStateError(pub String);

impl FromStr for AttachmentState {
    type Err = ParseAttachmentStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(AttachmentState::Pending),
            "Started" => Ok(AttachmentState::Started),
            "Failed" => Ok(AttachmentState::Failed),
            "Done" => Ok(AttachmentState::Done),
            other => Err(ParseAttachmentStateError(other.to_string())),
        }
    }
}
