use super::error::{AttachmentJobError, FailureClass};

/// Result of a single job execution, handed back to the owner.
///
/// The job reports exactly one outcome per invocation and never loops;
/// retry scheduling belongs to the owner.
#[derive(Debug)]
pub enum JobOutcome<E = AttachmentJobError> {
    Succeeded,
    /// Eligible for another attempt while the retry budget lasts.
    Failed(E),
    /// Must not be retried.
    FailedPermanently(E),
}

impl<E> JobOutcome<E> {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded)
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            JobOutcome::Succeeded => None,
            JobOutcome::Failed(err) | JobOutcome::FailedPermanently(err) => Some(err),
        }
    }

    pub fn failure_class(&self) -> Option<FailureClass> {
        match self {
            JobOutcome::Succeeded => None,
            JobOutcome::Failed(_) => Some(FailureClass::Retryable),
            JobOutcome::FailedPermanently(_) => Some(FailureClass::Permanent),
        }
    }
}

impl JobOutcome<AttachmentJobError> {
    /// Build the outcome matching an error's classification.
    pub fn from_error(err: AttachmentJobError) -> Self {
        match err.failure_class() {
            FailureClass::Permanent => JobOutcome::FailedPermanently(err),
            FailureClass::Retryable => JobOutcome::Failed(err),
        }
    }
}
