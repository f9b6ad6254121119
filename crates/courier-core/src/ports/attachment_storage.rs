use anyhow::Result;
use async_trait::async_trait;

use super::AttachmentStream;
use crate::attachment::{AttachmentRef, AttachmentState};
use crate::ids::{AttachmentId, MessageId};

/// Local message/attachment datastore.
///
/// Every operation is a single-row mutation or lookup; implementations are
/// expected to make each of them atomic.
#[async_trait]
pub trait AttachmentStoragePort: Send + Sync {
    /// Returns `Ok(None)` when the attachment no longer exists.
    async fn get_attachment_ref(&self, attachment_id: AttachmentId)
        -> Result<Option<AttachmentRef>>;

    /// Publish a state transition. Updating an attachment that does not exist
    /// is not an error.
    async fn set_attachment_state(
        &self,
        state: AttachmentState,
        attachment_id: AttachmentId,
        message_id: MessageId,
    ) -> Result<()>;

    /// Consume `content` and store it as the attachment's plaintext.
    async fn insert_attachment_content(
        &self,
        message_id: MessageId,
        attachment_id: AttachmentId,
        content: AttachmentStream,
    ) -> Result<()>;
}
