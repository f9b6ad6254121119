use anyhow::{Context, Result};
use courier_core::{AttachmentId, AttachmentRef, AttachmentState, MessageId};

use crate::db::models::{AttachmentRow, NewAttachmentRow};
use crate::db::ports::{InsertMapper, RowMapper};

pub struct AttachmentRowMapper;

impl InsertMapper<AttachmentRef, NewAttachmentRow> for AttachmentRowMapper {
    fn to_row(&self, domain: &AttachmentRef) -> Result<NewAttachmentRow> {
        let size_bytes = i64::try_from(domain.size)
            .with_context(|| format!("attachment size {} out of range", domain.size))?;

        Ok(NewAttachmentRow {
            id: domain.id.value(),
            message_id: domain.message_id.value(),
            url: domain.url.clone(),
            size_bytes,
            encryption_key: domain.key.clone(),
            digest: domain.digest.clone(),
            content_type: domain.content_type.clone(),
            state: AttachmentState::Pending.as_str().to_string(),
            updated_at_ms: chrono::Utc::now().timestamp_millis(),
        })
    }
}

impl RowMapper<AttachmentRow, AttachmentRef> for AttachmentRowMapper {
    fn to_domain(&self, row: &AttachmentRow) -> Result<AttachmentRef> {
        let size = u64::try_from(row.size_bytes)
            .with_context(|| format!("invalid size_bytes for attachment {}", row.id))?;

        Ok(AttachmentRef {
            id: AttachmentId::new(row.id),
            message_id: MessageId::new(row.message_id),
            url: row.url.clone(),
            size,
            key: row.encryption_key.clone(),
            digest: row.digest.clone(),
            content_type: row.content_type.clone(),
        })
    }
}
