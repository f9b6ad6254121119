use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use diesel::prelude::*;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use courier_core::ports::{AttachmentStoragePort, AttachmentStream};
use courier_core::{AttachmentId, AttachmentRef, AttachmentState, MessageId};

use crate::db::models::{AttachmentRow, NewAttachmentRow, NewMessageRow};
use crate::db::ports::{DbExecutor, InsertMapper, RowMapper};
use crate::db::schema::{attachment, message};

/// SQLite-backed attachment store.
///
/// Pointer metadata and state live in the `attachment` table; decrypted
/// content is written to `<parts_dir>/<message_id>/<attachment_id>.bin`.
pub struct DieselAttachmentRepository<E, M> {
    executor: E,
    mapper: M,
    parts_dir: PathBuf,
}

impl<E, M> DieselAttachmentRepository<E, M> {
    pub fn new(executor: E, mapper: M, parts_dir: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            mapper,
            parts_dir: parts_dir.into(),
        }
    }

    pub fn part_path(&self, message_id: MessageId, attachment_id: AttachmentId) -> PathBuf {
        self.parts_dir
            .join(message_id.to_string())
            .join(format!("{attachment_id}.bin"))
    }
}

impl<E, M> DieselAttachmentRepository<E, M>
where
    E: DbExecutor,
    M: InsertMapper<AttachmentRef, NewAttachmentRow> + RowMapper<AttachmentRow, AttachmentRef>,
{
    /// Record an incoming message. Registering the same message twice is a no-op.
    pub fn insert_message(&self, message_id: MessageId) -> Result<()> {
        let row = NewMessageRow {
            id: message_id.value(),
            received_at_ms: chrono::Utc::now().timestamp_millis(),
        };
        self.executor.run(|conn| {
            diesel::insert_or_ignore_into(message::table)
                .values(&row)
                .execute(conn)
                .with_context(|| format!("failed to insert message {message_id}"))?;
            Ok(())
        })
    }

    /// Record an attachment pointer in `Pending` state.
    pub fn insert_attachment_pointer(&self, pointer: &AttachmentRef) -> Result<()> {
        let row = self.mapper.to_row(pointer)?;
        self.executor.run(|conn| {
            diesel::insert_into(attachment::table)
                .values(&row)
                .execute(conn)
                .with_context(|| {
                    format!(
                        "failed to insert attachment {} of message {}",
                        pointer.id, pointer.message_id
                    )
                })?;
            Ok(())
        })
    }

    pub fn get_attachment_state(
        &self,
        attachment_id: AttachmentId,
    ) -> Result<Option<AttachmentState>> {
        let state = self.executor.run(|conn| {
            attachment::table
                .filter(attachment::id.eq(attachment_id.value()))
                .select(attachment::state)
                .first::<String>(conn)
                .optional()
                .map_err(|e| anyhow!(e))
        })?;

        state
            .map(|s| s.parse::<AttachmentState>().map_err(|e| anyhow!(e)))
            .transpose()
    }

    /// Location of the stored content, once the attachment is `Done`.
    pub fn get_stored_part(&self, attachment_id: AttachmentId) -> Result<Option<PathBuf>> {
        let part = self.executor.run(|conn| {
            attachment::table
                .filter(attachment::id.eq(attachment_id.value()))
                .select(attachment::part_path)
                .first::<Option<String>>(conn)
                .optional()
                .map_err(|e| anyhow!(e))
        })?;

        Ok(part.flatten().map(PathBuf::from))
    }

    fn belongs_to(&self, attachment_id: AttachmentId, message_id: MessageId) -> Result<bool> {
        let count = self.executor.run(|conn| {
            attachment::table
                .filter(attachment::id.eq(attachment_id.value()))
                .filter(attachment::message_id.eq(message_id.value()))
                .count()
                .get_result::<i64>(conn)
                .map_err(|e| anyhow!(e))
        })?;
        Ok(count > 0)
    }

    fn mark_done(
        &self,
        attachment_id: AttachmentId,
        message_id: MessageId,
        part_path: &Path,
        stored_bytes: u64,
    ) -> Result<usize> {
        let part_path = part_path
            .to_str()
            .ok_or_else(|| anyhow!("part path is not valid UTF-8: {}", part_path.display()))?
            .to_string();
        let stored_bytes = i64::try_from(stored_bytes)?;

        self.executor.run(|conn| {
            diesel::update(
                attachment::table
                    .filter(attachment::id.eq(attachment_id.value()))
                    .filter(attachment::message_id.eq(message_id.value())),
            )
            .set((
                attachment::state.eq(AttachmentState::Done.as_str()),
                attachment::part_path.eq(Some(part_path)),
                attachment::stored_bytes.eq(Some(stored_bytes)),
                attachment::updated_at_ms.eq(chrono::Utc::now().timestamp_millis()),
            ))
            .execute(conn)
            .map_err(|e| anyhow!(e))
        })
    }
}

#[async_trait]
impl<E, M> AttachmentStoragePort for DieselAttachmentRepository<E, M>
where
    E: DbExecutor,
    M: InsertMapper<AttachmentRef, NewAttachmentRow>
        + RowMapper<AttachmentRow, AttachmentRef>
        + Send
        + Sync,
{
    async fn get_attachment_ref(
        &self,
        attachment_id: AttachmentId,
    ) -> Result<Option<AttachmentRef>> {
        self.executor
            .run(|conn| {
                let row = attachment::table
                    .filter(attachment::id.eq(attachment_id.value()))
                    .first::<AttachmentRow>(conn)
                    .optional()?;

                match row {
                    Some(r) => Ok(Some(self.mapper.to_domain(&r)?)),
                    None => Ok(None),
                }
            })
            .with_context(|| format!("failed to load attachment {attachment_id}"))
    }

    async fn set_attachment_state(
        &self,
        state: AttachmentState,
        attachment_id: AttachmentId,
        message_id: MessageId,
    ) -> Result<()> {
        let affected = self
            .executor
            .run(|conn| {
                diesel::update(
                    attachment::table
                        .filter(attachment::id.eq(attachment_id.value()))
                        .filter(attachment::message_id.eq(message_id.value())),
                )
                .set((
                    attachment::state.eq(state.as_str()),
                    attachment::updated_at_ms.eq(chrono::Utc::now().timestamp_millis()),
                ))
                .execute(conn)
                .map_err(|e| anyhow!(e))
            })
            .with_context(|| format!("failed to set attachment {attachment_id} to {state}"))?;

        if affected == 0 {
            debug!(
                attachment_id = %attachment_id,
                message_id = %message_id,
                state = %state,
                "No attachment row to update"
            );
        }
        Ok(())
    }

    async fn insert_attachment_content(
        &self,
        message_id: MessageId,
        attachment_id: AttachmentId,
        mut content: AttachmentStream,
    ) -> Result<()> {
        if !self.belongs_to(attachment_id, message_id)? {
            bail!("attachment {attachment_id} does not belong to message {message_id}");
        }

        let part_path = self.part_path(message_id, attachment_id);
        let partial_path = part_path.with_extension("partial");
        if let Some(parent) = part_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let written = async {
            let mut file = tokio::fs::File::create(&partial_path).await?;
            let written = tokio::io::copy(&mut content, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            tokio::fs::rename(&partial_path, &part_path).await?;
            Ok::<u64, std::io::Error>(written)
        }
        .await;

        let written = match written {
            Ok(written) => written,
            Err(err) => {
                remove_quietly(&partial_path).await;
                return Err(err).with_context(|| {
                    format!("failed to write attachment part {}", part_path.display())
                });
            }
        };

        let affected = match self.mark_done(attachment_id, message_id, &part_path, written) {
            Ok(affected) => affected,
            Err(err) => {
                remove_quietly(&part_path).await;
                return Err(err.context(format!("failed to mark attachment {attachment_id} done")));
            }
        };
        if affected == 0 {
            remove_quietly(&part_path).await;
            bail!("attachment {attachment_id} disappeared while storing its content");
        }

        debug!(
            attachment_id = %attachment_id,
            message_id = %message_id,
            bytes = written,
            path = %part_path.display(),
            "Stored attachment content"
        );
        Ok(())
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "Failed to remove attachment part");
        }
    }
}
