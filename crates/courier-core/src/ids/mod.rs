//! ID type wrappers for type safety.
//!
//! Attachment and message ids come from the local message database, so they
//! are plain integers rather than generated UUIDs.

mod id_macro;

use id_macro::impl_numeric_id;
use serde::{Deserialize, Serialize};

/// Identifies an attachment row in the local message database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(i64);

/// Identifies the message record an attachment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl_numeric_id!(AttachmentId, MessageId);
