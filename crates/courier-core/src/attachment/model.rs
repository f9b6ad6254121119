use base64::prelude::*;

use crate::ids::{AttachmentId, MessageId};
use crate::job::DecryptError;

/// Pointer to a remote attachment, as recorded when the owning message arrived.
///
/// `key` and `digest` are either both meaningful (end-to-end encrypted
/// attachment) or one of them is missing, which marks an attachment served
/// in the clear (e.g. from an open group server).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub id: AttachmentId,
    pub message_id: MessageId,
    pub url: String,
    /// Plaintext size in bytes, `0` when the sender did not declare it.
    pub size: u64,
    /// Base64 encoded symmetric key.
    pub key: Option<String>,
    pub digest: Option<Vec<u8>>,
    pub content_type: Option<String>,
}

impl AttachmentRef {
    /// Whether the downloaded blob has to go through authenticated decryption.
    pub fn is_encrypted(&self) -> bool {
        let has_digest = self.digest.as_ref().is_some_and(|d| !d.is_empty());
        let has_key = self.key.as_ref().is_some_and(|k| !k.is_empty());
        has_digest && has_key
    }

    /// Decode the base64 key material.
    pub fn decode_key(&self) -> Result<Vec<u8>, DecryptError> {
        let key = self
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| DecryptError::InvalidKey("attachment has no key".to_string()))?;
        BASE64_STANDARD
            .decode(key)
            .map_err(|e| DecryptError::InvalidKey(e.to_string()))
    }
}
