use std::io::Cursor;
use std::path::Path;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::Result;
use async_trait::async_trait;
use courier_core::ports::{AttachmentCipherPort, AttachmentStream};
use courier_core::DecryptError;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Encrypted attachment as uploaded: `nonce || ciphertext || tag`, plus the
/// SHA-256 digest of that envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedAttachment {
    pub envelope: Vec<u8>,
    pub digest: Vec<u8>,
}

/// AES-256-GCM attachment envelopes with a detached SHA-256 digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmAttachmentCipher;

impl AesGcmAttachmentCipher {
    pub fn new() -> Self {
        Self
    }

    pub fn seal(&self, plaintext: &[u8], key: &[u8]) -> Result<SealedAttachment> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| anyhow::anyhow!("attachment key must be {KEY_LEN} bytes"))?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| anyhow::anyhow!("Failed to encrypt: {}", e))?;

        let envelope = [nonce.as_slice(), &ciphertext].concat();
        let digest = Sha256::digest(&envelope).to_vec();
        Ok(SealedAttachment { envelope, digest })
    }

    /// Verify and decrypt an envelope held in memory.
    pub fn open(
        &self,
        envelope: &[u8],
        expected_size: u64,
        key: &[u8],
        digest: &[u8],
    ) -> Result<Vec<u8>, DecryptError> {
        if envelope.len() < NONCE_LEN + TAG_LEN {
            return Err(DecryptError::ParseFailure(format!(
                "envelope of {} bytes is shorter than nonce and tag",
                envelope.len()
            )));
        }

        let computed = Sha256::digest(envelope);
        if !bool::from(computed.as_slice().ct_eq(digest)) {
            return Err(DecryptError::AuthFailure);
        }

        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
            DecryptError::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", key.len()))
        })?;
        let (nonce, ciphertext) = envelope.split_at(NONCE_LEN);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| DecryptError::AuthFailure)?;

        let actual = plaintext.len() as u64;
        if expected_size != 0 && actual != expected_size {
            return Err(DecryptError::SizeMismatch {
                expected: expected_size,
                actual,
            });
        }

        Ok(plaintext)
    }
}

#[async_trait]
impl AttachmentCipherPort for AesGcmAttachmentCipher {
    async fn open_authenticated(
        &self,
        source: &Path,
        expected_size: u64,
        key: &[u8],
        digest: &[u8],
    ) -> Result<AttachmentStream, DecryptError> {
        let envelope = tokio::fs::read(source).await?;
        let plaintext = self.open(&envelope, expected_size, key, digest)?;
        Ok(Box::pin(Cursor::new(plaintext)))
    }
}
