use std::path::Path;

use async_trait::async_trait;

use super::AttachmentStream;
use crate::job::DecryptError;

#[async_trait]
pub trait AttachmentCipherPort: Send + Sync {
    /// Open an encrypted attachment for reading.
    ///
    /// The returned stream only yields plaintext whose digest, authentication
    /// tag and size (`expected_size`, `0` when unknown) all verified.
    ///
    /// Failure mapping:
    /// - Envelope structurally invalid -> DecryptError::ParseFailure
    /// - Digest or tag mismatch        -> DecryptError::AuthFailure
    async fn open_authenticated(
        &self,
        source: &Path,
        expected_size: u64,
        key: &[u8],
        digest: &[u8],
    ) -> Result<AttachmentStream, DecryptError>;
}
