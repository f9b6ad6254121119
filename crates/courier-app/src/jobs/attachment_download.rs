//! Attachment download job.
//!
//! One execution resolves the attachment pointer, fetches the blob into a
//! per-attempt temp file, decrypts it when the pointer carries key material
//! and hands the plaintext to storage. Failures are classified and reported
//! back to the owner; the job never retries on its own.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, error, info, info_span, warn, Instrument};

use courier_core::job::ATTACHMENT_DOWNLOAD_JOB_KEY;
use courier_core::ports::AttachmentStream;
use courier_core::{
    AttachmentDownloadParams, AttachmentId, AttachmentJobError, AttachmentRef, AttachmentState,
    JobData, JobDataError, JobOutcome, MessageId,
};

use super::{AttachmentJobSettings, Job, TempBlob};
use crate::deps::AttachmentJobDeps;

pub struct AttachmentDownloadJob {
    params: AttachmentDownloadParams,
    deps: AttachmentJobDeps,
    settings: Arc<AttachmentJobSettings>,
}

impl AttachmentDownloadJob {
    pub fn new(
        params: AttachmentDownloadParams,
        deps: AttachmentJobDeps,
        settings: Arc<AttachmentJobSettings>,
    ) -> Self {
        Self {
            params,
            deps,
            settings,
        }
    }

    pub fn attachment_id(&self) -> AttachmentId {
        self.params.attachment_id
    }

    pub fn message_id(&self) -> MessageId {
        self.params.message_id
    }

    async fn attempt(&self) -> Result<(), AttachmentJobError> {
        let storage = &self.deps.storage;
        let AttachmentDownloadParams {
            attachment_id,
            message_id,
        } = self.params;

        let attachment = storage
            .get_attachment_ref(attachment_id)
            .await
            .map_err(AttachmentJobError::Storage)?
            .ok_or(AttachmentJobError::NoAttachment)?;

        storage
            .set_attachment_state(AttachmentState::Started, attachment_id, message_id)
            .await
            .map_err(AttachmentJobError::Storage)?;

        // Removed on drop, whichever way this attempt ends.
        let temp_blob =
            TempBlob::create_in(&self.settings.cache_dir).map_err(AttachmentJobError::TempFile)?;

        debug!(
            url = %attachment.url,
            path = %temp_blob.path().display(),
            "Downloading attachment"
        );
        self.deps
            .downloader
            .download(
                temp_blob.path(),
                &attachment.url,
                self.settings.max_attachment_bytes,
                &self.settings.download_options,
            )
            .await?;

        let content = self.open_content(&attachment, temp_blob.path()).await?;
        storage
            .insert_attachment_content(message_id, attachment.id, content)
            .await
            .map_err(AttachmentJobError::Storage)?;

        temp_blob.close();
        Ok(())
    }

    async fn open_content(
        &self,
        attachment: &AttachmentRef,
        path: &Path,
    ) -> Result<AttachmentStream, AttachmentJobError> {
        if !attachment.is_encrypted() {
            debug!("Attachment has no key material, storing downloaded bytes as-is");
            let file = tokio::fs::File::open(path)
                .await
                .map_err(AttachmentJobError::TempFile)?;
            return Ok(Box::pin(file));
        }

        let key = attachment.decode_key()?;
        let digest = attachment.digest.as_deref().unwrap_or_default();
        let plaintext = self
            .deps
            .cipher
            .open_authenticated(path, attachment.size, &key, digest)
            .await?;
        Ok(plaintext)
    }

    async fn mark_failed(&self) -> anyhow::Result<()> {
        self.deps
            .storage
            .set_attachment_state(
                AttachmentState::Failed,
                self.params.attachment_id,
                self.params.message_id,
            )
            .await
            .context("failed to mark attachment as failed")
    }
}

#[async_trait]
impl Job for AttachmentDownloadJob {
    type Error = AttachmentJobError;

    fn factory_key(&self) -> &'static str {
        ATTACHMENT_DOWNLOAD_JOB_KEY
    }

    fn describe(&self) -> String {
        format!(
            "attachment {} of message {}",
            self.params.attachment_id, self.params.message_id
        )
    }

    fn max_failure_count(&self) -> u32 {
        self.settings.max_failure_count
    }

    async fn execute(&self) -> JobOutcome<AttachmentJobError> {
        let span = info_span!(
            "job.attachment_download.execute",
            attachment_id = %self.params.attachment_id,
            message_id = %self.params.message_id,
        );

        async move {
            let err = match self.attempt().await {
                Ok(()) => {
                    info!("Attachment downloaded");
                    return JobOutcome::Succeeded;
                }
                Err(err) => err,
            };

            let outcome = JobOutcome::from_error(err);
            match &outcome {
                JobOutcome::FailedPermanently(err) => {
                    error!(error = %err, "Attachment download failed permanently");
                    if let Err(mark_err) = self.mark_failed().await {
                        error!(error = %mark_err, "Failed to publish failed attachment state");
                    }
                }
                JobOutcome::Failed(err) => {
                    warn!(error = %err, "Attachment download failed, eligible for retry");
                }
                JobOutcome::Succeeded => {}
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn on_retries_exhausted(&self) -> anyhow::Result<()> {
        self.mark_failed().await
    }

    fn to_job_data(&self) -> Result<JobData, JobDataError> {
        self.params.to_job_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use courier_core::ports::{
        AttachmentCipherPort, AttachmentDownloadPort, AttachmentStoragePort, DownloadOptions,
    };
    use courier_core::{DecryptError, DownloadError};
    use mockall::mock;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    const ATTACHMENT: AttachmentId = AttachmentId::new(5);
    const MESSAGE: MessageId = MessageId::new(10);

    // ---- Fakes -----------------------------------------------------------------

    #[derive(Default)]
    struct FakeStorage {
        attachments: Mutex<HashMap<AttachmentId, AttachmentRef>>,
        states: Mutex<Vec<(AttachmentState, AttachmentId, MessageId)>>,
        inserted: Mutex<Vec<(MessageId, AttachmentId, Vec<u8>)>>,
        fail_insert: bool,
    }

    impl FakeStorage {
        fn with_attachment(attachment: AttachmentRef) -> Self {
            let storage = Self::default();
            storage
                .attachments
                .lock()
                .unwrap()
                .insert(attachment.id, attachment);
            storage
        }

        fn states(&self) -> Vec<AttachmentState> {
            self.states.lock().unwrap().iter().map(|(s, _, _)| *s).collect()
        }
    }

    #[async_trait]
    impl AttachmentStoragePort for FakeStorage {
        async fn get_attachment_ref(
            &self,
            attachment_id: AttachmentId,
        ) -> anyhow::Result<Option<AttachmentRef>> {
            Ok(self.attachments.lock().unwrap().get(&attachment_id).cloned())
        }

        async fn set_attachment_state(
            &self,
            state: AttachmentState,
            attachment_id: AttachmentId,
            message_id: MessageId,
        ) -> anyhow::Result<()> {
            self.states
                .lock()
                .unwrap()
                .push((state, attachment_id, message_id));
            Ok(())
        }

        async fn insert_attachment_content(
            &self,
            message_id: MessageId,
            attachment_id: AttachmentId,
            mut content: AttachmentStream,
        ) -> anyhow::Result<()> {
            if self.fail_insert {
                anyhow::bail!("database is locked");
            }
            let mut bytes = Vec::new();
            content.read_to_end(&mut bytes).await?;
            self.inserted
                .lock()
                .unwrap()
                .push((message_id, attachment_id, bytes));
            Ok(())
        }
    }

    type ErrorFactory = Box<dyn Fn() -> DownloadError + Send + Sync>;

    struct FakeDownloader {
        body: Vec<u8>,
        fail_with: Option<ErrorFactory>,
        calls: AtomicUsize,
        destinations: Mutex<Vec<PathBuf>>,
    }

    impl FakeDownloader {
        fn serving(body: &[u8]) -> Self {
            Self {
                body: body.to_vec(),
                fail_with: None,
                calls: AtomicUsize::new(0),
                destinations: Mutex::new(Vec::new()),
            }
        }

        fn failing(factory: impl Fn() -> DownloadError + Send + Sync + 'static) -> Self {
            Self {
                fail_with: Some(Box::new(factory)),
                ..Self::serving(b"")
            }
        }
    }

    #[async_trait]
    impl AttachmentDownloadPort for FakeDownloader {
        async fn download(
            &self,
            destination: &Path,
            _url: &str,
            _max_bytes: u64,
            _options: &DownloadOptions,
        ) -> Result<(), DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.destinations
                .lock()
                .unwrap()
                .push(destination.to_path_buf());
            // Partial data lands on disk before the failure, like a dropped connection.
            tokio::fs::write(destination, &self.body).await?;
            match &self.fail_with {
                Some(factory) => Err(factory()),
                None => Ok(()),
            }
        }
    }

    enum CipherBehavior {
        Plaintext(Vec<u8>),
        AuthFailure,
        ParseFailure,
    }

    struct FakeCipher {
        behavior: CipherBehavior,
        calls: Mutex<Vec<(u64, Vec<u8>, Vec<u8>)>>,
    }

    impl FakeCipher {
        fn new(behavior: CipherBehavior) -> Self {
            Self {
                behavior,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AttachmentCipherPort for FakeCipher {
        async fn open_authenticated(
            &self,
            source: &Path,
            expected_size: u64,
            key: &[u8],
            digest: &[u8],
        ) -> Result<AttachmentStream, DecryptError> {
            assert!(source.exists(), "ciphertext must still be on disk");
            self.calls
                .lock()
                .unwrap()
                .push((expected_size, key.to_vec(), digest.to_vec()));
            match &self.behavior {
                CipherBehavior::Plaintext(bytes) => Ok(Box::pin(Cursor::new(bytes.clone()))),
                CipherBehavior::AuthFailure => Err(DecryptError::AuthFailure),
                CipherBehavior::ParseFailure => {
                    Err(DecryptError::ParseFailure("envelope too short".into()))
                }
            }
        }
    }

    mock! {
        Downloader {}

        #[async_trait]
        impl AttachmentDownloadPort for Downloader {
            async fn download(
                &self,
                destination: &Path,
                url: &str,
                max_bytes: u64,
                options: &DownloadOptions,
            ) -> Result<(), DownloadError>;
        }
    }

    // ---- Helpers ---------------------------------------------------------------

    struct Harness {
        storage: Arc<FakeStorage>,
        cipher: Arc<FakeCipher>,
        _root: TempDir,
        cache_dir: PathBuf,
    }

    impl Harness {
        fn new(storage: FakeStorage, cipher: FakeCipher) -> Self {
            let root = tempfile::tempdir().unwrap();
            let cache_dir = root.path().join("cache");
            Self {
                storage: Arc::new(storage),
                cipher: Arc::new(cipher),
                _root: root,
                cache_dir,
            }
        }

        fn job(&self, downloader: Arc<dyn AttachmentDownloadPort>) -> AttachmentDownloadJob {
            let deps = AttachmentJobDeps {
                storage: self.storage.clone(),
                downloader,
                cipher: self.cipher.clone(),
            };
            AttachmentDownloadJob::new(
                AttachmentDownloadParams::new(ATTACHMENT, MESSAGE),
                deps,
                Arc::new(AttachmentJobSettings::new(&self.cache_dir)),
            )
        }

        fn leftover_temp_files(&self) -> usize {
            std::fs::read_dir(&self.cache_dir)
                .map(|d| d.count())
                .unwrap_or(0)
        }
    }

    fn encrypted_pointer() -> AttachmentRef {
        AttachmentRef {
            id: ATTACHMENT,
            message_id: MESSAGE,
            url: "https://files.example.org/files/5".to_string(),
            size: 5,
            key: Some("AAECAw==".to_string()),
            digest: Some(vec![0xde, 0xad, 0xbe, 0xef]),
            content_type: Some("image/png".to_string()),
        }
    }

    fn plaintext_pointer() -> AttachmentRef {
        AttachmentRef {
            key: None,
            digest: None,
            ..encrypted_pointer()
        }
    }

    // ---- Tests -----------------------------------------------------------------

    #[tokio::test]
    async fn test_encrypted_attachment_is_decrypted_and_stored() {
        let harness = Harness::new(
            FakeStorage::with_attachment(encrypted_pointer()),
            FakeCipher::new(CipherBehavior::Plaintext(b"hello".to_vec())),
        );
        let downloader = Arc::new(FakeDownloader::serving(b"ciphertext"));
        let job = harness.job(downloader.clone());

        let outcome = job.execute().await;

        assert!(outcome.is_success(), "{outcome:?}");
        assert_eq!(harness.storage.states(), vec![AttachmentState::Started]);
        let inserted = harness.storage.inserted.lock().unwrap().clone();
        assert_eq!(inserted, vec![(MESSAGE, ATTACHMENT, b"hello".to_vec())]);

        let calls = harness.cipher.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![(5, vec![0, 1, 2, 3], vec![0xde, 0xad, 0xbe, 0xef])]
        );
        assert_eq!(harness.leftover_temp_files(), 0);
    }

    #[tokio::test]
    async fn test_temp_file_lives_in_cache_dir() {
        let harness = Harness::new(
            FakeStorage::with_attachment(encrypted_pointer()),
            FakeCipher::new(CipherBehavior::Plaintext(b"hello".to_vec())),
        );
        let downloader = Arc::new(FakeDownloader::serving(b"ciphertext"));

        harness.job(downloader.clone()).execute().await;

        let destinations = downloader.destinations.lock().unwrap().clone();
        assert_eq!(destinations.len(), 1);
        assert!(destinations[0].starts_with(&harness.cache_dir));
        assert!(!destinations[0].exists());
    }

    #[tokio::test]
    async fn test_attachment_without_digest_is_stored_verbatim() {
        let harness = Harness::new(
            FakeStorage::with_attachment(plaintext_pointer()),
            FakeCipher::new(CipherBehavior::AuthFailure),
        );
        let downloader = Arc::new(FakeDownloader::serving(b"open group bytes"));

        let outcome = harness.job(downloader).execute().await;

        assert!(outcome.is_success(), "{outcome:?}");
        assert_eq!(harness.cipher.call_count(), 0);
        let inserted = harness.storage.inserted.lock().unwrap().clone();
        assert_eq!(inserted[0].2, b"open group bytes".to_vec());
        assert_eq!(harness.leftover_temp_files(), 0);
    }

    #[tokio::test]
    async fn test_key_without_digest_skips_decryption() {
        let pointer = AttachmentRef {
            digest: Some(Vec::new()),
            ..encrypted_pointer()
        };
        let harness = Harness::new(
            FakeStorage::with_attachment(pointer),
            FakeCipher::new(CipherBehavior::AuthFailure),
        );

        let outcome = harness
            .job(Arc::new(FakeDownloader::serving(b"raw")))
            .execute()
            .await;

        assert!(outcome.is_success());
        assert_eq!(harness.cipher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_attachment_fails_permanently_without_network() {
        let harness = Harness::new(
            FakeStorage::default(),
            FakeCipher::new(CipherBehavior::AuthFailure),
        );
        let mut downloader = MockDownloader::new();
        downloader.expect_download().never();

        let outcome = harness.job(Arc::new(downloader)).execute().await;

        assert!(matches!(
            outcome,
            JobOutcome::FailedPermanently(AttachmentJobError::NoAttachment)
        ));
        assert_eq!(harness.storage.states(), vec![AttachmentState::Failed]);
        assert!(!harness.cache_dir.exists(), "no temp file may be created");
    }

    #[tokio::test]
    async fn test_transport_failure_is_retryable_and_keeps_started() {
        let harness = Harness::new(
            FakeStorage::with_attachment(encrypted_pointer()),
            FakeCipher::new(CipherBehavior::Plaintext(b"hello".to_vec())),
        );
        let downloader = Arc::new(FakeDownloader::failing(|| {
            DownloadError::Transport("connection timed out".into())
        }));

        let outcome = harness.job(downloader).execute().await;

        assert!(matches!(
            outcome,
            JobOutcome::Failed(AttachmentJobError::Download(DownloadError::Transport(_)))
        ));
        assert_eq!(harness.storage.states(), vec![AttachmentState::Started]);
        assert!(harness.storage.inserted.lock().unwrap().is_empty());
        assert_eq!(harness.leftover_temp_files(), 0);
    }

    #[tokio::test]
    async fn test_oversized_download_is_retryable() {
        let harness = Harness::new(
            FakeStorage::with_attachment(encrypted_pointer()),
            FakeCipher::new(CipherBehavior::Plaintext(b"hello".to_vec())),
        );
        let downloader = Arc::new(FakeDownloader::failing(|| DownloadError::SizeExceeded {
            max_bytes: 10 * 1024 * 1024,
        }));

        let outcome = harness.job(downloader).execute().await;

        assert!(matches!(
            outcome,
            JobOutcome::Failed(AttachmentJobError::Download(
                DownloadError::SizeExceeded { .. }
            ))
        ));
        assert_eq!(harness.cipher.call_count(), 0);
        assert_eq!(harness.leftover_temp_files(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_response_fails_permanently() {
        let harness = Harness::new(
            FakeStorage::with_attachment(encrypted_pointer()),
            FakeCipher::new(CipherBehavior::Plaintext(b"hello".to_vec())),
        );
        let downloader = Arc::new(FakeDownloader::failing(|| {
            DownloadError::ParseFailure("Cannot GET /files/5".into())
        }));

        let outcome = harness.job(downloader).execute().await;

        assert!(matches!(outcome, JobOutcome::FailedPermanently(_)));
        assert_eq!(
            harness.storage.states(),
            vec![AttachmentState::Started, AttachmentState::Failed]
        );
        assert_eq!(harness.leftover_temp_files(), 0);
    }

    #[tokio::test]
    async fn test_authentication_failure_is_retryable() {
        let harness = Harness::new(
            FakeStorage::with_attachment(encrypted_pointer()),
            FakeCipher::new(CipherBehavior::AuthFailure),
        );

        let outcome = harness
            .job(Arc::new(FakeDownloader::serving(b"tampered")))
            .execute()
            .await;

        assert!(matches!(
            outcome,
            JobOutcome::Failed(AttachmentJobError::Decrypt(DecryptError::AuthFailure))
        ));
        assert_eq!(harness.storage.states(), vec![AttachmentState::Started]);
        assert!(harness.storage.inserted.lock().unwrap().is_empty());
        assert_eq!(harness.leftover_temp_files(), 0);
    }

    #[tokio::test]
    async fn test_malformed_envelope_fails_permanently() {
        let harness = Harness::new(
            FakeStorage::with_attachment(encrypted_pointer()),
            FakeCipher::new(CipherBehavior::ParseFailure),
        );

        let outcome = harness
            .job(Arc::new(FakeDownloader::serving(b"x")))
            .execute()
            .await;

        assert!(outcome.failure_class() == Some(courier_core::FailureClass::Permanent));
        assert_eq!(
            harness.storage.states(),
            vec![AttachmentState::Started, AttachmentState::Failed]
        );
    }

    #[tokio::test]
    async fn test_undecodable_key_is_retryable() {
        let pointer = AttachmentRef {
            key: Some("not base64!".to_string()),
            ..encrypted_pointer()
        };
        let harness = Harness::new(
            FakeStorage::with_attachment(pointer),
            FakeCipher::new(CipherBehavior::Plaintext(b"hello".to_vec())),
        );

        let outcome = harness
            .job(Arc::new(FakeDownloader::serving(b"ciphertext")))
            .execute()
            .await;

        assert!(matches!(
            outcome,
            JobOutcome::Failed(AttachmentJobError::Decrypt(DecryptError::InvalidKey(_)))
        ));
        assert_eq!(harness.cipher.call_count(), 0);
        assert_eq!(harness.leftover_temp_files(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_retryable() {
        let mut storage = FakeStorage::with_attachment(encrypted_pointer());
        storage.fail_insert = true;
        let harness = Harness::new(
            storage,
            FakeCipher::new(CipherBehavior::Plaintext(b"hello".to_vec())),
        );

        let outcome = harness
            .job(Arc::new(FakeDownloader::serving(b"ciphertext")))
            .execute()
            .await;

        assert!(matches!(
            outcome,
            JobOutcome::Failed(AttachmentJobError::Storage(_))
        ));
        assert_eq!(harness.storage.states(), vec![AttachmentState::Started]);
        assert_eq!(harness.leftover_temp_files(), 0);
    }

    #[tokio::test]
    async fn test_retries_exhausted_marks_failed() {
        let harness = Harness::new(
            FakeStorage::with_attachment(encrypted_pointer()),
            FakeCipher::new(CipherBehavior::AuthFailure),
        );
        let job = harness.job(Arc::new(FakeDownloader::serving(b"x")));

        job.on_retries_exhausted().await.unwrap();

        let states = harness.storage.states.lock().unwrap().clone();
        assert_eq!(states, vec![(AttachmentState::Failed, ATTACHMENT, MESSAGE)]);
    }

    #[tokio::test]
    async fn test_job_identity() {
        let harness = Harness::new(
            FakeStorage::default(),
            FakeCipher::new(CipherBehavior::AuthFailure),
        );
        let job = harness.job(Arc::new(FakeDownloader::serving(b"")));

        assert_eq!(job.factory_key(), "AttachmentDownloadJob");
        assert_eq!(job.max_failure_count(), 20);
        assert_eq!(job.describe(), "attachment 5 of message 10");

        let data = job.to_job_data().unwrap();
        let params = AttachmentDownloadParams::from_job_data(&data).unwrap();
        assert_eq!(params, AttachmentDownloadParams::new(ATTACHMENT, MESSAGE));
    }
}
