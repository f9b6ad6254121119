//! # Dependency Wiring
//!
//! Turns the raw [`AppConfig`] facts into concrete adapters. This is the only
//! place where defaults are applied to missing configuration values.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info_span};

use courier_app::{
    AttachmentDownloadJob, AttachmentDownloadJobFactory, AttachmentJobDeps, AttachmentJobSettings,
    JobReport, JobRunner, DEFAULT_MAX_ATTACHMENT_BYTES,
};
use courier_core::job::DEFAULT_MAX_FAILURE_COUNT;
use courier_core::ports::{DownloadOptions, ResponseFormat};
use courier_core::AppConfig;
use courier_infra::{
    init_db_pool, AesGcmAttachmentCipher, AttachmentRowMapper, DieselAttachmentRepository,
    DieselSqliteExecutor, HttpAttachmentDownloader,
};

/// Default pause between attempts, multiplied by the failure count.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

pub type AttachmentRepository =
    DieselAttachmentRepository<DieselSqliteExecutor, AttachmentRowMapper>;

/// Everything a CLI command needs, fully wired.
pub struct AppRuntime {
    pub repository: Arc<AttachmentRepository>,
    pub factory: AttachmentDownloadJobFactory,
    pub retry_backoff: Duration,
}

impl AppRuntime {
    /// Drive one job through a dedicated runner and wait for its report.
    pub async fn run_job(&self, job: AttachmentDownloadJob) -> Result<JobReport> {
        let (job_tx, job_rx) = mpsc::channel(1);
        let (report_tx, mut report_rx) = mpsc::channel(1);
        let runner = JobRunner::new(job_rx, self.retry_backoff).with_reports(report_tx);
        let handle = tokio::spawn(runner.run());

        job_tx
            .send(job)
            .await
            .map_err(|_| anyhow::anyhow!("job runner stopped before accepting the job"))?;
        drop(job_tx);

        let report = report_rx
            .recv()
            .await
            .context("job runner stopped without reporting")?;
        handle.await.context("job runner task failed")?;
        Ok(report)
    }
}

pub fn parse_response_format(value: &str) -> Result<ResponseFormat> {
    match value {
        "" | "raw" => Ok(ResponseFormat::Raw),
        "json_envelope" => Ok(ResponseFormat::JsonEnvelope),
        other => bail!("unknown download.response_format: {other:?}"),
    }
}

/// Resolve job settings, applying defaults for values that are 0 or empty.
pub fn resolve_job_settings(config: &AppConfig) -> Result<AttachmentJobSettings> {
    if config.cache_dir.as_os_str().is_empty() {
        bail!("storage.cache_dir is not configured");
    }

    let mut settings = AttachmentJobSettings::new(&config.cache_dir);
    settings.max_attachment_bytes = match config.max_attachment_bytes {
        0 => DEFAULT_MAX_ATTACHMENT_BYTES,
        bytes => bytes,
    };
    settings.max_failure_count = match config.max_failure_count {
        0 => DEFAULT_MAX_FAILURE_COUNT,
        count => count,
    };
    settings.download_options = DownloadOptions {
        response_format: parse_response_format(&config.response_format)?,
        timeout: match config.download_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        },
    };
    Ok(settings)
}

pub fn resolve_retry_backoff(config: &AppConfig) -> Duration {
    match config.retry_backoff_ms {
        0 => DEFAULT_RETRY_BACKOFF,
        ms => Duration::from_millis(ms),
    }
}

/// Open the database, build the adapters and the job factory.
pub fn wire_dependencies(config: &AppConfig) -> Result<AppRuntime> {
    let span = info_span!("bootstrap.wire_dependencies");
    let _enter = span.enter();

    let settings = resolve_job_settings(config)?;
    let database_url = database_url(&config.database_path)?;
    if config.parts_dir.as_os_str().is_empty() {
        bail!("storage.parts_dir is not configured");
    }

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }
    let pool = init_db_pool(database_url)
        .with_context(|| format!("Failed to open database {database_url}"))?;

    let repository = Arc::new(DieselAttachmentRepository::new(
        DieselSqliteExecutor::new(pool),
        AttachmentRowMapper,
        config.parts_dir.clone(),
    ));

    let deps = AttachmentJobDeps {
        storage: repository.clone(),
        downloader: Arc::new(HttpAttachmentDownloader::new()),
        cipher: Arc::new(AesGcmAttachmentCipher::new()),
    };

    debug!(
        database = %config.database_path.display(),
        cache_dir = %settings.cache_dir.display(),
        max_attachment_bytes = settings.max_attachment_bytes,
        max_failure_count = settings.max_failure_count,
        "Dependencies wired"
    );

    Ok(AppRuntime {
        repository,
        factory: AttachmentDownloadJobFactory::new(deps, settings),
        retry_backoff: resolve_retry_backoff(config),
    })
}

fn database_url(path: &Path) -> Result<&str> {
    if path.as_os_str().is_empty() {
        bail!("storage.database_path is not configured");
    }
    path.to_str()
        .with_context(|| format!("database path is not valid UTF-8: {}", path.display()))
}
