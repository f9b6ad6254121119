//! Command line surface.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use courier_app::{JobReport, JobStatus};
use courier_core::{AppConfig, AttachmentId, AttachmentRef, MessageId};

use crate::bootstrap::{wire_dependencies, AppRuntime};

#[derive(Debug, Parser)]
#[command(name = "courier", version, about = "Fetch and decrypt message attachments")]
pub struct Cli {
    /// TOML configuration file; defaults to the platform data directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record an attachment pointer received with a message
    Register {
        #[arg(long)]
        message_id: i64,
        #[arg(long)]
        attachment_id: i64,
        #[arg(long)]
        url: String,
        /// Plaintext size in bytes, 0 when unknown
        #[arg(long, default_value_t = 0)]
        size: u64,
        /// Base64 encoded attachment key
        #[arg(long)]
        key: Option<String>,
        /// Hex encoded digest of the encrypted blob
        #[arg(long, value_name = "HEX")]
        digest: Option<String>,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Download an attachment, retrying until it succeeds or gives up
    Fetch {
        #[arg(long)]
        attachment_id: i64,
        #[arg(long)]
        message_id: i64,
    },
}

pub async fn run(command: Commands, config: &AppConfig) -> Result<ExitCode> {
    let runtime = wire_dependencies(config)?;

    match command {
        Commands::Register {
            message_id,
            attachment_id,
            url,
            size,
            key,
            digest,
            content_type,
        } => {
            let digest = digest
                .map(|hex_digest| hex::decode(hex_digest.trim()))
                .transpose()
                .context("--digest must be hex encoded")?;
            let pointer = AttachmentRef {
                id: AttachmentId::new(attachment_id),
                message_id: MessageId::new(message_id),
                url,
                size,
                key,
                digest,
                content_type,
            };
            register(&runtime, &pointer)?;
            println!("registered attachment {attachment_id} of message {message_id}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fetch {
            attachment_id,
            message_id,
        } => {
            let report = fetch(
                &runtime,
                AttachmentId::new(attachment_id),
                MessageId::new(message_id),
            )
            .await?;
            println!("{}", format_report(&report));
            Ok(if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

pub fn register(runtime: &AppRuntime, pointer: &AttachmentRef) -> Result<()> {
    runtime.repository.insert_message(pointer.message_id)?;
    runtime.repository.insert_attachment_pointer(pointer)?;
    info!(
        attachment_id = %pointer.id,
        message_id = %pointer.message_id,
        encrypted = pointer.is_encrypted(),
        "Attachment pointer registered"
    );
    Ok(())
}

pub async fn fetch(
    runtime: &AppRuntime,
    attachment_id: AttachmentId,
    message_id: MessageId,
) -> Result<JobReport> {
    let job = runtime.factory.create(attachment_id, message_id);
    runtime.run_job(job).await
}

pub fn format_report(report: &JobReport) -> String {
    match &report.status {
        JobStatus::Succeeded => format!(
            "{}: downloaded after {} attempt(s)",
            report.job, report.attempts
        ),
        JobStatus::FailedPermanently { error } => {
            format!("{}: failed permanently: {error}", report.job)
        }
        JobStatus::RetriesExhausted { error } => format!(
            "{}: gave up after {} attempt(s): {error}",
            report.job, report.attempts
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::AttachmentState;
    use mockito::Server;

    #[test]
    fn test_register_arguments_parse() {
        let cli = Cli::try_parse_from([
            "courier",
            "--config",
            "/etc/courier.toml",
            "register",
            "--message-id",
            "10",
            "--attachment-id",
            "5",
            "--url",
            "https://files.example.org/files/5",
            "--size",
            "1024",
            "--digest",
            "deadbeef",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/courier.toml")));
        match cli.command {
            Commands::Register {
                message_id,
                attachment_id,
                size,
                key,
                digest,
                ..
            } => {
                assert_eq!((message_id, attachment_id, size), (10, 5, 1024));
                assert!(key.is_none());
                assert_eq!(digest.as_deref(), Some("deadbeef"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_fetch_requires_both_ids() {
        assert!(Cli::try_parse_from(["courier", "fetch", "--attachment-id", "5"]).is_err());
    }

    #[test]
    fn test_report_formatting() {
        let report = JobReport {
            job: "attachment 5 of message 10".to_string(),
            factory_key: "AttachmentDownloadJob",
            attempts: 3,
            status: JobStatus::RetriesExhausted {
                error: "download failed: transport error: timeout".to_string(),
            },
        };

        assert_eq!(
            format_report(&report),
            "attachment 5 of message 10: gave up after 3 attempt(s): download failed: transport error: timeout"
        );
    }

    #[tokio::test]
    async fn test_register_then_fetch_plaintext_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::with_base_dir(dir.path());
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/files/5")
            .with_status(200)
            .with_body("open group attachment")
            .create_async()
            .await;

        let code = run(
            Commands::Register {
                message_id: 10,
                attachment_id: 5,
                url: format!("{}/files/5", server.url()),
                size: 0,
                key: None,
                digest: None,
                content_type: None,
            },
            &config,
        )
        .await
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let runtime = wire_dependencies(&config).unwrap();
        let report = fetch(&runtime, AttachmentId::new(5), MessageId::new(10))
            .await
            .unwrap();

        assert!(report.is_success(), "{report:?}");
        assert_eq!(
            runtime
                .repository
                .get_attachment_state(AttachmentId::new(5))
                .unwrap(),
            Some(AttachmentState::Done)
        );
    }

    #[tokio::test]
    async fn test_fetch_of_unknown_attachment_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::with_base_dir(dir.path());

        let code = run(
            Commands::Fetch {
                attachment_id: 7,
                message_id: 10,
            },
            &config,
        )
        .await
        .unwrap();

        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn test_invalid_digest_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::with_base_dir(dir.path());

        let result = run(
            Commands::Register {
                message_id: 10,
                attachment_id: 5,
                url: "https://files.example.org/files/5".to_string(),
                size: 0,
                key: Some("a2V5".to_string()),
                digest: Some("not hex".to_string()),
                content_type: None,
            },
            &config,
        )
        .await;

        assert!(result.is_err());
    }
}
