//! Port interfaces for the application layer
//!
//! Ports define the contract between the download job and the infrastructure
//! that actually moves, decrypts and stores bytes. The job only ever talks to
//! these traits, which keeps its failure classification independent of any
//! concrete transport, cipher or database.

mod attachment_cipher;
mod attachment_download;
mod attachment_storage;

use std::pin::Pin;

use tokio::io::AsyncRead;

pub use attachment_cipher::AttachmentCipherPort;
pub use attachment_download::{AttachmentDownloadPort, DownloadOptions, ResponseFormat};
pub use attachment_storage::AttachmentStoragePort;

/// Attachment content handed from the decryption step to storage.
pub type AttachmentStream = Pin<Box<dyn AsyncRead + Send>>;
