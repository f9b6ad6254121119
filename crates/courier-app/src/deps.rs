//! # Job Dependencies
//!
//! Parameter grouping for the collaborators an attachment download job
//! talks to. Not a builder: no build steps, no defaults, no hidden logic.

use std::sync::Arc;

use courier_core::ports::{AttachmentCipherPort, AttachmentDownloadPort, AttachmentStoragePort};

/// All dependencies are required - no defaults, no optional fields.
#[derive(Clone)]
pub struct AttachmentJobDeps {
    pub storage: Arc<dyn AttachmentStoragePort>,
    pub downloader: Arc<dyn AttachmentDownloadPort>,
    pub cipher: Arc<dyn AttachmentCipherPort>,
}
