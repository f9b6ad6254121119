pub mod db;
pub mod network;
pub mod security;

pub use db::executor::DieselSqliteExecutor;
pub use db::mappers::AttachmentRowMapper;
pub use db::pool::{init_db_pool, DbPool};
pub use db::repositories::DieselAttachmentRepository;
pub use network::HttpAttachmentDownloader;
pub use security::{AesGcmAttachmentCipher, SealedAttachment};
