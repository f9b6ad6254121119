pub mod attachment_row;
pub mod message_row;

pub use attachment_row::{AttachmentRow, NewAttachmentRow};
pub use message_row::NewMessageRow;
