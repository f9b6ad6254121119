mod model;
mod state;

pub use model::AttachmentRef;
pub use state::{AttachmentState, ParseAttachmentStateError};
