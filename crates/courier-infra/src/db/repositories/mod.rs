mod attachment_repo;

pub use attachment_repo::DieselAttachmentRepository;
