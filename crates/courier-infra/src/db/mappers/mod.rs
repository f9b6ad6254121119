mod attachment_mapper;

pub use attachment_mapper::AttachmentRowMapper;
