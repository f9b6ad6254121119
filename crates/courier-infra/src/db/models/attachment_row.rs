use crate::db::schema::attachment;
use diesel::prelude::*;

#[derive(Debug, Queryable)]
#[diesel(table_name = attachment)]
pub struct AttachmentRow {
    pub id: i64,
    pub message_id: i64,
    pub url: String,
    pub size_bytes: i64,
    pub encryption_key: Option<String>,
    pub digest: Option<Vec<u8>>,
    pub content_type: Option<String>,
    pub state: String,
    pub part_path: Option<String>,
    pub stored_bytes: Option<i64>,
    pub updated_at_ms: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = attachment)]
pub struct NewAttachmentRow {
    pub id: i64,
    pub message_id: i64,
    pub url: String,
    pub size_bytes: i64,
    pub encryption_key: Option<String>,
    pub digest: Option<Vec<u8>>,
    pub content_type: Option<String>,
    pub state: String,
    pub updated_at_ms: i64,
}
