use crate::db::schema::message;
use diesel::prelude::*;

#[derive(Debug, Insertable)]
#[diesel(table_name = message)]
pub struct NewMessageRow {
    pub id: i64,
    pub received_at_ms: i64,
}
