use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Sheet record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sheet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub access_code: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Validated fields for a sheet insert.
#[derive(Debug, Clone)]
pub struct NewSheet<'a> {
    pub owner_id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub access_code: &'a str,
}
