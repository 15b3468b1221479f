use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Exam paper record in the database. The attachment itself lives in the
/// object store under `object_key`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExamPaper {
    pub id: Uuid,
    pub uploader_id: Uuid,
    pub subject: String,
    pub exam_type: String,
    pub slot: String,
    pub object_key: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewExamPaper<'a> {
    pub id: Uuid,
    pub uploader_id: Uuid,
    pub subject: &'a str,
    pub exam_type: &'a str,
    pub slot: &'a str,
    pub object_key: &'a str,
}
