use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}
fn default_limit() -> i64 { 50 }

/// Text fields of the upload form, as collected from multipart.
#[derive(Debug, Default)]
pub struct ExamPaperForm {
    pub subject: Option<String>,
    pub exam_type: Option<String>,
    pub slot: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExamPaperView {
    pub id: Uuid,
    pub uploader_id: Uuid,
    pub subject: String,
    pub exam_type: String,
    pub slot: String,
    pub url: String,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: OffsetDateTime,
}
