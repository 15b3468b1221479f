use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::AppError;
use crate::exam_papers::repo_types::{ExamPaper, NewExamPaper};

#[async_trait]
pub trait ExamPaperRepo: Send + Sync {
    async fn insert_exam_paper(&self, new: NewExamPaper<'_>) -> Result<ExamPaper, AppError>;
    async fn find_exam_paper(&self, id: Uuid) -> Result<Option<ExamPaper>, AppError>;
    /// Case-insensitive substring match on subject or exam type, newest first.
    async fn search_exam_papers(&self, query: &str, limit: i64) -> Result<Vec<ExamPaper>, AppError>;
}

/// Escapes LIKE wildcards so user input matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl ExamPaperRepo for PgStore {
    async fn insert_exam_paper(&self, new: NewExamPaper<'_>) -> Result<ExamPaper, AppError> {
        let paper = sqlx::query_as::<_, ExamPaper>(
            r#"
            INSERT INTO exam_papers (id, uploader_id, subject, exam_type, slot, object_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, uploader_id, subject, exam_type, slot, object_key, created_at
            "#,
        )
        .bind(new.id)
        .bind(new.uploader_id)
        .bind(new.subject)
        .bind(new.exam_type)
        .bind(new.slot)
        .bind(new.object_key)
        .fetch_one(&self.pool)
        .await?;
        Ok(paper)
    }

    async fn find_exam_paper(&self, id: Uuid) -> Result<Option<ExamPaper>, AppError> {
        let paper = sqlx::query_as::<_, ExamPaper>(
            r#"
            SELECT id, uploader_id, subject, exam_type, slot, object_key, created_at
              FROM exam_papers
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(paper)
    }

    async fn search_exam_papers(&self, query: &str, limit: i64) -> Result<Vec<ExamPaper>, AppError> {
        let rows = sqlx::query_as::<_, ExamPaper>(
            r#"
            SELECT id, uploader_id, subject, exam_type, slot, object_key, created_at
              FROM exam_papers
             WHERE subject ILIKE $1 OR exam_type ILIKE $1
             ORDER BY created_at DESC
             LIMIT $2
            "#,
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
