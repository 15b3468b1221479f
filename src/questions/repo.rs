use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::AppError;
use crate::questions::repo_types::{Question, QuestionFields};

const QUESTION_COLUMNS: &str = "id, sheet_id, title, description, difficulty, practice_url, \
     video_url, completed, visit_count, created_at";

#[async_trait]
pub trait QuestionRepo: Send + Sync {
    async fn insert_question(
        &self,
        sheet_id: Uuid,
        fields: &QuestionFields,
    ) -> Result<Question, AppError>;
    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, AppError>;
    /// Oldest first.
    async fn list_questions(&self, sheet_id: Uuid) -> Result<Vec<Question>, AppError>;
    async fn update_question(
        &self,
        id: Uuid,
        fields: &QuestionFields,
    ) -> Result<Question, AppError>;
    async fn delete_question(&self, id: Uuid) -> Result<bool, AppError>;
    /// Flips the completion flag in place and returns the new row.
    async fn toggle_question(&self, id: Uuid) -> Result<Question, AppError>;
    async fn increment_visits(&self, id: Uuid) -> Result<Question, AppError>;
}

#[async_trait]
impl QuestionRepo for PgStore {
    async fn insert_question(
        &self,
        sheet_id: Uuid,
        fields: &QuestionFields,
    ) -> Result<Question, AppError> {
        let q = sqlx::query_as::<_, Question>(&format!(
            r#"
            INSERT INTO questions (id, sheet_id, title, description, difficulty, practice_url, video_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(sheet_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.difficulty)
        .bind(&fields.practice_url)
        .bind(&fields.video_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // sheet deleted between the permission check and the insert
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => AppError::NotFound,
            _ => e.into(),
        })?;
        Ok(q)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, AppError> {
        let q = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(q)
    }

    async fn list_questions(&self, sheet_id: Uuid) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, Question>(&format!(
            r#"
            SELECT {QUESTION_COLUMNS}
            FROM questions
            WHERE sheet_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(sheet_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_question(
        &self,
        id: Uuid,
        fields: &QuestionFields,
    ) -> Result<Question, AppError> {
        let q = sqlx::query_as::<_, Question>(&format!(
            r#"
            UPDATE questions
               SET title = $2, description = $3, difficulty = $4,
                   practice_url = $5, video_url = $6
             WHERE id = $1
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.difficulty)
        .bind(&fields.practice_url)
        .bind(&fields.video_url)
        .fetch_optional(&self.pool)
        .await?;
        q.ok_or(AppError::NotFound)
    }

    async fn delete_question(&self, id: Uuid) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn toggle_question(&self, id: Uuid) -> Result<Question, AppError> {
        let q = sqlx::query_as::<_, Question>(&format!(
            "UPDATE questions SET completed = NOT completed WHERE id = $1 RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        q.ok_or(AppError::NotFound)
    }

    async fn increment_visits(&self, id: Uuid) -> Result<Question, AppError> {
        let q = sqlx::query_as::<_, Question>(&format!(
            "UPDATE questions SET visit_count = visit_count + 1 WHERE id = $1 RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        q.ok_or(AppError::NotFound)
    }
}
