use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::{unique_violation, AppError};
use crate::reactions::repo_types::ItemType;
use crate::sheets::repo_types::{NewSheet, Sheet};

const SHEET_COLUMNS: &str =
    "id, owner_id, title, description, access_code, created_at, updated_at";

#[async_trait]
pub trait SheetRepo: Send + Sync {
    /// Inserts a sheet while holding the owner's quota.
    ///
    /// The quota check and the insert happen atomically: `QuotaExceeded` when
    /// the owner already has `limit` sheets, `CodeCollision` when the access
    /// code is taken.
    async fn insert_sheet(&self, new: NewSheet<'_>, limit: i64) -> Result<Sheet, AppError>;
    async fn find_sheet(&self, id: Uuid) -> Result<Option<Sheet>, AppError>;
    async fn find_sheet_by_code(&self, code: &str) -> Result<Option<Sheet>, AppError>;
    /// Newest first.
    async fn list_sheets_by_owner(&self, owner_id: Uuid) -> Result<Vec<Sheet>, AppError>;
    async fn count_sheets_by_owner(&self, owner_id: Uuid) -> Result<i64, AppError>;
    async fn update_sheet(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<Sheet, AppError>;
    /// Removes the sheet, its questions and every reaction targeting it.
    /// Returns false when nothing was deleted.
    async fn delete_sheet(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
impl SheetRepo for PgStore {
    async fn insert_sheet(&self, new: NewSheet<'_>, limit: i64) -> Result<Sheet, AppError> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent creates by the same owner.
        let owner: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(new.owner_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owner.is_none() {
            return Err(AppError::Unauthorized);
        }

        let (owned,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sheets WHERE owner_id = $1")
            .bind(new.owner_id)
            .fetch_one(&mut *tx)
            .await?;
        if owned >= limit {
            return Err(AppError::QuotaExceeded { limit });
        }

        let sheet = sqlx::query_as::<_, Sheet>(&format!(
            r#"
            INSERT INTO sheets (id, owner_id, title, description, access_code)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SHEET_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.owner_id)
        .bind(new.title)
        .bind(new.description)
        .bind(new.access_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e).as_deref() {
            Some("sheets_access_code_key") => AppError::CodeCollision,
            _ => e.into(),
        })?;

        tx.commit().await?;
        Ok(sheet)
    }

    async fn find_sheet(&self, id: Uuid) -> Result<Option<Sheet>, AppError> {
        let sheet = sqlx::query_as::<_, Sheet>(&format!(
            "SELECT {SHEET_COLUMNS} FROM sheets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sheet)
    }

    async fn find_sheet_by_code(&self, code: &str) -> Result<Option<Sheet>, AppError> {
        let sheet = sqlx::query_as::<_, Sheet>(&format!(
            "SELECT {SHEET_COLUMNS} FROM sheets WHERE access_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sheet)
    }

    async fn list_sheets_by_owner(&self, owner_id: Uuid) -> Result<Vec<Sheet>, AppError> {
        let rows = sqlx::query_as::<_, Sheet>(&format!(
            r#"
            SELECT {SHEET_COLUMNS}
            FROM sheets
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_sheets_by_owner(&self, owner_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sheets WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update_sheet(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<Sheet, AppError> {
        let sheet = sqlx::query_as::<_, Sheet>(&format!(
            r#"
            UPDATE sheets
               SET title = $2, description = $3, updated_at = now()
             WHERE id = $1
            RETURNING {SHEET_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;
        sheet.ok_or(AppError::NotFound)
    }

    async fn delete_sheet(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM reactions WHERE target_id = $1 AND item_type = $2")
            .bind(id)
            .bind(ItemType::Sheet)
            .execute(&mut *tx)
            .await?;

        // questions go with the sheet via ON DELETE CASCADE
        let deleted = sqlx::query("DELETE FROM sheets WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }
}
