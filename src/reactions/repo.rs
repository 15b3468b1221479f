use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::AppError;
use crate::reactions::repo_types::{ItemType, Polarity, ReactionCounts, ReactionState};

#[async_trait]
pub trait ReactionRepo: Send + Sync {
    /// Same polarity as the stored row removes it; anything else replaces
    /// it. Serialized per (user, target, item type).
    async fn toggle_reaction(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        item_type: ItemType,
        polarity: Polarity,
    ) -> Result<ReactionState, AppError>;
    async fn find_reaction(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        item_type: ItemType,
    ) -> Result<Option<Polarity>, AppError>;
    async fn reaction_counts(
        &self,
        target_id: Uuid,
        item_type: ItemType,
    ) -> Result<ReactionCounts, AppError>;
}

#[async_trait]
impl ReactionRepo for PgStore {
    async fn toggle_reaction(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        item_type: ItemType,
        polarity: Polarity,
    ) -> Result<ReactionState, AppError> {
        let mut tx = self.pool.begin().await?;

        // Row locks cannot cover a key with no row yet; lock the key itself.
        let key = format!("reaction:{user_id}:{target_id}:{}", item_type.as_str());
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(&key)
            .execute(&mut *tx)
            .await?;

        let current: Option<(Polarity,)> = sqlx::query_as(
            r#"
            SELECT polarity
              FROM reactions
             WHERE user_id = $1 AND target_id = $2 AND item_type = $3
            "#,
        )
        .bind(user_id)
        .bind(target_id)
        .bind(item_type)
        .fetch_optional(&mut *tx)
        .await?;

        let state = if current.map(|(p,)| p) == Some(polarity) {
            sqlx::query(
                "DELETE FROM reactions WHERE user_id = $1 AND target_id = $2 AND item_type = $3",
            )
            .bind(user_id)
            .bind(target_id)
            .bind(item_type)
            .execute(&mut *tx)
            .await?;
            ReactionState::None
        } else {
            sqlx::query(
                r#"
                INSERT INTO reactions (user_id, target_id, item_type, polarity)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, target_id, item_type)
                DO UPDATE SET polarity = EXCLUDED.polarity, created_at = now()
                "#,
            )
            .bind(user_id)
            .bind(target_id)
            .bind(item_type)
            .bind(polarity)
            .execute(&mut *tx)
            .await?;
            Some(polarity).into()
        };

        tx.commit().await?;
        Ok(state)
    }

    async fn find_reaction(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        item_type: ItemType,
    ) -> Result<Option<Polarity>, AppError> {
        let row: Option<(Polarity,)> = sqlx::query_as(
            r#"
            SELECT polarity
              FROM reactions
             WHERE user_id = $1 AND target_id = $2 AND item_type = $3
            "#,
        )
        .bind(user_id)
        .bind(target_id)
        .bind(item_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(p,)| p))
    }

    async fn reaction_counts(
        &self,
        target_id: Uuid,
        item_type: ItemType,
    ) -> Result<ReactionCounts, AppError> {
        let (likes, dislikes): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE polarity = 'like'),
                   COUNT(*) FILTER (WHERE polarity = 'dislike')
              FROM reactions
             WHERE target_id = $1 AND item_type = $2
            "#,
        )
        .bind(target_id)
        .bind(item_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(ReactionCounts { likes, dislikes })
    }
}
