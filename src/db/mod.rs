use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::repo::UserRepo;
use crate::config::AppConfig;
use crate::exam_papers::repo::ExamPaperRepo;
use crate::questions::repo::QuestionRepo;
use crate::reactions::repo::ReactionRepo;
use crate::sheets::repo::SheetRepo;

#[cfg(test)]
pub mod memory;

/// Everything the services need from durable storage.
pub trait Store: UserRepo + SheetRepo + QuestionRepo + ReactionRepo + ExamPaperRepo {}

impl<T> Store for T where T: UserRepo + SheetRepo + QuestionRepo + ReactionRepo + ExamPaperRepo {}

/// Postgres-backed store. Repository impls live next to each feature.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) {
        if let Err(e) = sqlx::migrate!("./migrations").run(&self.pool).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }
    }
}
