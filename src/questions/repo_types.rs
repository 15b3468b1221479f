use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "difficulty", rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub sheet_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub practice_url: Option<String>,
    pub video_url: Option<String>,
    pub completed: bool,
    pub visit_count: i64,
    pub created_at: OffsetDateTime,
}

/// Validated question fields, used for both inserts and full updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFields {
    pub title: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub practice_url: Option<String>,
    pub video_url: Option<String>,
}

impl QuestionFields {
    pub fn from_question(q: &Question) -> Self {
        Self {
            title: q.title.clone(),
            description: q.description.clone(),
            difficulty: q.difficulty,
            practice_url: q.practice_url.clone(),
            video_url: q.video_url.clone(),
        }
    }
}
