use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "reaction_item_type", rename_all = "snake_case")]
pub enum ItemType {
    Sheet,
    ExamPaper,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sheet => "sheet",
            Self::ExamPaper => "exam_paper",
        }
    }
}

impl FromStr for ItemType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sheet" | "sheets" => Ok(Self::Sheet),
            "exam_paper" | "exam-paper" | "exam_papers" | "exam-papers" => Ok(Self::ExamPaper),
            _ => Err(AppError::validation("item type must be sheet or exam_paper")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "reaction_polarity", rename_all = "lowercase")]
pub enum Polarity {
    Like,
    Dislike,
}

/// A user's reaction on one item after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionState {
    Like,
    Dislike,
    None,
}

impl From<Option<Polarity>> for ReactionState {
    fn from(p: Option<Polarity>) -> Self {
        match p {
            Some(Polarity::Like) => Self::Like,
            Some(Polarity::Dislike) => Self::Dislike,
            None => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
}
