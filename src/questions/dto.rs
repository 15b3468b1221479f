use serde::{Deserialize, Serialize};

use crate::questions::{progress::Progress, repo_types::Question};
use crate::sheets::dto::SheetDetails;

/// Body for adding a question. Difficulty stays a string so a bad value
/// is reported as a validation error rather than a decode failure.
#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub title: String,
    pub description: Option<String>,
    pub difficulty: String,
    pub practice_url: Option<String>,
    pub video_url: Option<String>,
}

/// Partial edit; absent fields keep their value, empty strings clear
/// optional ones.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub practice_url: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuestionListQuery {
    pub code: Option<String>,
    pub difficulty: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SheetQuestions {
    pub sheet: SheetDetails,
    pub questions: Vec<Question>,
    pub progress: Progress,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub question: Question,
    pub progress: Progress,
}
