use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::questions::{
    dto::{QuestionListQuery, QuestionPatch, QuestionRequest, SheetQuestions, ToggleResponse},
    progress::{self, Progress},
    repo::QuestionRepo,
    repo_types::{Difficulty, Question, QuestionFields},
};
use crate::sheets::{dto::SheetDetails, permissions, repo::SheetRepo, repo_types::Sheet, services::load_readable};
use crate::validation::{optional_text, optional_url, required_text, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN};

fn parse_difficulty(raw: &str) -> Result<Difficulty, AppError> {
    raw.parse()
        .map_err(|_| AppError::validation("difficulty must be one of easy, medium, hard"))
}

fn validate_new(req: &QuestionRequest) -> Result<QuestionFields, AppError> {
    Ok(QuestionFields {
        title: required_text("title", &req.title, MAX_TITLE_LEN)?,
        description: optional_text("description", req.description.as_deref(), MAX_DESCRIPTION_LEN)?,
        difficulty: parse_difficulty(&req.difficulty)?,
        practice_url: optional_url("practice_url", req.practice_url.as_deref())?,
        video_url: optional_url("video_url", req.video_url.as_deref())?,
    })
}

fn apply_patch(mut fields: QuestionFields, patch: &QuestionPatch) -> Result<QuestionFields, AppError> {
    if let Some(title) = patch.title.as_deref() {
        fields.title = required_text("title", title, MAX_TITLE_LEN)?;
    }
    if let Some(description) = patch.description.as_deref() {
        fields.description = optional_text("description", Some(description), MAX_DESCRIPTION_LEN)?;
    }
    if let Some(difficulty) = patch.difficulty.as_deref() {
        fields.difficulty = parse_difficulty(difficulty)?;
    }
    if let Some(url) = patch.practice_url.as_deref() {
        fields.practice_url = optional_url("practice_url", Some(url))?;
    }
    if let Some(url) = patch.video_url.as_deref() {
        fields.video_url = optional_url("video_url", Some(url))?;
    }
    Ok(fields)
}

/// Listing filter. Stats are never computed over the filtered list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QuestionFilter {
    pub difficulty: Option<Difficulty>,
    pub completed: Option<bool>,
    pub search: Option<String>,
}

impl QuestionFilter {
    pub fn from_query(q: &QuestionListQuery) -> Result<Self, AppError> {
        let difficulty = match q.difficulty.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(d) => Some(parse_difficulty(d)?),
        };
        let completed = match q.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some("completed") => Some(true),
            Some("pending") => Some(false),
            Some(_) => return Err(AppError::validation("status must be one of all, completed, pending")),
        };
        let search = q
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        Ok(Self { difficulty, completed, search })
    }

    pub fn matches(&self, q: &Question) -> bool {
        self.difficulty.map_or(true, |d| q.difficulty == d)
            && self.completed.map_or(true, |c| q.completed == c)
            && self
                .search
                .as_deref()
                .map_or(true, |s| q.title.to_lowercase().contains(s))
    }
}

async fn owned_sheet<S: SheetRepo + ?Sized>(store: &S, actor: Uuid, sheet_id: Uuid) -> Result<Sheet, AppError> {
    let sheet = store.find_sheet(sheet_id).await?.ok_or(AppError::NotFound)?;
    permissions::ensure_owner(actor, &sheet)?;
    Ok(sheet)
}

/// Question plus its sheet; both must exist.
async fn question_with_sheet<S>(store: &S, question_id: Uuid) -> Result<(Question, Sheet), AppError>
where
    S: SheetRepo + QuestionRepo + ?Sized,
{
    let question = store.find_question(question_id).await?.ok_or(AppError::NotFound)?;
    let sheet = store.find_sheet(question.sheet_id).await?.ok_or(AppError::NotFound)?;
    Ok((question, sheet))
}

#[instrument(skip(store, req))]
pub async fn add_question<S>(
    store: &S,
    actor: Uuid,
    sheet_id: Uuid,
    req: QuestionRequest,
) -> Result<Question, AppError>
where
    S: SheetRepo + QuestionRepo + ?Sized,
{
    let fields = validate_new(&req)?;
    owned_sheet(store, actor, sheet_id).await?;
    let question = store.insert_question(sheet_id, &fields).await?;
    info!(question_id = %question.id, %sheet_id, difficulty = %question.difficulty, "question added");
    Ok(question)
}

#[instrument(skip(store, patch))]
pub async fn update_question<S>(
    store: &S,
    actor: Uuid,
    question_id: Uuid,
    patch: QuestionPatch,
) -> Result<Question, AppError>
where
    S: SheetRepo + QuestionRepo + ?Sized,
{
    let (question, sheet) = question_with_sheet(store, question_id).await?;
    permissions::ensure_owner(actor, &sheet)?;
    let fields = apply_patch(QuestionFields::from_question(&question), &patch)?;
    let updated = store.update_question(question_id, &fields).await?;
    info!(%question_id, "question updated");
    Ok(updated)
}

#[instrument(skip(store))]
pub async fn delete_question<S>(store: &S, actor: Uuid, question_id: Uuid) -> Result<(), AppError>
where
    S: SheetRepo + QuestionRepo + ?Sized,
{
    let (_, sheet) = question_with_sheet(store, question_id).await?;
    permissions::ensure_owner(actor, &sheet)?;
    if !store.delete_question(question_id).await? {
        return Err(AppError::NotFound);
    }
    info!(%question_id, sheet_id = %sheet.id, "question deleted");
    Ok(())
}

/// Flips completion. Open to any authenticated viewer, not only the owner.
#[instrument(skip(store, code))]
pub async fn toggle_completion<S>(
    store: &S,
    actor: Uuid,
    question_id: Uuid,
    code: Option<&str>,
) -> Result<ToggleResponse, AppError>
where
    S: SheetRepo + QuestionRepo + ?Sized,
{
    let (_, sheet) = question_with_sheet(store, question_id).await?;
    permissions::ensure_participant(actor, code, &sheet)?;
    let question = store.toggle_question(question_id).await?;
    debug!(%question_id, completed = question.completed, "completion toggled");
    let progress = sheet_progress_unchecked(store, sheet.id).await?;
    Ok(ToggleResponse { question, progress })
}

#[instrument(skip(store, code))]
pub async fn record_visit<S>(
    store: &S,
    actor: Option<Uuid>,
    question_id: Uuid,
    code: Option<&str>,
) -> Result<Question, AppError>
where
    S: SheetRepo + QuestionRepo + ?Sized,
{
    let (_, sheet) = question_with_sheet(store, question_id).await?;
    permissions::ensure_reader(actor, code, &sheet)?;
    store.increment_visits(question_id).await
}

async fn sheet_progress_unchecked<S: QuestionRepo + ?Sized>(store: &S, sheet_id: Uuid) -> Result<Progress, AppError> {
    let questions = store.list_questions(sheet_id).await?;
    Ok(progress::summarize(&questions))
}

pub async fn sheet_progress<S>(
    store: &S,
    actor: Option<Uuid>,
    sheet_id: Uuid,
    code: Option<&str>,
) -> Result<Progress, AppError>
where
    S: SheetRepo + QuestionRepo + ?Sized,
{
    load_readable(store, actor, sheet_id, code).await?;
    sheet_progress_unchecked(store, sheet_id).await
}

pub async fn list_questions<S>(
    store: &S,
    actor: Option<Uuid>,
    sheet_id: Uuid,
    query: QuestionListQuery,
) -> Result<SheetQuestions, AppError>
where
    S: SheetRepo + QuestionRepo + ?Sized,
{
    let filter = QuestionFilter::from_query(&query)?;
    let (sheet, access) = load_readable(store, actor, sheet_id, query.code.as_deref()).await?;
    let all = store.list_questions(sheet_id).await?;
    let progress = progress::summarize(&all);
    let questions = all.into_iter().filter(|q| filter.matches(q)).collect();
    Ok(SheetQuestions {
        sheet: SheetDetails::new(sheet, access),
        questions,
        progress,
    })
}
