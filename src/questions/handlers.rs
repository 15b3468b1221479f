use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::services::{AuthUser, MaybeAuthUser},
    error::AppError,
    questions::{
        dto::{QuestionListQuery, QuestionPatch, QuestionRequest, SheetQuestions, ToggleResponse},
        progress::Progress,
        repo_types::Question,
        services,
    },
    sheets::dto::CodeQuery,
    state::AppState,
};

pub fn question_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sheets/:id/questions",
            get(list_questions).post(add_question),
        )
        .route("/sheets/:id/progress", get(get_progress))
        .route(
            "/questions/:id",
            patch(update_question).delete(delete_question),
        )
        .route("/questions/:id/toggle", post(toggle_question))
        .route("/questions/:id/visit", post(visit_question))
}

#[instrument(skip(state, q))]
pub async fn list_questions(
    State(state): State<AppState>,
    MaybeAuthUser(actor): MaybeAuthUser,
    Path(sheet_id): Path<Uuid>,
    Query(q): Query<QuestionListQuery>,
) -> Result<Json<SheetQuestions>, AppError> {
    Ok(Json(
        services::list_questions(&*state.store, actor, sheet_id, q).await?,
    ))
}

#[instrument(skip(state, body))]
pub async fn add_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(sheet_id): Path<Uuid>,
    Json(body): Json<QuestionRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<Question>), AppError> {
    let question = services::add_question(&*state.store, user_id, sheet_id, body).await?;
    let location = format!("/api/v1/questions/{}", question.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(question)))
}

#[instrument(skip(state, q))]
pub async fn get_progress(
    State(state): State<AppState>,
    MaybeAuthUser(actor): MaybeAuthUser,
    Path(sheet_id): Path<Uuid>,
    Query(q): Query<CodeQuery>,
) -> Result<Json<Progress>, AppError> {
    Ok(Json(
        services::sheet_progress(&*state.store, actor, sheet_id, q.code.as_deref()).await?,
    ))
}

#[instrument(skip(state, body))]
pub async fn update_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<QuestionPatch>,
) -> Result<Json<Question>, AppError> {
    Ok(Json(
        services::update_question(&*state.store, user_id, id, body).await?,
    ))
}

#[instrument(skip(state))]
pub async fn delete_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete_question(&*state.store, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, q))]
pub async fn toggle_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<CodeQuery>,
) -> Result<Json<ToggleResponse>, AppError> {
    Ok(Json(
        services::toggle_completion(&*state.store, user_id, id, q.code.as_deref()).await?,
    ))
}

#[instrument(skip(state, q))]
pub async fn visit_question(
    State(state): State<AppState>,
    MaybeAuthUser(actor): MaybeAuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<CodeQuery>,
) -> Result<Json<Question>, AppError> {
    Ok(Json(
        services::record_visit(&*state.store, actor, id, q.code.as_deref()).await?,
    ))
}
