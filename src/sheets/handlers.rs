use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::services::{AuthUser, MaybeAuthUser},
    error::AppError,
    sheets::{
        code,
        dto::{
            CodePreview, CodeQuery, CreateSheetRequest, PublicSheet, QuotaResponse, SheetDetails,
            SheetSummary, UpdateSheetRequest,
        },
        services,
    },
    state::AppState,
};

pub fn sheet_routes() -> Router<AppState> {
    Router::new()
        .route("/sheets", get(list_sheets).post(create_sheet))
        .route("/sheets/quota", get(get_quota))
        .route("/sheets/code-preview", get(code_preview))
        .route("/sheets/by-code/:code", get(resolve_code))
        .route(
            "/sheets/:id",
            get(get_sheet).patch(update_sheet).delete(delete_sheet),
        )
}

#[instrument(skip(state))]
pub async fn list_sheets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<SheetSummary>>, AppError> {
    Ok(Json(services::list_owned(&*state.store, user_id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_sheet(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateSheetRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<SheetSummary>), AppError> {
    let sheet = services::create_sheet(
        &*state.store,
        user_id,
        body,
        state.config.code_retry_attempts,
    )
    .await?;
    let location = format!("/api/v1/sheets/{}", sheet.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(sheet.into()),
    ))
}

#[instrument(skip(state))]
pub async fn get_quota(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<QuotaResponse>, AppError> {
    Ok(Json(services::quota(&*state.store, user_id).await?))
}

/// A candidate code for the create form. Uniqueness is only settled on insert.
pub async fn code_preview() -> Json<CodePreview> {
    Json(CodePreview {
        code: code::generate(),
    })
}

#[instrument(skip(state))]
pub async fn resolve_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<PublicSheet>, AppError> {
    Ok(Json(services::resolve_by_code(&*state.store, &code).await?))
}

#[instrument(skip(state, q))]
pub async fn get_sheet(
    State(state): State<AppState>,
    MaybeAuthUser(actor): MaybeAuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<CodeQuery>,
) -> Result<Json<SheetDetails>, AppError> {
    Ok(Json(
        services::get_sheet(&*state.store, actor, id, q.code.as_deref()).await?,
    ))
}

#[instrument(skip(state, body))]
pub async fn update_sheet(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateSheetRequest>,
) -> Result<Json<SheetDetails>, AppError> {
    Ok(Json(
        services::update_sheet(&*state.store, user_id, id, body).await?,
    ))
}

#[instrument(skip(state))]
pub async fn delete_sheet(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete_sheet(&*state.store, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
