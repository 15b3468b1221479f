use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::services::AuthUser,
    error::AppError,
    exam_papers::{
        dto::{ExamPaperForm, ExamPaperView, SearchQuery},
        services::{self, UploadItem, MAX_UPLOAD_BYTES},
    },
    state::AppState,
};

pub fn exam_paper_routes() -> Router<AppState> {
    Router::new()
        .route("/exam-papers", get(search).post(upload))
        // leaves headroom for the text fields around the file
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<ExamPaperView>>, AppError> {
    Ok(Json(
        services::search_exam_papers(&*state.store, &*state.storage, &q.q, q.limit).await?,
    ))
}

/// POST /exam-papers (multipart): subject, exam_type, slot, file
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<ExamPaperView>), AppError> {
    let mut form = ExamPaperForm::default();
    let mut file = None;

    loop {
        let field = match mp.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "malformed multipart body");
                return Err(AppError::validation("malformed multipart body"));
            }
        };
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::validation("file exceeds 10 MB"))?;
                file = Some(UploadItem { body, content_type });
            }
            Some("subject") => form.subject = Some(field_text(field, "subject").await?),
            Some("exam_type") => form.exam_type = Some(field_text(field, "exam_type").await?),
            Some("slot") => form.slot = Some(field_text(field, "slot").await?),
            _ => {}
        }
    }

    let paper =
        services::upload_exam_paper(&*state.store, &*state.storage, user_id, form, file).await?;
    Ok((StatusCode::CREATED, Json(paper)))
}

async fn field_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|_| AppError::validation(format!("{name} is not valid text")))
}
