use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::services::{AuthUser, MaybeAuthUser},
    error::AppError,
    reactions::{
        dto::{ReactionRequest, ReactionSummary, SetReactionResponse},
        repo_types::ItemType,
        services,
    },
    sheets::dto::CodeQuery,
    state::AppState,
};

pub fn reaction_routes() -> Router<AppState> {
    Router::new().route(
        "/reactions/:item_type/:target_id",
        get(get_reactions).post(post_reaction),
    )
}

#[instrument(skip(state, q))]
pub async fn get_reactions(
    State(state): State<AppState>,
    MaybeAuthUser(actor): MaybeAuthUser,
    Path((item_type, target_id)): Path<(String, Uuid)>,
    Query(q): Query<CodeQuery>,
) -> Result<Json<ReactionSummary>, AppError> {
    let item_type: ItemType = item_type.parse()?;
    Ok(Json(
        services::reaction_summary(&*state.store, actor, item_type, target_id, q.code.as_deref())
            .await?,
    ))
}

#[instrument(skip(state, q, body))]
pub async fn post_reaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((item_type, target_id)): Path<(String, Uuid)>,
    Query(q): Query<CodeQuery>,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<SetReactionResponse>, AppError> {
    let item_type: ItemType = item_type.parse()?;
    Ok(Json(
        services::set_reaction(
            &*state.store,
            user_id,
            item_type,
            target_id,
            body.polarity,
            q.code.as_deref(),
        )
        .await?,
    ))
}
