use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reactions::repo_types::{ItemType, Polarity, ReactionCounts, ReactionState};

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub polarity: Polarity,
}

#[derive(Debug, Serialize)]
pub struct ReactionSummary {
    pub item_type: ItemType,
    pub target_id: Uuid,
    pub likes: i64,
    pub dislikes: i64,
    pub mine: ReactionState,
}

#[derive(Debug, Serialize)]
pub struct SetReactionResponse {
    pub state: ReactionState,
    /// Absent when the post-write refresh failed; the write itself stood.
    pub counts: Option<ReactionCounts>,
}
