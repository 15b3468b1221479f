use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::exam_papers::repo::ExamPaperRepo;
use crate::reactions::{
    dto::{ReactionSummary, SetReactionResponse},
    repo::ReactionRepo,
    repo_types::{ItemType, Polarity, ReactionState},
};
use crate::sheets::{permissions, repo::SheetRepo};

/// Checks the caller may see the target.
///
/// Sheets follow the owner/code rule; exam papers are public.
async fn ensure_target_visible<S>(
    store: &S,
    actor: Option<Uuid>,
    item_type: ItemType,
    target_id: Uuid,
    code: Option<&str>,
    mutating: bool,
) -> Result<(), AppError>
where
    S: SheetRepo + ExamPaperRepo + ?Sized,
{
    match item_type {
        ItemType::Sheet => {
            let sheet = store.find_sheet(target_id).await?.ok_or(AppError::NotFound)?;
            match (mutating, actor) {
                (true, Some(actor)) => permissions::ensure_participant(actor, code, &sheet).map(|_| ()),
                (true, None) => Err(AppError::Unauthorized),
                (false, _) => permissions::ensure_reader(actor, code, &sheet).map(|_| ()),
            }
        }
        ItemType::ExamPaper => {
            store
                .find_exam_paper(target_id)
                .await?
                .ok_or(AppError::NotFound)?;
            Ok(())
        }
    }
}

#[instrument(skip(store, code))]
pub async fn set_reaction<S>(
    store: &S,
    actor: Uuid,
    item_type: ItemType,
    target_id: Uuid,
    polarity: Polarity,
    code: Option<&str>,
) -> Result<SetReactionResponse, AppError>
where
    S: SheetRepo + ExamPaperRepo + ReactionRepo + ?Sized,
{
    ensure_target_visible(store, Some(actor), item_type, target_id, code, true).await?;
    let state = store
        .toggle_reaction(actor, target_id, item_type, polarity)
        .await?;
    info!(%target_id, item_type = item_type.as_str(), ?state, "reaction set");

    // The write already happened; a failed refresh must not undo that.
    let counts = match store.reaction_counts(target_id, item_type).await {
        Ok(c) => Some(c),
        Err(e) => {
            warn!(error = %e, %target_id, "reaction count refresh failed");
            None
        }
    };
    Ok(SetReactionResponse { state, counts })
}

pub async fn reaction_summary<S>(
    store: &S,
    actor: Option<Uuid>,
    item_type: ItemType,
    target_id: Uuid,
    code: Option<&str>,
) -> Result<ReactionSummary, AppError>
where
    S: SheetRepo + ExamPaperRepo + ReactionRepo + ?Sized,
{
    ensure_target_visible(store, actor, item_type, target_id, code, false).await?;
    let counts = store.reaction_counts(target_id, item_type).await?;
    let mine = match actor {
        Some(user) => store.find_reaction(user, target_id, item_type).await?.into(),
        None => ReactionState::None,
    };
    Ok(ReactionSummary {
        item_type,
        target_id,
        likes: counts.likes,
        dislikes: counts.dislikes,
        mine,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::sheets::{dto::CreateSheetRequest, services as sheets};

    async fn shared_sheet(store: &MemoryStore, owner: Uuid) -> Uuid {
        sheets::create_sheet(
            store,
            owner,
            CreateSheetRequest {
                title: "Graphs".into(),
                description: None,
                code: Some("GRAPH1".into()),
            },
            3,
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn same_polarity_toggles_off_and_back_on() {
        let store = MemoryStore::new();
        let owner = store.seed_user("Owner");
        let viewer = store.seed_user("Viewer");
        let sheet = shared_sheet(&store, owner).await;

        let like = || set_reaction(&store, viewer, ItemType::Sheet, sheet, Polarity::Like, Some("GRAPH1"));
        assert_eq!(like().await.unwrap().state, ReactionState::Like);
        assert_eq!(like().await.unwrap().state, ReactionState::None);
        let third = like().await.unwrap();
        assert_eq!(third.state, ReactionState::Like);
        assert_eq!(third.counts.unwrap().likes, 1);
    }

    #[tokio::test]
    async fn opposite_polarity_replaces_without_double_counting() {
        let store = MemoryStore::new();
        let owner = store.seed_user("Owner");
        let viewer = store.seed_user("Viewer");
        let sheet = shared_sheet(&store, owner).await;

        set_reaction(&store, viewer, ItemType::Sheet, sheet, Polarity::Like, Some("GRAPH1"))
            .await
            .unwrap();
        let res = set_reaction(&store, viewer, ItemType::Sheet, sheet, Polarity::Dislike, Some("GRAPH1"))
            .await
            .unwrap();
        assert_eq!(res.state, ReactionState::Dislike);
        let counts = res.counts.unwrap();
        assert_eq!((counts.likes, counts.dislikes), (0, 1));

        set_reaction(&store, owner, ItemType::Sheet, sheet, Polarity::Like, None)
            .await
            .unwrap();
        let summary = reaction_summary(&store, Some(viewer), ItemType::Sheet, sheet, Some("GRAPH1"))
            .await
            .unwrap();
        assert_eq!((summary.likes, summary.dislikes), (1, 1));
        assert_eq!(summary.mine, ReactionState::Dislike);
    }

    #[tokio::test]
    async fn reacting_to_a_sheet_needs_view_access() {
        let store = MemoryStore::new();
        let owner = store.seed_user("Owner");
        let stranger = store.seed_user("Stranger");
        let sheet = shared_sheet(&store, owner).await;

        assert!(matches!(
            set_reaction(&store, stranger, ItemType::Sheet, sheet, Polarity::Like, None).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            set_reaction(&store, stranger, ItemType::Sheet, Uuid::new_v4(), Polarity::Like, None).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            reaction_summary(&store, None, ItemType::Sheet, sheet, None).await,
            Err(AppError::NotFound)
        ));
        let anon = reaction_summary(&store, None, ItemType::Sheet, sheet, Some("GRAPH1"))
            .await
            .unwrap();
        assert_eq!(anon.mine, ReactionState::None);
    }

    #[tokio::test]
    async fn exam_paper_targets_must_exist() {
        let store = MemoryStore::new();
        let user = store.seed_user("User");
        assert!(matches!(
            set_reaction(&store, user, ItemType::ExamPaper, Uuid::new_v4(), Polarity::Like, None).await,
            Err(AppError::NotFound)
        ));
        let paper = store.seed_exam_paper(user, "Operating Systems", "CAT-1");
        let res = set_reaction(&store, user, ItemType::ExamPaper, paper, Polarity::Dislike, None)
            .await
            .unwrap();
        assert_eq!(res.state, ReactionState::Dislike);
    }

    #[tokio::test]
    async fn concurrent_toggles_leave_one_consistent_row() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let owner = store.seed_user("Owner");
        let sheet = shared_sheet(&store, owner).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                set_reaction(&*store, owner, ItemType::Sheet, sheet, Polarity::Like, None)
                    .await
                    .unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        // ten serialized toggles end where they started
        let counts = store.reaction_counts(sheet, ItemType::Sheet).await.unwrap();
        assert_eq!(counts.likes, 0);
        assert_eq!(counts.dislikes, 0);
    }
}
