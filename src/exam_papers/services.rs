use bytes::Bytes;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::exam_papers::{
    dto::{ExamPaperForm, ExamPaperView},
    repo::ExamPaperRepo,
    repo_types::{ExamPaper, NewExamPaper},
};
use crate::reactions::{repo::ReactionRepo, repo_types::ItemType};
use crate::storage::StorageClient;
use crate::validation::required_text;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const URL_TTL_SECS: u64 = 30 * 60;
const MAX_FIELD_LEN: usize = 80;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

fn storage_error(e: anyhow::Error) -> AppError {
    AppError::StoreUnavailable(format!("{e:#}"))
}

async fn to_view<S>(
    store: &S,
    storage: &dyn StorageClient,
    paper: ExamPaper,
) -> Result<ExamPaperView, AppError>
where
    S: ReactionRepo + ?Sized,
{
    let url = storage
        .presign_get(&paper.object_key, URL_TTL_SECS)
        .await
        .map_err(storage_error)?;
    let counts = store.reaction_counts(paper.id, ItemType::ExamPaper).await?;
    Ok(ExamPaperView {
        id: paper.id,
        uploader_id: paper.uploader_id,
        subject: paper.subject,
        exam_type: paper.exam_type,
        slot: paper.slot,
        url,
        likes: counts.likes,
        dislikes: counts.dislikes,
        created_at: paper.created_at,
    })
}

#[instrument(skip(store, storage, form, file))]
pub async fn upload_exam_paper<S>(
    store: &S,
    storage: &dyn StorageClient,
    uploader: Uuid,
    form: ExamPaperForm,
    file: Option<UploadItem>,
) -> Result<ExamPaperView, AppError>
where
    S: ExamPaperRepo + ReactionRepo + ?Sized,
{
    let subject = required_text("subject", form.subject.as_deref().unwrap_or_default(), MAX_FIELD_LEN)?;
    let exam_type = required_text("exam_type", form.exam_type.as_deref().unwrap_or_default(), MAX_FIELD_LEN)?;
    let slot = required_text("slot", form.slot.as_deref().unwrap_or_default(), MAX_FIELD_LEN)?;
    let file = file.ok_or_else(|| AppError::validation("file is required"))?;
    if file.body.is_empty() {
        return Err(AppError::validation("file is empty"));
    }
    if file.body.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::validation("file exceeds 10 MB"));
    }
    let ext = ext_from_mime(&file.content_type)
        .ok_or_else(|| AppError::validation("file must be an image or a PDF"))?;

    let id = Uuid::new_v4();
    let key = format!("exam-papers/{uploader}/{id}.{ext}");
    storage
        .put_object(&key, file.body, &file.content_type)
        .await
        .map_err(storage_error)?;

    let inserted = store
        .insert_exam_paper(NewExamPaper {
            id,
            uploader_id: uploader,
            subject: &subject,
            exam_type: &exam_type,
            slot: &slot,
            object_key: &key,
        })
        .await;
    let paper = match inserted {
        Ok(p) => p,
        Err(e) => {
            if let Err(cleanup) = storage.delete_object(&key).await {
                warn!(error = %cleanup, %key, "orphaned exam paper object");
            }
            return Err(e);
        }
    };

    info!(paper_id = %paper.id, %uploader, "exam paper uploaded");
    to_view(store, storage, paper).await
}

pub async fn search_exam_papers<S>(
    store: &S,
    storage: &dyn StorageClient,
    query: &str,
    limit: i64,
) -> Result<Vec<ExamPaperView>, AppError>
where
    S: ExamPaperRepo + ReactionRepo + ?Sized,
{
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let papers = store.search_exam_papers(query, limit.clamp(1, 100)).await?;
    let mut out = Vec::with_capacity(papers.len());
    for paper in papers {
        out.push(to_view(store, storage, paper).await?);
    }
    Ok(out)
}
