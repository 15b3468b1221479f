use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::repo::UserRepo;
use crate::error::AppError;
use crate::sheets::{
    code,
    dto::{CreateSheetRequest, PublicSheet, QuotaResponse, SheetDetails, SheetSummary, UpdateSheetRequest},
    permissions,
    repo::SheetRepo,
    repo_types::{NewSheet, Sheet},
};
use crate::validation::{optional_text, required_text, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN};

pub const MAX_SHEETS_PER_OWNER: i64 = 3;

#[derive(Debug)]
struct SheetDraft {
    title: String,
    description: Option<String>,
    code: Option<String>,
}

fn validate_create(req: &CreateSheetRequest) -> Result<SheetDraft, AppError> {
    let title = required_text("title", &req.title, MAX_TITLE_LEN)?;
    let description = optional_text("description", req.description.as_deref(), MAX_DESCRIPTION_LEN)?;
    let code = match req.code.as_deref().map(code::normalize) {
        None => None,
        Some(c) if c.is_empty() => None,
        Some(c) if code::is_well_formed(&c) => Some(c),
        Some(_) => {
            return Err(AppError::validation(format!(
                "code must be {} letters or digits",
                code::CODE_LEN
            )))
        }
    };
    Ok(SheetDraft { title, description, code })
}

fn new_sheet<'a>(owner: Uuid, draft: &'a SheetDraft, code: &'a str) -> NewSheet<'a> {
    NewSheet {
        owner_id: owner,
        title: &draft.title,
        description: draft.description.as_deref(),
        access_code: code,
    }
}

#[instrument(skip(store, req))]
pub async fn create_sheet<S: SheetRepo + ?Sized>(
    store: &S,
    owner: Uuid,
    req: CreateSheetRequest,
    attempts: u32,
) -> Result<Sheet, AppError> {
    create_sheet_with(store, owner, req, attempts, code::generate).await
}

/// Creates a sheet, drawing codes from `next_code` when the request has none.
///
/// A server-drawn code that collides is replaced, up to `attempts` draws.
/// A client-supplied code that collides is reported back as `CodeCollision`.
pub async fn create_sheet_with<S, F>(
    store: &S,
    owner: Uuid,
    req: CreateSheetRequest,
    attempts: u32,
    mut next_code: F,
) -> Result<Sheet, AppError>
where
    S: SheetRepo + ?Sized,
    F: FnMut() -> String + Send,
{
    let draft = validate_create(&req)?;

    if let Some(code) = draft.code.as_deref() {
        let sheet = store
            .insert_sheet(new_sheet(owner, &draft, code), MAX_SHEETS_PER_OWNER)
            .await?;
        info!(sheet_id = %sheet.id, %owner, "sheet created");
        return Ok(sheet);
    }

    for attempt in 1..=attempts.max(1) {
        let code = next_code();
        match store
            .insert_sheet(new_sheet(owner, &draft, &code), MAX_SHEETS_PER_OWNER)
            .await
        {
            Err(AppError::CodeCollision) => {
                warn!(attempt, %owner, "access code collision, drawing a new one");
            }
            Ok(sheet) => {
                info!(sheet_id = %sheet.id, %owner, attempt, "sheet created");
                return Ok(sheet);
            }
            Err(e) => return Err(e),
        }
    }
    Err(AppError::CodeCollision)
}

#[instrument(skip(store))]
pub async fn delete_sheet<S: SheetRepo + ?Sized>(
    store: &S,
    actor: Uuid,
    sheet_id: Uuid,
) -> Result<(), AppError> {
    let sheet = store.find_sheet(sheet_id).await?.ok_or(AppError::NotFound)?;
    permissions::ensure_owner(actor, &sheet)?;
    if !store.delete_sheet(sheet_id).await? {
        return Err(AppError::NotFound);
    }
    info!(%sheet_id, owner = %actor, "sheet deleted");
    Ok(())
}

#[instrument(skip(store))]
pub async fn resolve_by_code<S: SheetRepo + UserRepo + ?Sized>(
    store: &S,
    raw_code: &str,
) -> Result<PublicSheet, AppError> {
    let code = code::normalize(raw_code);
    if !code::is_well_formed(&code) {
        return Err(AppError::NotFound);
    }
    let sheet = store.find_sheet_by_code(&code).await?.ok_or(AppError::NotFound)?;
    let owner_name = store.find_user_by_id(sheet.owner_id).await?.map(|u| u.name);
    Ok(PublicSheet {
        id: sheet.id,
        title: sheet.title,
        description: sheet.description,
        access_code: sheet.access_code,
        owner_id: sheet.owner_id,
        owner_name,
    })
}

pub async fn list_owned<S: SheetRepo + ?Sized>(
    store: &S,
    owner: Uuid,
) -> Result<Vec<SheetSummary>, AppError> {
    let sheets = store.list_sheets_by_owner(owner).await?;
    Ok(sheets.into_iter().map(SheetSummary::from).collect())
}

pub async fn quota<S: SheetRepo + ?Sized>(store: &S, owner: Uuid) -> Result<QuotaResponse, AppError> {
    Ok(QuotaResponse {
        owned: store.count_sheets_by_owner(owner).await?,
        limit: MAX_SHEETS_PER_OWNER,
    })
}

/// Loads a sheet and checks read access.
pub async fn load_readable<S: SheetRepo + ?Sized>(
    store: &S,
    actor: Option<Uuid>,
    sheet_id: Uuid,
    code: Option<&str>,
) -> Result<(Sheet, permissions::Access), AppError> {
    let sheet = store.find_sheet(sheet_id).await?.ok_or(AppError::NotFound)?;
    let access = permissions::ensure_reader(actor, code, &sheet)?;
    Ok((sheet, access))
}

pub async fn get_sheet<S: SheetRepo + ?Sized>(
    store: &S,
    actor: Option<Uuid>,
    sheet_id: Uuid,
    code: Option<&str>,
) -> Result<SheetDetails, AppError> {
    let (sheet, access) = load_readable(store, actor, sheet_id, code).await?;
    Ok(SheetDetails::new(sheet, access))
}

#[instrument(skip(store, req))]
pub async fn update_sheet<S: SheetRepo + ?Sized>(
    store: &S,
    actor: Uuid,
    sheet_id: Uuid,
    req: UpdateSheetRequest,
) -> Result<SheetDetails, AppError> {
    let title = req
        .title
        .as_deref()
        .map(|t| required_text("title", t, MAX_TITLE_LEN))
        .transpose()?;
    let description = req
        .description
        .as_deref()
        .map(|d| optional_text("description", Some(d), MAX_DESCRIPTION_LEN))
        .transpose()?;

    let sheet = store.find_sheet(sheet_id).await?.ok_or(AppError::NotFound)?;
    permissions::ensure_owner(actor, &sheet)?;

    let title = title.unwrap_or(sheet.title);
    let description = description.unwrap_or(sheet.description);
    let updated = store
        .update_sheet(sheet_id, &title, description.as_deref())
        .await?;
    info!(%sheet_id, "sheet updated");
    Ok(SheetDetails::new(updated, permissions::Access::Owner))
}
