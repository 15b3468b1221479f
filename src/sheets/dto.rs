use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::sheets::permissions::Access;
use crate::sheets::repo_types::Sheet;

#[derive(Debug, Deserialize)]
pub struct CreateSheetRequest {
    pub title: String,
    pub description: Option<String>,
    /// Client-chosen code from a preview; generated server-side when absent.
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSheetRequest {
    pub title: Option<String>,
    /// An empty string clears the description.
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CodeQuery {
    pub code: Option<String>,
}

/// Owner-facing sheet listing row.
#[derive(Debug, Serialize)]
pub struct SheetSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub access_code: String,
    pub created_at: OffsetDateTime,
}

impl From<Sheet> for SheetSummary {
    fn from(s: Sheet) -> Self {
        Self {
            id: s.id,
            title: s.title,
            description: s.description,
            access_code: s.access_code,
            created_at: s.created_at,
        }
    }
}

/// What a code holder learns about a sheet.
#[derive(Debug, Serialize)]
pub struct PublicSheet {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub access_code: String,
    pub owner_id: Uuid,
    pub owner_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SheetDetails {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub access_code: String,
    pub owner_id: Uuid,
    pub is_owner: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl SheetDetails {
    pub fn new(s: Sheet, access: Access) -> Self {
        Self {
            id: s.id,
            title: s.title,
            description: s.description,
            access_code: s.access_code,
            owner_id: s.owner_id,
            is_owner: access.is_owner(),
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuotaResponse {
    pub owned: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct CodePreview {
    pub code: String,
}
