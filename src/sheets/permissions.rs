//! Owner/viewer rules for sheets.
//!
//! Owners may do everything. Anyone presenting the access code may read;
//! authenticated code holders may also toggle completion and react.

use uuid::Uuid;

use crate::error::AppError;
use crate::sheets::{code, repo_types::Sheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Owner,
    Viewer,
}

impl Access {
    pub fn is_owner(self) -> bool {
        matches!(self, Access::Owner)
    }
}

pub fn can_edit(actor: Uuid, sheet: &Sheet) -> bool {
    actor == sheet.owner_id
}

pub fn access(actor: Option<Uuid>, presented_code: Option<&str>, sheet: &Sheet) -> Option<Access> {
    if actor.is_some_and(|a| can_edit(a, sheet)) {
        return Some(Access::Owner);
    }
    match presented_code {
        Some(c) if code::normalize(c) == sheet.access_code => Some(Access::Viewer),
        _ => None,
    }
}

pub fn ensure_owner(actor: Uuid, sheet: &Sheet) -> Result<(), AppError> {
    if can_edit(actor, sheet) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Read access. An id without the code must not reveal the sheet exists.
pub fn ensure_reader(
    actor: Option<Uuid>,
    presented_code: Option<&str>,
    sheet: &Sheet,
) -> Result<Access, AppError> {
    access(actor, presented_code, sheet).ok_or(AppError::NotFound)
}

/// Personal interactions (completion, reactions): identity plus view access.
pub fn ensure_participant(
    actor: Uuid,
    presented_code: Option<&str>,
    sheet: &Sheet,
) -> Result<Access, AppError> {
    access(Some(actor), presented_code, sheet).ok_or(AppError::Forbidden)
}
