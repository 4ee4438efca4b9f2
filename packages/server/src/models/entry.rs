use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::entry;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

use super::shared::double_option;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEntryRequest {
    /// The prompt text issued to the owner.
    #[schema(example = "What made you laugh this week?")]
    pub prompt: String,
    /// Optional immediate answer.
    pub answer: Option<String>,
}

/// Partial update. Every field is optional; which fields a caller may touch
/// depends on their role (see [`UpdateEntryRequest::authorize`]).
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateEntryRequest {
    /// Prompt text. Admin-only: prompts are issued, not self-edited.
    pub prompt: Option<String>,
    /// Answer text; `null` clears the answer (making the entry ineligible
    /// for compilation).
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub answer: Option<Option<String>>,
}

impl UpdateEntryRequest {
    /// Enforce the per-role allow-list of mutable fields: owners edit their
    /// answer; only admins edit the prompt.
    pub fn authorize(&self, auth: &AuthUser) -> Result<(), AppError> {
        if self.prompt.is_some() && !auth.is_admin() {
            return Err(AppError::PermissionDenied);
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EntryResponse {
    pub id: i32,
    pub prompt: String,
    pub answer: Option<String>,
    /// Media reference for the attached image, if any.
    #[schema(example = "media/entryImage/6f0c….png")]
    pub image: Option<String>,
    /// Media reference for the attached recording, if any.
    pub audio: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EntryListResponse {
    pub entries: Vec<EntryResponse>,
    pub total: u64,
}

impl From<entry::Model> for EntryResponse {
    fn from(model: entry::Model) -> Self {
        Self {
            id: model.id,
            prompt: model.prompt,
            answer: model.answer,
            image: model.image,
            audio: model.audio,
            created_at: model.created_at,
        }
    }
}
