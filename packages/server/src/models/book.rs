use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::book;
use crate::error::AppError;

use super::shared::{double_option, validate_title};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateBookRequest {
    #[schema(example = "My Year")]
    pub title: String,
    #[schema(example = "2024")]
    pub subtitle: Option<String>,
}

impl CreateBookRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)
    }
}

/// Partial update. Owners may edit title and subtitle; cover art goes through
/// the dedicated upload endpoint so the media lifecycle is enforced.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    /// `null` clears the subtitle (the compiled document then has no title
    /// page).
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub subtitle: Option<Option<String>>,
}

impl UpdateBookRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BookResponse {
    pub id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    /// Media reference for the cover art, if any.
    #[schema(example = "media/cover/0b9d….png")]
    pub cover_image: Option<String>,
    /// Media reference of the last compiled document, if any.
    #[schema(example = "media/pdf/77a1….pdf")]
    pub pdf: Option<String>,
    pub compiled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BookListResponse {
    pub books: Vec<BookResponse>,
    pub total: u64,
}

impl From<book::Model> for BookResponse {
    fn from(model: book::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            subtitle: model.subtitle,
            cover_image: model.cover_image,
            pdf: model.pdf,
            compiled_at: model.compiled_at,
            created_at: model.created_at,
        }
    }
}
