pub mod assets;
pub mod book;
pub mod entry;

use axum::extract::{DefaultBodyLimit, Multipart};
use memoir_common::{MediaRef, Upload};

use crate::error::AppError;

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(32 * 1024 * 1024) // 32 MB
}

/// Pull a single named file field out of a multipart body. Unknown fields are
/// ignored.
pub(crate) async fn single_file_field(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some(field_name) {
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
            return Ok(Upload::new(bytes.to_vec(), filename));
        }
    }

    Err(AppError::Validation(format!("Missing '{field_name}' field")))
}

/// Parse a media reference persisted on a row. Malformed values are treated
/// as absent rather than failing the request.
pub(crate) fn stored_ref(stored: Option<&str>) -> Option<MediaRef> {
    let stored = stored?;
    match MediaRef::parse(stored) {
        Ok(r) => Some(r),
        Err(err) => {
            tracing::warn!(stored, %err, "ignoring malformed stored media reference");
            None
        }
    }
}
