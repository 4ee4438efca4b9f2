use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use memoir_common::MediaRef;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Output boundary: stream a stored blob byte-for-byte by its reference path.
///
/// Compiled artifacts and uploaded media are both served here; nothing is
/// transformed between the store and the client.
#[utoipa::path(
    get,
    path = "/api/v1/files/{category}/{filename}",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a stored blob by reference path",
    params(
        ("category" = String, Path, description = "Media category segment"),
        ("filename" = String, Path, description = "Blob filename"),
    ),
    responses(
        (status = 200, description = "Blob content"),
        (status = 404, description = "Unknown reference", body = crate::error::ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn serve_file(
    State(state): State<AppState>,
    Path((category, filename)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let media_ref = MediaRef::parse(&format!("media/{category}/{filename}"))
        .map_err(|_| AppError::NotFound("File not found".into()))?;

    let reader = state.assets.open(&media_ref).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let mime = mime_guess::from_path(media_ref.filename()).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
