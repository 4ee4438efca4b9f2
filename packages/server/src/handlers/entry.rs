use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use memoir_common::MediaCategory;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::instrument;

use crate::entity::entry;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::media::validate_media_type;
use crate::models::entry::{
    CreateEntryRequest, EntryListResponse, EntryResponse, UpdateEntryRequest,
};
use crate::state::AppState;

use super::{single_file_field, stored_ref};

#[utoipa::path(
    post,
    path = "/api/v1/entries",
    tag = "Entries",
    operation_id = "createEntry",
    summary = "Issue a new prompt entry to the authenticated user",
    responses(
        (status = 201, description = "Entry created", body = EntryResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, req))]
pub async fn create_entry(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.prompt.trim().is_empty() {
        return Err(AppError::Validation("Prompt must not be empty".into()));
    }

    let model = entry::ActiveModel {
        owner_id: Set(auth.user_id),
        prompt: Set(req.prompt),
        answer: Set(req.answer),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(EntryResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/entries",
    tag = "Entries",
    operation_id = "listEntries",
    summary = "List the authenticated user's entries in insertion order",
    responses(
        (status = 200, description = "Entry list", body = EntryListResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth))]
pub async fn list_entries(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<EntryListResponse>, AppError> {
    let rows = entry::Entity::find()
        .filter(entry::Column::OwnerId.eq(auth.user_id))
        .order_by_asc(entry::Column::Id)
        .all(&state.db)
        .await?;

    let total = rows.len() as u64;
    Ok(Json(EntryListResponse {
        entries: rows.into_iter().map(EntryResponse::from).collect(),
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/entries/{id}",
    tag = "Entries",
    operation_id = "getEntry",
    summary = "Get one entry",
    params(("id" = i32, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "The entry", body = EntryResponse),
        (status = 404, description = "Entry not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(entry_id = id))]
pub async fn get_entry(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EntryResponse>, AppError> {
    let model = find_owned_entry(&state, &auth, id).await?;
    Ok(Json(EntryResponse::from(model)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/entries/{id}",
    tag = "Entries",
    operation_id = "updateEntry",
    summary = "Update an entry",
    description = "Owners may edit the answer (null clears it); only admins may edit the prompt. \
        Attached media is replaced through the dedicated upload endpoints.",
    params(("id" = i32, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Updated entry", body = EntryResponse),
        (status = 403, description = "Field not editable for this role", body = ErrorBody),
        (status = 404, description = "Entry not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, req), fields(entry_id = id))]
pub async fn update_entry(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<Json<EntryResponse>, AppError> {
    req.authorize(&auth)?;
    let model = find_owned_entry(&state, &auth, id).await?;

    let mut active: entry::ActiveModel = model.into();
    if let Some(prompt) = req.prompt {
        if prompt.trim().is_empty() {
            return Err(AppError::Validation("Prompt must not be empty".into()));
        }
        active.prompt = Set(prompt);
    }
    if let Some(answer) = req.answer {
        active.answer = Set(answer);
    }

    let model = active.update(&state.db).await?;
    Ok(Json(EntryResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/entries/{id}",
    tag = "Entries",
    operation_id = "deleteEntry",
    summary = "Delete an entry and release its media",
    params(("id" = i32, Path, description = "Entry ID")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 404, description = "Entry not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(entry_id = id))]
pub async fn delete_entry(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let model = find_owned_entry(&state, &auth, id).await?;

    entry::Entity::delete_by_id(id).exec(&state.db).await?;

    state
        .lifecycle
        .release(stored_ref(model.image.as_deref()).as_ref())
        .await?;
    state
        .lifecycle
        .release(stored_ref(model.audio.as_deref()).as_ref())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/v1/entries/{id}/image",
    tag = "Entries",
    operation_id = "uploadEntryImage",
    summary = "Attach or replace the entry's image",
    description = "Multipart upload with a `file` field. The new blob is stored before the \
        previous one is deleted, so a failed upload never loses the current image.",
    params(("id" = i32, Path, description = "Entry ID")),
    request_body(content_type = "multipart/form-data", description = "Image file"),
    responses(
        (status = 200, description = "Updated entry", body = EntryResponse),
        (status = 404, description = "Entry not found", body = ErrorBody),
        (status = 415, description = "Not an accepted image type", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, multipart), fields(entry_id = id))]
pub async fn upload_entry_image(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<EntryResponse>, AppError> {
    replace_entry_media(&state, &auth, id, multipart, MediaCategory::EntryImage).await
}

#[utoipa::path(
    put,
    path = "/api/v1/entries/{id}/audio",
    tag = "Entries",
    operation_id = "uploadEntryAudio",
    summary = "Attach or replace the entry's audio recording",
    params(("id" = i32, Path, description = "Entry ID")),
    request_body(content_type = "multipart/form-data", description = "Audio file"),
    responses(
        (status = 200, description = "Updated entry", body = EntryResponse),
        (status = 404, description = "Entry not found", body = ErrorBody),
        (status = 415, description = "Not an accepted audio type", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, multipart), fields(entry_id = id))]
pub async fn upload_entry_audio(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<EntryResponse>, AppError> {
    replace_entry_media(&state, &auth, id, multipart, MediaCategory::EntryAudio).await
}

async fn replace_entry_media(
    state: &AppState,
    auth: &AuthUser,
    id: i32,
    multipart: Multipart,
    category: MediaCategory,
) -> Result<Json<EntryResponse>, AppError> {
    let model = find_owned_entry(state, auth, id).await?;

    let upload = single_file_field(multipart, "file").await?;
    validate_media_type(&upload.filename, category)?;

    let old = match category {
        MediaCategory::EntryAudio => stored_ref(model.audio.as_deref()),
        _ => stored_ref(model.image.as_deref()),
    };
    let new_ref = state
        .lifecycle
        .replace(old.as_ref(), Some(upload), category)
        .await?;

    let mut active: entry::ActiveModel = model.into();
    let value = Set(new_ref.map(|r| r.to_string()));
    match category {
        MediaCategory::EntryAudio => active.audio = value,
        _ => active.image = value,
    }

    let model = active.update(&state.db).await?;
    Ok(Json(EntryResponse::from(model)))
}

/// Look up an entry, hiding other tenants' rows behind `NotFound`.
async fn find_owned_entry(
    state: &AppState,
    auth: &AuthUser,
    id: i32,
) -> Result<entry::Model, AppError> {
    entry::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .filter(|m| m.owner_id == auth.user_id || auth.is_admin())
        .ok_or_else(|| AppError::NotFound("Entry not found".into()))
}
