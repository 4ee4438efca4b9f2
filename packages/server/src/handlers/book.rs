use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use memoir_common::MediaCategory;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::instrument;

use crate::compile::repo::{DbBookRecords, DbEntrySource};
use crate::compile::DocumentCompiler;
use crate::entity::book;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::media::validate_media_type;
use crate::models::book::{BookListResponse, BookResponse, CreateBookRequest, UpdateBookRequest};
use crate::models::compile::CompileResponse;
use crate::state::AppState;

use super::{single_file_field, stored_ref};

#[utoipa::path(
    post,
    path = "/api/v1/books",
    tag = "Books",
    operation_id = "createBook",
    summary = "Create a book",
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, req))]
pub async fn create_book(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let model = book::ActiveModel {
        owner_id: Set(auth.user_id),
        title: Set(req.title),
        subtitle: Set(req.subtitle),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/books",
    tag = "Books",
    operation_id = "listBooks",
    summary = "List the authenticated user's books",
    responses(
        (status = 200, description = "Book list", body = BookListResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth))]
pub async fn list_books(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<BookListResponse>, AppError> {
    let rows = book::Entity::find()
        .filter(book::Column::OwnerId.eq(auth.user_id))
        .order_by_asc(book::Column::Id)
        .all(&state.db)
        .await?;

    let total = rows.len() as u64;
    Ok(Json(BookListResponse {
        books: rows.into_iter().map(BookResponse::from).collect(),
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    tag = "Books",
    operation_id = "getBook",
    summary = "Get one book",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "The book", body = BookResponse),
        (status = 404, description = "Book not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(book_id = id))]
pub async fn get_book(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BookResponse>, AppError> {
    let model = find_owned_book(&state, &auth, id).await?;
    Ok(Json(BookResponse::from(model)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/books/{id}",
    tag = "Books",
    operation_id = "updateBook",
    summary = "Update a book's title or subtitle",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Updated book", body = BookResponse),
        (status = 404, description = "Book not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, req), fields(book_id = id))]
pub async fn update_book(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<BookResponse>, AppError> {
    req.validate()?;
    let model = find_owned_book(&state, &auth, id).await?;

    let mut active: book::ActiveModel = model.into();
    if let Some(title) = req.title {
        active.title = Set(title);
    }
    if let Some(subtitle) = req.subtitle {
        active.subtitle = Set(subtitle);
    }

    let model = active.update(&state.db).await?;
    Ok(Json(BookResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    tag = "Books",
    operation_id = "deleteBook",
    summary = "Delete a book, releasing its cover and compiled artifact",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(book_id = id))]
pub async fn delete_book(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let model = find_owned_book(&state, &auth, id).await?;

    book::Entity::delete_by_id(id).exec(&state.db).await?;

    state
        .lifecycle
        .release(stored_ref(model.cover_image.as_deref()).as_ref())
        .await?;
    state
        .lifecycle
        .release(stored_ref(model.pdf.as_deref()).as_ref())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/v1/books/{id}/cover",
    tag = "Books",
    operation_id = "uploadBookCover",
    summary = "Attach or replace the book's cover image",
    description = "Multipart upload with a `file` field. The new blob is stored before the \
        previous one is deleted.",
    params(("id" = i32, Path, description = "Book ID")),
    request_body(content_type = "multipart/form-data", description = "Cover image file"),
    responses(
        (status = 200, description = "Updated book", body = BookResponse),
        (status = 404, description = "Book not found", body = ErrorBody),
        (status = 415, description = "Not an accepted image type", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, multipart), fields(book_id = id))]
pub async fn upload_book_cover(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<BookResponse>, AppError> {
    let model = find_owned_book(&state, &auth, id).await?;

    let upload = single_file_field(multipart, "file").await?;
    validate_media_type(&upload.filename, MediaCategory::Cover)?;

    let old = stored_ref(model.cover_image.as_deref());
    let new_ref = state
        .lifecycle
        .replace(old.as_ref(), Some(upload), MediaCategory::Cover)
        .await?;

    let mut active: book::ActiveModel = model.into();
    active.cover_image = Set(new_ref.map(|r| r.to_string()));

    let model = active.update(&state.db).await?;
    Ok(Json(BookResponse::from(model)))
}

#[utoipa::path(
    post,
    path = "/api/v1/books/{id}/compile",
    tag = "Books",
    operation_id = "compileBook",
    summary = "Compile the user's answered entries into a document",
    description = "Produces a PDF with the book's cover, a title page, and one page per answered \
        entry, stores it durably, and records the artifact reference on the book. Recompiling \
        overwrites the reference.",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Compiled document", body = CompileResponse),
        (status = 404, description = "Book not found", body = ErrorBody),
        (status = 412, description = "No answered entries to compile", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(book_id = id))]
pub async fn compile_book(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CompileResponse>, AppError> {
    let compiler = DocumentCompiler::new(state.assets.clone());
    let books = DbBookRecords { db: &state.db };
    let entries = DbEntrySource { db: &state.db };

    let outcome = compiler.compile(auth.user_id, id, &books, &entries).await?;
    Ok(Json(CompileResponse::from(outcome)))
}

/// Look up a book, hiding other tenants' rows behind `NotFound`.
async fn find_owned_book(
    state: &AppState,
    auth: &AuthUser,
    id: i32,
) -> Result<book::Model, AppError> {
    book::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .filter(|m| m.owner_id == auth.user_id || auth.is_admin())
        .ok_or_else(|| AppError::NotFound("Book not found".into()))
}
