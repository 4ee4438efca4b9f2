use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/entries", entry_routes())
        .nest("/books", book_routes())
        .route(
            "/files/{category}/{filename}",
            get(handlers::assets::serve_file),
        )
}

fn entry_routes() -> Router<AppState> {
    let crud = Router::new()
        .route(
            "/",
            get(handlers::entry::list_entries).post(handlers::entry::create_entry),
        )
        .route(
            "/{id}",
            get(handlers::entry::get_entry)
                .patch(handlers::entry::update_entry)
                .delete(handlers::entry::delete_entry),
        );

    let upload = Router::new()
        .route("/{id}/image", put(handlers::entry::upload_entry_image))
        .route("/{id}/audio", put(handlers::entry::upload_entry_audio))
        .layer(handlers::upload_body_limit());

    crud.merge(upload)
}

fn book_routes() -> Router<AppState> {
    let crud = Router::new()
        .route(
            "/",
            get(handlers::book::list_books).post(handlers::book::create_book),
        )
        .route(
            "/{id}",
            get(handlers::book::get_book)
                .patch(handlers::book::update_book)
                .delete(handlers::book::delete_book),
        )
        .route("/{id}/compile", post(handlers::book::compile_book));

    let upload = Router::new()
        .route("/{id}/cover", put(handlers::book::upload_book_cover))
        .layer(handlers::upload_body_limit());

    crud.merge(upload)
}
