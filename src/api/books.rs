//! Book API endpoints

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::{created_response, delete_response, view_of};
use crate::{
    error::AppResult,
    models::{
        view::{BookFormOptions, DeleteView},
        BookForm, EntityDetail, EntityKind, EntityView,
    },
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookFormQuery {
    /// Book being edited; its genres come back checked
    pub book_id: Option<Uuid>,
}

/// List all books, sorted by title
#[utoipa::path(
    get,
    path = "/catalog/books",
    tag = "books",
    responses(
        (status = 200, description = "Book list", body = Vec<EntityView>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<EntityView>>> {
    let ctx = state.query_context();
    let books = state.services.views.load_list(EntityKind::Book, &ctx).await?;
    Ok(Json(books))
}

/// Get a book with its copies
#[utoipa::path(
    get,
    path = "/catalog/books/{id}",
    tag = "books",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = EntityDetail),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EntityDetail>> {
    let ctx = state.query_context();
    let detail = state.services.views.load_detail(EntityKind::Book, id, &ctx).await?;
    Ok(Json(detail))
}

/// Authors and genres to choose from in the book form
#[utoipa::path(
    get,
    path = "/catalog/books/form",
    tag = "books",
    params(BookFormQuery),
    responses(
        (status = 200, description = "Book form options", body = BookFormOptions)
    )
)]
pub async fn book_form(
    State(state): State<AppState>,
    Query(query): Query<BookFormQuery>,
) -> AppResult<Json<BookFormOptions>> {
    let ctx = state.query_context();
    let options = state.services.views.load_book_form(query.book_id, &ctx).await?;
    Ok(Json(options))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/catalog/books",
    tag = "books",
    request_body = BookForm,
    responses(
        (status = 201, description = "Book created", body = EntityView),
        (status = 400, description = "Invalid submission", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(form): Json<BookForm>,
) -> AppResult<Response> {
    let ctx = state.query_context();
    let book = state.services.catalog.create_book(form, &ctx).await?;
    created_response(&state, book.into(), true, &ctx).await
}

/// Update a book
#[utoipa::path(
    put,
    path = "/catalog/books/{id}",
    tag = "books",
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = BookForm,
    responses(
        (status = 200, description = "Book updated", body = EntityView)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<BookForm>,
) -> AppResult<Json<EntityView>> {
    let ctx = state.query_context();
    let book = state.services.catalog.update_book(id, form, &ctx).await?;
    Ok(Json(view_of(&state, book.into(), &ctx).await?))
}

#[utoipa::path(
    get,
    path = "/catalog/books/{id}/delete",
    tag = "books",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book and the copies blocking its deletion", body = DeleteView)
    )
)]
pub async fn confirm_delete_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteView>> {
    let ctx = state.query_context();
    let view = state.services.views.delete_view(EntityKind::Book, id, &ctx).await?;
    Ok(Json(view))
}

/// Delete a book that has no copies
#[utoipa::path(
    delete,
    path = "/catalog/books/{id}",
    tag = "books",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 409, description = "Book still has copies", body = crate::models::view::DeleteBlocked)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let ctx = state.query_context();
    let outcome = state.services.integrity.delete(EntityKind::Book, id, &ctx).await?;
    delete_response(&state, EntityKind::Book, outcome, &ctx).await
}
