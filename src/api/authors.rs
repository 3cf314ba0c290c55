//! Author API endpoints

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use uuid::Uuid;

use super::{created_response, delete_response, view_of};
use crate::{
    error::AppResult,
    models::{
        view::DeleteView,
        AuthorForm, EntityDetail, EntityKind, EntityView,
    },
    AppState,
};

/// List all authors, sorted by family name
#[utoipa::path(
    get,
    path = "/catalog/authors",
    tag = "authors",
    responses(
        (status = 200, description = "Author list", body = Vec<EntityView>)
    )
)]
pub async fn list_authors(State(state): State<AppState>) -> AppResult<Json<Vec<EntityView>>> {
    let ctx = state.query_context();
    let authors = state.services.views.load_list(EntityKind::Author, &ctx).await?;
    Ok(Json(authors))
}

/// Get an author with their books
#[utoipa::path(
    get,
    path = "/catalog/authors/{id}",
    tag = "authors",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = EntityDetail),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EntityDetail>> {
    let ctx = state.query_context();
    let detail = state.services.views.load_detail(EntityKind::Author, id, &ctx).await?;
    Ok(Json(detail))
}

/// Create an author
///
/// An author with the same first and family name is returned as is.
#[utoipa::path(
    post,
    path = "/catalog/authors",
    tag = "authors",
    request_body = AuthorForm,
    responses(
        (status = 201, description = "Author created", body = EntityView),
        (status = 200, description = "Author already existed", body = EntityView),
        (status = 400, description = "Invalid submission", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    Json(form): Json<AuthorForm>,
) -> AppResult<Response> {
    let ctx = state.query_context();
    let outcome = state.services.catalog.create_author(form, &ctx).await?;
    let created = outcome.is_created();
    created_response(&state, outcome.into_inner().into(), created, &ctx).await
}

/// Update an author
#[utoipa::path(
    put,
    path = "/catalog/authors/{id}",
    tag = "authors",
    params(("id" = Uuid, Path, description = "Author ID")),
    request_body = AuthorForm,
    responses(
        (status = 200, description = "Author updated", body = EntityView)
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<AuthorForm>,
) -> AppResult<Json<EntityView>> {
    let ctx = state.query_context();
    let author = state.services.catalog.update_author(id, form, &ctx).await?;
    Ok(Json(view_of(&state, author.into(), &ctx).await?))
}

/// Delete confirmation data for an author
#[utoipa::path(
    get,
    path = "/catalog/authors/{id}/delete",
    tag = "authors",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author and the books blocking its deletion", body = DeleteView)
    )
)]
pub async fn confirm_delete_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteView>> {
    let ctx = state.query_context();
    let view = state.services.views.delete_view(EntityKind::Author, id, &ctx).await?;
    Ok(Json(view))
}

/// Delete an author that has no books
#[utoipa::path(
    delete,
    path = "/catalog/authors/{id}",
    tag = "authors",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 409, description = "Author still has books", body = crate::models::view::DeleteBlocked)
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let ctx = state.query_context();
    let outcome = state.services.integrity.delete(EntityKind::Author, id, &ctx).await?;
    delete_response(&state, EntityKind::Author, outcome, &ctx).await
}
