//! Genre API endpoints

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
        EntityDetail, EntityKind, EntityView, GenreForm,
    },
    AppState,
};

/// List all genres, sorted by name
#[utoipa::path(
    get,
    path = "/catalog/genres",
    tag = "genres",
    responses(
        (status = 200, description = "Genre list", body = Vec<EntityView>)
    )
)]
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Vec<EntityView>>> {
    let ctx = state.query_context();
    let genres = state.services.views.load_list(EntityKind::Genre, &ctx).await?;
    Ok(Json(genres))
}

/// Get a genre with its books
#[utoipa::path(
    get,
    path = "/catalog/genres/{id}",
    tag = "genres",
    params(("id" = Uuid, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre details", body = EntityDetail),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EntityDetail>> {
    let ctx = state.query_context();
    let detail = state.services.views.load_detail(EntityKind::Genre, id, &ctx).await?;
    Ok(Json(detail))
}

/// Create a genre, or return the existing one with the same name
#[utoipa::path(
    post,
    path = "/catalog/genres",
    tag = "genres",
    request_body = GenreForm,
    responses(
        (status = 201, description = "Genre created", body = EntityView),
        (status = 200, description = "Genre already existed", body = EntityView)
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    Json(form): Json<GenreForm>,
) -> AppResult<Response> {
    let ctx = state.query_context();
    let outcome = state.services.catalog.create_genre(form, &ctx).await?;
    let created = outcome.is_created();
    created_response(&state, outcome.into_inner().into(), created, &ctx).await
}

/// Rename a genre
#[utoipa::path(
    put,
    path = "/catalog/genres/{id}",
    tag = "genres",
    params(("id" = Uuid, Path, description = "Genre ID")),
    request_body = GenreForm,
    responses(
        (status = 200, description = "Genre updated", body = EntityView)
    )
)]
pub async fn update_genre(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<GenreForm>,
) -> AppResult<Json<EntityView>> {
    let ctx = state.query_context();
    let genre = state.services.catalog.update_genre(id, form, &ctx).await?;
    Ok(Json(view_of(&state, genre.into(), &ctx).await?))
}

#[utoipa::path(
    get,
    path = "/catalog/genres/{id}/delete",
    tag = "genres",
    params(("id" = Uuid, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre delete confirmation", body = DeleteView)
    )
)]
pub async fn confirm_delete_genre(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteView>> {
    let ctx = state.query_context();
    let view = state.services.views.delete_view(EntityKind::Genre, id, &ctx).await?;
    Ok(Json(view))
}

/// Delete a genre
///
/// Whether books still using the genre block the delete depends on
/// `integrity.genre`.
#[utoipa::path(
    delete,
    path = "/catalog/genres/{id}",
    tag = "genres",
    params(("id" = Uuid, Path, description = "Genre ID")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 409, description = "Genre still used by books", body = crate::models::view::DeleteBlocked)
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let ctx = state.query_context();
    let outcome = state.services.integrity.delete(EntityKind::Genre, id, &ctx).await?;
    delete_response(&state, EntityKind::Genre, outcome, &ctx).await
}
