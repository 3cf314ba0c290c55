//! Book instance (copy) API endpoints

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
        view::{BookInstanceFormOptions, DeleteView},
        BookInstanceForm, EntityDetail, EntityKind, EntityView,
    },
    AppState,
};

/// List all copies in creation order
#[utoipa::path(
    get,
    path = "/catalog/bookinstances",
    tag = "bookinstances",
    responses(
        (status = 200, description = "Copy list", body = Vec<EntityView>)
    )
)]
pub async fn list_book_instances(State(state): State<AppState>) -> AppResult<Json<Vec<EntityView>>> {
    let ctx = state.query_context();
    let copies = state.services.views.load_list(EntityKind::BookInstance, &ctx).await?;
    Ok(Json(copies))
}

#[utoipa::path(
    get,
    path = "/catalog/bookinstances/{id}",
    tag = "bookinstances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Copy details", body = EntityDetail),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book_instance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EntityDetail>> {
    let ctx = state.query_context();
    let detail = state
        .services
        .views
        .load_detail(EntityKind::BookInstance, id, &ctx)
        .await?;
    Ok(Json(detail))
}

/// Books and statuses to choose from in the copy form
#[utoipa::path(
    get,
    path = "/catalog/bookinstances/form",
    tag = "bookinstances",
    responses(
        (status = 200, description = "Copy form options", body = BookInstanceFormOptions)
    )
)]
pub async fn book_instance_form(State(state): State<AppState>) -> AppResult<Json<BookInstanceFormOptions>> {
    let ctx = state.query_context();
    let options = state.services.views.load_instance_form(&ctx).await?;
    Ok(Json(options))
}

/// Create a copy of a book
#[utoipa::path(
    post,
    path = "/catalog/bookinstances",
    tag = "bookinstances",
    request_body = BookInstanceForm,
    responses(
        (status = 201, description = "Copy created", body = EntityView),
        (status = 400, description = "Invalid submission", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book_instance(
    State(state): State<AppState>,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<Response> {
    let ctx = state.query_context();
    let copy = state.services.catalog.create_book_instance(form, &ctx).await?;
    created_response(&state, copy.into(), true, &ctx).await
}

#[utoipa::path(
    put,
    path = "/catalog/bookinstances/{id}",
    tag = "bookinstances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = BookInstanceForm,
    responses(
        (status = 200, description = "Copy updated", body = EntityView)
    )
)]
pub async fn update_book_instance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<Json<EntityView>> {
    let ctx = state.query_context();
    let copy = state
        .services
        .catalog
        .update_book_instance(id, form, &ctx)
        .await?;
    Ok(Json(view_of(&state, copy.into(), &ctx).await?))
}

#[utoipa::path(
    get,
    path = "/catalog/bookinstances/{id}/delete",
    tag = "bookinstances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Copy delete confirmation", body = DeleteView)
    )
)]
pub async fn confirm_delete_book_instance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteView>> {
    let ctx = state.query_context();
    let view = state
        .services
        .views
        .delete_view(EntityKind::BookInstance, id, &ctx)
        .await?;
    Ok(Json(view))
}

/// Delete a copy
#[utoipa::path(
    delete,
    path = "/catalog/bookinstances/{id}",
    tag = "bookinstances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 204, description = "Copy deleted")
    )
)]
pub async fn delete_book_instance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let ctx = state.query_context();
    let outcome = state
        .services
        .integrity
        .delete(EntityKind::BookInstance, id, &ctx)
        .await?;
    delete_response(&state, EntityKind::BookInstance, outcome, &ctx).await
}
