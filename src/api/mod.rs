//! API handlers for the catalog REST endpoints

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod genres;
pub mod health;
pub mod openapi;

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{view::DeleteBlocked, EntityKind, EntityView, Record},
    repository::QueryContext,
    services::integrity::DeleteOutcome,
    AppState,
};

/// Resource path of a record under the API root
pub fn resource_path(kind: EntityKind, id: uuid::Uuid) -> String {
    let collection = match kind {
        EntityKind::Author => "authors",
        EntityKind::Genre => "genres",
        EntityKind::Book => "books",
        EntityKind::BookInstance => "bookinstances",
    };
    format!("/api/v1/catalog/{}/{}", collection, id)
}

/// Resolve a single record into its view
async fn view_of(state: &AppState, record: Record, ctx: &QueryContext) -> AppResult<EntityView> {
    state
        .services
        .views
        .resolve(std::slice::from_ref(&record), ctx)
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("record resolved to no view".to_string()))
}

/// 201 with a Location header for new records, 200 when an existing one is returned
async fn created_response(
    state: &AppState,
    record: Record,
    created: bool,
    ctx: &QueryContext,
) -> AppResult<Response> {
    let kind = record.kind();
    let view = view_of(state, record, ctx).await?;
    let location = resource_path(kind, view.id());
    if created {
        Ok((StatusCode::CREATED, [(LOCATION, location)], Json(view)).into_response())
    } else {
        Ok((StatusCode::OK, Json(view)).into_response())
    }
}

/// 204 when deleted, 409 listing the blocking records otherwise
async fn delete_response(
    state: &AppState,
    kind: EntityKind,
    outcome: DeleteOutcome,
    ctx: &QueryContext,
) -> AppResult<Response> {
    match outcome {
        DeleteOutcome::Deleted(_) => Ok(StatusCode::NO_CONTENT.into_response()),
        DeleteOutcome::Blocked(check) => {
            let blocking = state.services.views.resolve(&check.blocking, ctx).await?;
            let body = DeleteBlocked {
                code: ErrorCode::HasDependents as u32,
                error: format!("{:?}", ErrorCode::HasDependents),
                message: format!(
                    "{} is still referenced by {} record(s); delete them first",
                    kind.label(),
                    blocking.len()
                ),
                blocking,
            };
            Ok((StatusCode::CONFLICT, Json(body)).into_response())
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog home
        .route("/catalog", get(catalog::get_summary))
        // Authors
        .route("/catalog/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/catalog/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        .route("/catalog/authors/:id/delete", get(authors::confirm_delete_author))
        // Genres
        .route("/catalog/genres", get(genres::list_genres).post(genres::create_genre))
        .route(
            "/catalog/genres/:id",
            get(genres::get_genre)
                .put(genres::update_genre)
                .delete(genres::delete_genre),
        )
        .route("/catalog/genres/:id/delete", get(genres::confirm_delete_genre))
        // Books
        .route("/catalog/books", get(books::list_books).post(books::create_book))
        .route("/catalog/books/form", get(books::book_form))
        .route(
            "/catalog/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/catalog/books/:id/delete", get(books::confirm_delete_book))
        // Book instances
        .route(
            "/catalog/bookinstances",
            get(book_instances::list_book_instances).post(book_instances::create_book_instance),
        )
        .route("/catalog/bookinstances/form", get(book_instances::book_instance_form))
        .route(
            "/catalog/bookinstances/:id",
            get(book_instances::get_book_instance)
                .put(book_instances::update_book_instance)
                .delete(book_instances::delete_book_instance),
        )
        .route(
            "/catalog/bookinstances/:id/delete",
            get(book_instances::confirm_delete_book_instance),
        )
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
