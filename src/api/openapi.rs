//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, book_instances, books, catalog, genres, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library Catalog API",
        version = "0.3.0",
        description = "Authors, books, genres and book copies with guarded deletes",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        catalog::get_summary,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::confirm_delete_author,
        authors::delete_author,
        // Genres
        genres::list_genres,
        genres::get_genre,
        genres::create_genre,
        genres::update_genre,
        genres::confirm_delete_genre,
        genres::delete_genre,
        // Books
        books::list_books,
        books::get_book,
        books::book_form,
        books::create_book,
        books::update_book,
        books::confirm_delete_book,
        books::delete_book,
        // Book instances
        book_instances::list_book_instances,
        book_instances::get_book_instance,
        book_instances::book_instance_form,
        book_instances::create_book_instance,
        book_instances::update_book_instance,
        book_instances::confirm_delete_book_instance,
        book_instances::delete_book_instance,
    ),
    components(
        schemas(
            // Forms
            crate::models::AuthorForm,
            crate::models::GenreForm,
            crate::models::BookForm,
            crate::models::BookInstanceForm,
            crate::models::BookInstanceStatus,
            crate::models::EntityKind,
            // Views
            crate::models::view::AuthorView,
            crate::models::view::GenreView,
            crate::models::view::BookSummary,
            crate::models::view::BookView,
            crate::models::view::BookInstanceView,
            crate::models::view::EntityView,
            crate::models::view::EntityDetail,
            crate::models::view::DeleteView,
            crate::models::view::DeleteBlocked,
            crate::models::view::CatalogSummary,
            crate::models::view::GenreOption,
            crate::models::view::BookFormOptions,
            crate::models::view::BookInstanceFormOptions,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Catalog overview"),
        (name = "authors", description = "Author management"),
        (name = "genres", description = "Genre management"),
        (name = "books", description = "Book management"),
        (name = "bookinstances", description = "Book copy management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
