//! Catalog home endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, models::view::CatalogSummary, AppState};

/// Record counts for the catalog home page
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog counts", body = CatalogSummary)
    )
)]
pub async fn get_summary(State(state): State<AppState>) -> AppResult<Json<CatalogSummary>> {
    let ctx = state.query_context();
    let summary = state.services.views.load_summary(&ctx).await?;
    Ok(Json(summary))
}
