use axum::{
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};
use loanboard_core::domain::listing::ports::ListingService;

use super::parse_kind;
use crate::application::http::{
    query_extractor::QueryParamsExtractor,
    server::{api_entities::api_error::ApiError, app_state::AppState},
};

#[utoipa::path(
    get,
    path = "/{kind}/export",
    tag = "listing",
    summary = "Export a listing as CSV",
    description = "Takes the same filter, preset and sort parameters as the listing query and returns every matching row. Pagination parameters are ignored.",
    params(
        ("kind" = String, Path, description = "Listing kind"),
        ("search" = Option<String>, Query, description = "Case-insensitive substring over the searchable fields"),
        ("preset" = Option<String>, Query, description = "`today`, `this_week` or `this_month` on the listing's date field"),
        ("sort" = Option<String>, Query, description = "Sort key, `-` prefix for descending")
    ),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid sort key or range"),
        (status = 404, description = "Unknown listing"),
        (status = 502, description = "Upstream failure")
    ),
)]
pub async fn export_listing(
    Path(kind): Path<String>,
    State(state): State<AppState>,
    QueryParamsExtractor(params): QueryParamsExtractor,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let query = params.into_listing_query(&kind.schema())?;

    let export = state
        .service
        .export(kind, query)
        .await
        .map_err(ApiError::from)?;

    let headers = [
        (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export.filename()),
        ),
    ];
    Ok((headers, export.csv))
}
