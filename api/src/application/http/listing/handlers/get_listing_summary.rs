use axum::extract::{Path, State};
use loanboard_core::domain::{
    common::today,
    listing::{entities::Summary, ports::ListingService},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::parse_kind;
use crate::application::http::{
    query_extractor::QueryParamsExtractor,
    server::{
        api_entities::{api_error::ApiError, response::Response},
        app_state::AppState,
    },
};

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GetListingSummaryResponse {
    pub data: Summary,
    pub active_filters: usize,
}

#[utoipa::path(
    get,
    path = "/{kind}/summary",
    tag = "listing",
    summary = "Stat cards for the filtered set",
    params(
        ("kind" = String, Path, description = "Listing kind"),
    ),
    responses(
        (status = 200, body = GetListingSummaryResponse),
        (status = 400, description = "Invalid range"),
        (status = 404, description = "Unknown listing")
    ),
)]
pub async fn get_listing_summary(
    Path(kind): Path<String>,
    State(state): State<AppState>,
    QueryParamsExtractor(params): QueryParamsExtractor,
) -> Result<Response<GetListingSummaryResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let schema = kind.schema();
    let filter = params
        .into_listing_query(&schema)?
        .effective_filter(&schema.date_field, today());
    let active_filters = filter.active_filter_count();

    let summary = state
        .service
        .summary(kind, filter)
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetListingSummaryResponse {
        data: summary,
        active_filters,
    }))
}
