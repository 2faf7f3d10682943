use axum::extract::{Path, State};
use loanboard_core::domain::listing::{entities::ListingPage, ports::ListingService};
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
pub struct GetListingResponse {
    pub data: ListingPage,
}

#[utoipa::path(
    get,
    path = "/{kind}",
    tag = "listing",
    summary = "Query a listing",
    description = "Filters, sorts and paginates the cached snapshot of a listing. Also accepts `filter[name]=value`, `filter[field][gte|lte]=bound` and `relation[field]=id`.",
    params(
        ("kind" = String, Path, description = "Listing kind, e.g. `branches` or `union-members`"),
        ("search" = Option<String>, Query, description = "Case-insensitive substring over the searchable fields"),
        ("preset" = Option<String>, Query, description = "`today`, `this_week` or `this_month` on the listing's date field"),
        ("sort" = Option<String>, Query, description = "Sort key, `-` prefix for descending"),
        ("page" = Option<i64>, Query, description = "1-based page, clamped to the last page"),
        ("page_size" = Option<i64>, Query, description = "Rows per page, default 20")
    ),
    responses(
        (status = 200, body = GetListingResponse),
        (status = 400, description = "Invalid page size, sort key or range"),
        (status = 404, description = "Unknown listing"),
        (status = 502, description = "Upstream failure")
    ),
)]
pub async fn get_listing(
    Path(kind): Path<String>,
    State(state): State<AppState>,
    QueryParamsExtractor(params): QueryParamsExtractor,
) -> Result<Response<GetListingResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let query = params.into_listing_query(&kind.schema())?;

    let page = state
        .service
        .list(kind, query)
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetListingResponse { data: page }))
}
