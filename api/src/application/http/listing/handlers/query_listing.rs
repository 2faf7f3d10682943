use axum::extract::{Path, State};
use loanboard_core::domain::listing::ports::ListingService;

use super::{get_listing::GetListingResponse, parse_kind};
use crate::application::http::{
    listing::validators::QueryListingValidator,
    server::{
        api_entities::{
            api_error::{ApiError, ValidateJson},
            response::Response,
        },
        app_state::AppState,
    },
};

#[utoipa::path(
    post,
    path = "/{kind}/query",
    tag = "listing",
    summary = "Query a listing with a JSON body",
    description = "Same as the GET form, for filter states too large or too structured for a query string.",
    params(
        ("kind" = String, Path, description = "Listing kind"),
    ),
    request_body = QueryListingValidator,
    responses(
        (status = 200, body = GetListingResponse),
        (status = 400, description = "Invalid page size, sort key or range"),
        (status = 404, description = "Unknown listing"),
        (status = 422, description = "Body failed validation")
    ),
)]
pub async fn query_listing(
    Path(kind): Path<String>,
    State(state): State<AppState>,
    ValidateJson(payload): ValidateJson<QueryListingValidator>,
) -> Result<Response<GetListingResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let query = payload.into_listing_query()?;

    let page = state
        .service
        .list(kind, query)
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetListingResponse { data: page }))
}
