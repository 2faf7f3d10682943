use axum::extract::{Path, Query, State};
use loanboard_core::domain::listing::{entities::RefreshOutcome, ports::ListingService};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::parse_kind;
use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RefreshListingQuery {
    /// Coalesce with other refreshes arriving within the debounce window
    /// instead of fetching now.
    #[serde(default)]
    pub debounce: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RefreshListingResponse {
    pub scheduled: bool,
    pub data: Option<RefreshOutcome>,
}

#[utoipa::path(
    post,
    path = "/{kind}/refresh",
    tag = "listing",
    summary = "Refresh a listing snapshot",
    description = "Call after creating, updating, deleting, assigning or unassigning records upstream.",
    params(
        ("kind" = String, Path, description = "Listing kind"),
        RefreshListingQuery
    ),
    responses(
        (status = 200, body = RefreshListingResponse),
        (status = 202, body = RefreshListingResponse, description = "Debounced refresh scheduled"),
        (status = 404, description = "Unknown listing"),
        (status = 502, description = "Upstream failure")
    ),
)]
pub async fn refresh_listing(
    Path(kind): Path<String>,
    Query(query): Query<RefreshListingQuery>,
    State(state): State<AppState>,
) -> Result<Response<RefreshListingResponse>, ApiError> {
    let kind = parse_kind(&kind)?;

    if query.debounce {
        state.service.schedule_refresh(kind);
        return Ok(Response::Accepted(RefreshListingResponse {
            scheduled: true,
            data: None,
        }));
    }

    let outcome = state
        .service
        .refresh(kind)
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(RefreshListingResponse {
        scheduled: false,
        data: Some(outcome),
    }))
}
