use loanboard_core::domain::listing::{ListingKind, schema::ListingSchema};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::http::server::api_entities::response::Response;

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ListingDescriptor {
    pub kind: ListingKind,
    pub endpoint: String,
    pub schema: ListingSchema,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GetListingsResponse {
    pub data: Vec<ListingDescriptor>,
}

#[utoipa::path(
    get,
    path = "",
    tag = "listing",
    summary = "List listing kinds",
    description = "Every list page served by the engine, with its searchable fields, filters, sort keys and stat cards.",
    responses(
        (status = 200, body = GetListingsResponse)
    ),
)]
pub async fn get_listings() -> Response<GetListingsResponse> {
    let data = ListingKind::ALL
        .into_iter()
        .map(|kind| ListingDescriptor {
            kind,
            endpoint: kind.endpoint().to_string(),
            schema: kind.schema(),
        })
        .collect();

    Response::OK(GetListingsResponse { data })
}
