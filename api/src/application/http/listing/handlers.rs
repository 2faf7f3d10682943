use loanboard_core::domain::listing::ListingKind;

use crate::application::http::server::api_entities::api_error::ApiError;

pub mod export_listing;
pub mod get_listing;
pub mod get_listing_summary;
pub mod get_listings;
pub mod query_listing;
pub mod refresh_listing;

/// Unknown listing names are a 404, like any other missing route.
pub fn parse_kind(raw: &str) -> Result<ListingKind, ApiError> {
    raw.parse::<ListingKind>().map_err(ApiError::from)
}
