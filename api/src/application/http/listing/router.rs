use axum::{
    Router,
    routing::{get, post},
};
use utoipa::OpenApi;

use super::handlers::export_listing::{__path_export_listing, export_listing};
use super::handlers::get_listing::{__path_get_listing, get_listing};
use super::handlers::get_listing_summary::{__path_get_listing_summary, get_listing_summary};
use super::handlers::get_listings::{__path_get_listings, get_listings};
use super::handlers::query_listing::{__path_query_listing, query_listing};
use super::handlers::refresh_listing::{__path_refresh_listing, refresh_listing};
use crate::application::http::server::app_state::AppState;

#[derive(OpenApi)]
#[openapi(paths(
    get_listings,
    get_listing,
    query_listing,
    get_listing_summary,
    refresh_listing,
    export_listing
))]
pub struct ListingApiDoc;

pub fn listing_routes(state: AppState) -> Router<AppState> {
    let root_path = &state.args.server.root_path;

    Router::new()
        .route(&format!("{}/listings", root_path), get(get_listings))
        .route(&format!("{}/listings/{{kind}}", root_path), get(get_listing))
        .route(
            &format!("{}/listings/{{kind}}/query", root_path),
            post(query_listing),
        )
        .route(
            &format!("{}/listings/{{kind}}/summary", root_path),
            get(get_listing_summary),
        )
        .route(
            &format!("{}/listings/{{kind}}/refresh", root_path),
            post(refresh_listing),
        )
        .route(
            &format!("{}/listings/{{kind}}/export", root_path),
            get(export_listing),
        )
}
