use utoipa::OpenApi;

use crate::application::http::{health::HealthApiDoc, listing::router::ListingApiDoc};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Loanboard API"
    ),
    nest(
        (path = "/listings", api = ListingApiDoc),
        (path = "/health", api = HealthApiDoc),
    )
)]
pub struct ApiDoc;
