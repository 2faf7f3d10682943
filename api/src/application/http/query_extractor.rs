use std::collections::BTreeMap;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{query_params::QueryParams, server::api_entities::api_error::ApiError};

/// Extractor for the listing query string (search, filter[..], relation[..],
/// preset, sort, page, page_size).
#[derive(Debug, Clone)]
pub struct QueryParamsExtractor(pub QueryParams);

impl<S> FromRequestParts<S> for QueryParamsExtractor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query_string = parts.uri.query().unwrap_or("");
        let query_map: BTreeMap<String, String> = serde_urlencoded::from_str(query_string)
            .map_err(|e| ApiError::BadRequest(format!("malformed query string: {}", e)))?;

        let query_params = QueryParams::from_query_map(&query_map).map_err(ApiError::BadRequest)?;

        Ok(QueryParamsExtractor(query_params))
    }
}
