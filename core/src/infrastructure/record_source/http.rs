use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::domain::{
    common::{UpstreamConfig, entities::app_errors::CoreError},
    listing::{ListingKind, normalizer::record_count, ports::RecordSource},
};

/// Reads listings from the back-office REST API.
#[derive(Debug, Clone)]
pub struct HttpRecordSource {
    base_url: String,
    token: Option<String>,
    page_limit: u32,
    client: Client,
}

impl HttpRecordSource {
    pub fn new(config: &UpstreamConfig) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                CoreError::InternalServerError
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.trim().is_empty()),
            page_limit: config.page_limit,
            client,
        })
    }

    pub fn url(&self, kind: ListingKind) -> String {
        format!("{}{}", self.base_url, kind.endpoint())
    }

    /// Only one upstream page is read, so a full page means counts and stat
    /// cards may be missing records.
    fn warn_if_truncated(&self, kind: ListingKind, payload: &Value) -> bool {
        let count = record_count(payload, &kind.schema().normalizer_paths);
        let truncated = count >= self.page_limit as usize;
        if truncated {
            tracing::warn!(
                count,
                page_limit = self.page_limit,
                "upstream {} returned a full page; later records are not loaded",
                kind
            );
        }
        truncated
    }
}

impl RecordSource for HttpRecordSource {
    async fn fetch_records(&self, kind: ListingKind) -> Result<Value, CoreError> {
        let url = self.url(kind);
        let mut request = self
            .client
            .get(&url)
            .query(&[("limit", self.page_limit)]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Upstream request to {} failed: {}", url, e);
            CoreError::ExternalServiceError(format!("upstream unreachable: {}", e))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CoreError::NotFound(format!("upstream {}", kind.endpoint())));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Upstream error: {} - {}", status, error_text);
            return Err(CoreError::ExternalServiceError(format!(
                "upstream returned {}: {}",
                status, error_text
            )));
        }

        let payload = response.json::<Value>().await.map_err(|e| {
            tracing::error!("Failed to parse upstream {} payload: {}", kind, e);
            CoreError::ExternalServiceError(format!("invalid upstream payload: {}", e))
        })?;
        self.warn_if_truncated(kind, &payload);

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::{
        Json, Router,
        extract::Query,
        http::{HeaderMap, StatusCode as HttpStatus, header::AUTHORIZATION},
        routing::get,
    };
    use serde_json::json;

    use super::*;

    fn config(base_url: &str, token: Option<&str>) -> UpstreamConfig {
        UpstreamConfig {
            base_url: base_url.to_string(),
            token: token.map(str::to_string),
            page_limit: 1000,
            timeout: Duration::from_secs(5),
        }
    }

    /// Back-office stand-in: `/branches` echoes the auth header and limit,
    /// `/users` fails, `/loans` answers with a non-JSON body and everything
    /// else is a 404.
    async fn upstream() -> String {
        let app = Router::new()
            .route(
                "/branches",
                get(
                    |headers: HeaderMap, Query(query): Query<HashMap<String, String>>| async move {
                        let auth = headers
                            .get(AUTHORIZATION)
                            .and_then(|value| value.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        Json(json!({"data": {"branches": [
                            {"id": "b1", "auth": auth, "limit": query.get("limit")}
                        ]}}))
                    },
                ),
            )
            .route(
                "/users",
                get(|| async { (HttpStatus::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route("/loans", get(|| async { "not json" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_forwards_token_and_limit() {
        let base = upstream().await;
        let source = HttpRecordSource::new(&config(&base, Some("secret"))).unwrap();

        let payload = source.fetch_records(ListingKind::Branches).await.unwrap();
        let branch = &payload["data"]["branches"][0];
        assert_eq!(branch["auth"], "Bearer secret");
        assert_eq!(branch["limit"], "1000");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let base = upstream().await;
        let source = HttpRecordSource::new(&config(&base, None)).unwrap();

        let unauthenticated = source.fetch_records(ListingKind::Branches).await.unwrap();
        assert_eq!(unauthenticated["data"]["branches"][0]["auth"], "");

        assert!(matches!(
            source.fetch_records(ListingKind::Users).await,
            Err(CoreError::ExternalServiceError(message)) if message.contains("boom")
        ));
        assert!(matches!(
            source.fetch_records(ListingKind::Unions).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            source.fetch_records(ListingKind::Loans).await,
            Err(CoreError::ExternalServiceError(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_external_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = HttpRecordSource::new(&config(&format!("http://{}", addr), None)).unwrap();
        assert!(matches!(
            source.fetch_records(ListingKind::Branches).await,
            Err(CoreError::ExternalServiceError(_))
        ));
    }

    #[test]
    fn test_full_page_is_flagged_as_truncated() {
        let mut upstream_config = config("http://localhost", None);
        upstream_config.page_limit = 2;
        let source = HttpRecordSource::new(&upstream_config).unwrap();

        let full = json!({"data": {"loans": [{"id": 1}, {"id": 2}]}});
        let partial = json!({"data": {"loans": [{"id": 1}]}});
        assert!(source.warn_if_truncated(ListingKind::Loans, &full));
        assert!(!source.warn_if_truncated(ListingKind::Loans, &partial));
    }

    #[test]
    fn test_url_joins_endpoint() {
        let source = HttpRecordSource::new(&config("https://api.example.com/api/", None)).unwrap();
        assert_eq!(
            source.url(ListingKind::Branches),
            "https://api.example.com/api/branches"
        );
        assert_eq!(
            source.url(ListingKind::BranchAssignments),
            "https://api.example.com/api/users"
        );
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let source = HttpRecordSource::new(&config("http://localhost", Some("  "))).unwrap();
        assert!(source.token.is_none());
    }
}
