use std::sync::Arc;

use axum::Router;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use loanboard_core::{application::create_service, domain::common::LoanboardConfig};
use tower_http::cors::CorsLayer;
use tracing::{debug, info_span, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::http::health::health_routes;
use crate::application::http::listing::router::listing_routes;
use crate::application::http::server::app_state::AppState;
use crate::application::http::server::openapi::ApiDoc;
use crate::args::Args;

pub async fn state(args: Arc<Args>) -> Result<AppState, anyhow::Error> {
    let config = LoanboardConfig::from(args.as_ref().clone());
    let service = create_service(config).await?;

    Ok(AppState::new(args, service))
}

/// Routes and docs without the process-wide layers (metrics recorder, CORS,
/// request tracing).
pub fn api_router(state: AppState) -> Router {
    let mut openapi = ApiDoc::openapi();
    let mut paths = openapi.paths.clone();
    paths.paths = openapi
        .paths
        .paths
        .into_iter()
        .map(|(path, item)| (format!("{}{path}", state.args.server.root_path), item))
        .collect();
    openapi.paths = paths;

    let root_path = state.args.server.root_path.clone();
    let api_docs_url = format!("{}/api-docs/openapi.json", root_path);

    axum::Router::new()
        .merge(SwaggerUi::new(format!("{}/swagger-ui", root_path)).url(api_docs_url, openapi))
        .merge(listing_routes(state.clone()))
        .merge(health_routes(&root_path))
        .with_state(state)
}

///  Returns the [`Router`] of this application.
pub fn router(state: AppState) -> Result<Router, anyhow::Error> {
    let trace_layer = tower_http::trace::TraceLayer::new_for_http().make_span_with(
        |request: &axum::extract::Request| {
            let uri: String = request.uri().to_string();
            info_span!("http_request", method = ?request.method(), uri)
        },
    );

    let allowed_origins = state
        .args
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("ignoring invalid allowed origin {:?}: {}", origin, e);
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    debug!("Allowed origins: {:?}", allowed_origins);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(allowed_origins)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, CONTENT_LENGTH, ACCEPT])
        .allow_credentials(true);

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
    let root_path = state.args.server.root_path.clone();

    let router = api_router(state)
        .route(
            &format!("{}/metrics", root_path),
            get(|| async move { metric_handle.render() }),
        )
        .layer(trace_layer)
        .layer(cors)
        .layer(prometheus_layer);
    Ok(router)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use clap::Parser;
    use serde_json::{Value, json};

    use super::*;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "loanboard-api-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();

        write(
            &dir,
            "users",
            json!({"success": true, "data": {"users": [
                {"id": "1", "firstName": "Alpha", "lastName": "A", "role": "ADMIN", "isActive": true, "createdAt": "2024-01-10T09:00:00Z"},
                {"id": "2", "firstName": "Beta", "lastName": "B", "role": "CREDIT_OFFICER", "isActive": false, "createdAt": "2024-02-10T09:00:00Z"},
                {"id": "3", "firstName": "beta2", "lastName": "C", "role": "CREDIT_OFFICER", "isActive": true, "createdAt": "2024-03-10T09:00:00Z"}
            ]}}),
        );
        write(
            &dir,
            "loans",
            json!({"data": {"loans": [
                {"id": "l1", "loanNumber": "LN-001", "status": "ACTIVE", "principalAmount": "1500.00", "createdByUser": {"id": "u1"}},
                {"id": "l2", "loanNumber": "LN-002", "status": "PENDING_APPROVAL", "principalAmount": 800, "createdByUser": {"id": "u2"}},
                {"id": "l3", "loanNumber": "LN-003", "status": "APPROVED", "principalAmount": 3000, "createdByUser": {"id": "u1"}}
            ]}}),
        );
        dir
    }

    fn write(dir: &Path, kind: &str, payload: Value) {
        std::fs::write(dir.join(format!("{}.json", kind)), payload.to_string()).unwrap();
    }

    async fn server(dir: &Path) -> TestServer {
        let args = Arc::new(Args::parse_from([
            "loanboard-api",
            "--fixtures-dir",
            dir.to_str().unwrap(),
        ]));
        let state = state(args).await.unwrap();
        TestServer::new(api_router(state)).unwrap()
    }

    fn ids(body: &Value) -> Vec<String> {
        body["data"]["visible"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let server = server(&fixture_dir("health")).await;
        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn test_listing_catalog() {
        let server = server(&fixture_dir("catalog")).await;
        let body = server.get("/listings").await.json::<Value>();
        let kinds: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["kind"].as_str().unwrap())
            .collect();
        assert!(kinds.contains(&"branch-assignments"));
        assert_eq!(kinds.len(), 6);
    }

    #[tokio::test]
    async fn test_search_with_status_filter() {
        let server = server(&fixture_dir("search")).await;
        let response = server
            .get("/listings/users")
            .add_query_param("search", "beta")
            .add_query_param("filter[role]", "all")
            .add_query_param("filter[status]", "active")
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(ids(&body), vec!["3"]);
        assert_eq!(body["data"]["total_filtered"], 1);
        assert_eq!(body["data"]["total_unfiltered"], 3);
        assert_eq!(body["data"]["active_filters"], 2);
        assert_eq!(body["data"]["summary"]["counts"]["total"], 3);
    }

    #[tokio::test]
    async fn test_pagination_and_clamping() {
        let server = server(&fixture_dir("paging")).await;

        let first = server
            .get("/listings/users")
            .add_query_param("sort", "name")
            .add_query_param("page_size", "2")
            .await
            .json::<Value>();
        assert_eq!(ids(&first), vec!["1", "2"]);
        assert_eq!(first["data"]["total_pages"], 2);

        let clamped = server
            .get("/listings/users")
            .add_query_param("page_size", "10")
            .add_query_param("page", "5")
            .await
            .json::<Value>();
        assert_eq!(clamped["data"]["page_index"], 1);
        assert_eq!(ids(&clamped), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let server = server(&fixture_dir("errors")).await;

        let response = server
            .get("/listings/users")
            .add_query_param("page_size", "0")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["code"], "E_BAD_REQUEST");

        server
            .get("/listings/users")
            .add_query_param("page_size", "9223372036854775807")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .get("/listings/users")
            .add_query_param("sort", "salary")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .get("/listings/users")
            .add_query_param("filter[createdAt][gte]", "2024-03-01")
            .add_query_param("filter[createdAt][lte]", "2024-01-01")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .get("/listings/payments")
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // no fixture written for branches
        server
            .get("/listings/branches")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_loan_ranges_and_relation() {
        let server = server(&fixture_dir("loans")).await;
        let body = server
            .get("/listings/loans")
            .add_query_param("filter[principalAmount][gte]", "1000")
            .add_query_param("relation[createdByUser.id]", "u1")
            .add_query_param("sort", "-principalAmount")
            .await
            .json::<Value>();

        assert_eq!(ids(&body), vec!["l3", "l1"]);
        assert_eq!(body["data"]["summary"]["totals"]["principal"], 5300.0);
    }

    #[tokio::test]
    async fn test_query_body() {
        let server = server(&fixture_dir("body")).await;
        let response = server
            .post("/listings/users/query")
            .json(&json!({
                "filters": {"role": "CREDIT_OFFICER"},
                "sort": {"key": "createdAt", "direction": "desc"}
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(ids(&response.json::<Value>()), vec!["3", "2"]);

        server
            .post("/listings/users/query")
            .json(&json!({"page": 0}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_export_csv() {
        let server = server(&fixture_dir("export")).await;
        let response = server
            .get("/listings/loans/export")
            .add_query_param("filter[principalAmount][gte]", "1000")
            .add_query_param("sort", "-principalAmount")
            .add_query_param("page_size", "1")
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "text/csv; charset=utf-8");
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"loans.csv\""
        );

        let csv = response.text();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Loan Number,Member,"));
        assert!(lines[1].starts_with("LN-003,"));
        assert!(lines[2].starts_with("LN-001,"));

        server
            .get("/listings/loans/export")
            .add_query_param("sort", "salary")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_summary_and_refresh() {
        let dir = fixture_dir("refresh");
        let server = server(&dir).await;

        let summary = server
            .get("/listings/users/summary")
            .add_query_param("filter[role]", "CREDIT_OFFICER")
            .await
            .json::<Value>();
        assert_eq!(summary["data"]["counts"]["total"], 2);
        assert_eq!(summary["active_filters"], 1);

        write(
            &dir,
            "users",
            json!([{"id": "9", "firstName": "New", "lastName": "User", "role": "ADMIN"}]),
        );
        let refreshed = server.post("/listings/users/refresh").await;
        refreshed.assert_status_ok();
        assert_eq!(refreshed.json::<Value>()["data"]["records"], 1);

        let after = server.get("/listings/users").await.json::<Value>();
        assert_eq!(ids(&after), vec!["9"]);

        server
            .post("/listings/users/refresh")
            .add_query_param("debounce", "true")
            .await
            .assert_status(StatusCode::ACCEPTED);
    }
}
