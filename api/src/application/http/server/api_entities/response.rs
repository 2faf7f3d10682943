use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// Successful handler output; the variant picks the status code.
#[derive(Debug, Clone, PartialEq)]
pub enum Response<T: Serialize + PartialEq> {
    OK(T),
    Accepted(T),
}

impl<T: Serialize + PartialEq> IntoResponse for Response<T> {
    fn into_response(self) -> axum::response::Response {
        match self {
            Response::OK(data) => (StatusCode::OK, Json(data)).into_response(),
            Response::Accepted(data) => (StatusCode::ACCEPTED, Json(data)).into_response(),
        }
    }
}
