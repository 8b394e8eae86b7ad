use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use crate::app::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> Response {
    match err {
        ServiceError::StoreUnavailable(msg) => {
            tracing::warn!(error = %msg, "record store unavailable");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "record store is unavailable",
            )
        }
        ServiceError::MalformedInput(msg) => {
            json_error(StatusCode::BAD_REQUEST, "malformed_input", msg)
        }
        ServiceError::Internal(msg) => {
            tracing::error!(error = %msg, "request failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "an internal error occurred",
            )
        }
    }
}

/// `200` with `value` as JSON, or the mapped error.
pub fn json_result<T: Serialize>(result: Result<T, ServiceError>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, axum::Json(value)).into_response(),
        Err(e) => service_error_to_response(e),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
