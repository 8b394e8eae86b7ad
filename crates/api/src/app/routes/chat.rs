use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::chat::ChatError;
use crate::app::dto::ChatRequest;
use crate::app::errors::json_error;
use crate::app::services::AppServices;

pub async fn chat_with_data(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return json_error(StatusCode::BAD_REQUEST, "malformed_input", rejection.body_text())
        }
    };

    let Some(question) = body.question() else {
        return json_error(StatusCode::BAD_REQUEST, "question_required", "question is required");
    };

    let Some(chat) = services.chat() else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "chat_unavailable",
            "chat service is not configured",
        );
    };

    match chat.ask(question).await {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(ChatError::Upstream { status, details }) => {
            tracing::warn!(%status, "chat upstream rejected request");
            let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            (
                status,
                Json(json!({
                    "error": "upstream_error",
                    "message": format!("chat service returned {status}"),
                    "details": details,
                })),
            )
                .into_response()
        }
        Err(ChatError::Transport(err)) => {
            tracing::error!(error = %err, "chat upstream unreachable");
            json_error(StatusCode::BAD_GATEWAY, "upstream_error", "chat service is unreachable")
        }
    }
}
