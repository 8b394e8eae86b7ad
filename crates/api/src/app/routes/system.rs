use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Response};

use crate::app::errors::service_error_to_response;
use crate::app::services::AppServices;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> Result<StatusCode, Response> {
    services
        .health()
        .await
        .map(|()| StatusCode::OK)
        .map_err(service_error_to_response)
}
