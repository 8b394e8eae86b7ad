use std::sync::Arc;

use axum::{extract::Extension, response::Response};

use crate::app::errors::json_result;
use crate::app::services::AppServices;

pub async fn cash_outflow(Extension(services): Extension<Arc<AppServices>>) -> Response {
    json_result(services.cash_outflow().await)
}

pub async fn category_spend(Extension(services): Extension<Arc<AppServices>>) -> Response {
    json_result(services.category_spend().await)
}

pub async fn invoice_trends(Extension(services): Extension<Arc<AppServices>>) -> Response {
    json_result(services.invoice_trends().await)
}

pub async fn top_vendors(Extension(services): Extension<Arc<AppServices>>) -> Response {
    json_result(services.top_vendors().await)
}

pub async fn stats(Extension(services): Extension<Arc<AppServices>>) -> Response {
    json_result(services.summary().await)
}
