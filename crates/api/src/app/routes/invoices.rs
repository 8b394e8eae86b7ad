use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::Response,
};

use spendlens_analytics::SearchQuery;

use crate::app::dto::InvoiceSearchParams;
use crate::app::errors::{json_error, json_result, service_error_to_response};
use crate::app::services::{AppServices, ServiceError};

pub async fn search_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<InvoiceSearchParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => {
            return json_error(StatusCode::BAD_REQUEST, "malformed_input", rejection.body_text())
        }
    };

    let query = match SearchQuery::parse(params.search.as_deref()) {
        Ok(q) => q,
        Err(e) => return service_error_to_response(ServiceError::from(e)),
    };

    json_result(services.search_invoices(&query).await)
}
