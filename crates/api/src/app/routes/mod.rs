use axum::{
    routing::{get, post},
    Router,
};

pub mod analytics;
pub mod chat;
pub mod invoices;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .route("/cash-outflow", get(analytics::cash_outflow))
        .route("/category-spend", get(analytics::category_spend))
        .route("/invoice-trends", get(analytics::invoice_trends))
        .route("/vendors/top10", get(analytics::top_vendors))
        .route("/stats", get(analytics::stats))
        .route("/invoices", get(invoices::search_invoices))
        .route("/chat-with-data", post(chat::chat_with_data))
}
