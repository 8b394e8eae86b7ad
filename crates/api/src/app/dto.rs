use serde::Deserialize;

// -------------------------
// Request DTOs
// -------------------------

/// `GET /api/invoices` query string. A missing `search` matches everything.
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceSearchParams {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: Option<String>,
}

impl ChatRequest {
    /// The question, if present and not blank.
    pub fn question(&self) -> Option<&str> {
        self.question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}
